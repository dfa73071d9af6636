//! Language-agnostic helpers over tree-sitter nodes.
//!
//! Every rule that walks a syntax tree goes through these: predicate searches
//! over children/ancestors/siblings, comment-header association, and
//! depth-first/level-order visitation with three-way pruning control.
//!
//! All helpers are pure and non-failing: a `None` node or an absent match
//! yields `None` or a no-op, never an error.

use tree_sitter::Node;

/// Control signal returned by a visitor during tree traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// Descend into (or enqueue) this node's children.
    Continue,
    /// Abort the entire traversal.
    Break,
    /// Do not descend into this node; continue with its siblings.
    Skip,
}

/// Return the first immediate child satisfying `pred`.
pub fn query_child<'t>(node: Node<'t>, pred: impl Fn(&Node<'t>) -> bool) -> Option<Node<'t>> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if pred(&child) {
                return Some(child);
            }
        }
    }
    None
}

/// Walk the ancestor chain, starting at `node` itself, and return the first
/// node satisfying `pred`. Terminates at the root.
pub fn query_ancestor<'t>(node: Node<'t>, pred: impl Fn(&Node<'t>) -> bool) -> Option<Node<'t>> {
    let mut current = Some(node);
    while let Some(n) = current {
        if pred(&n) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// Search backward through preceding siblings for the first match.
///
/// The first hop considers named siblings only; every following hop walks all
/// siblings, named or not. Header-comment association depends on this
/// asymmetry, so both steps are deliberate.
pub fn query_prev_sibling<'t>(
    node: Node<'t>,
    pred: impl Fn(&Node<'t>) -> bool,
) -> Option<Node<'t>> {
    let mut current = node.prev_named_sibling();
    while let Some(n) = current {
        if pred(&n) {
            return Some(n);
        }
        current = n.prev_sibling();
    }
    None
}

/// Walk backward through a contiguous run of comment siblings starting at
/// `node` and return the earliest (topmost) one.
///
/// Returns `None` when `node` itself is not a comment; callers probe the
/// previous sibling of a declaration before asking for the header block.
pub fn query_comment_header<'t>(
    node: Node<'t>,
    is_comment: impl Fn(&Node<'t>) -> bool,
) -> Option<Node<'t>> {
    let mut top = None;
    let mut current = Some(node);
    while let Some(n) = current {
        if !is_comment(&n) {
            break;
        }
        top = Some(n);
        current = n.prev_sibling();
    }
    top
}

/// Invoke `f` for every immediate child of `node`. No filtering.
pub fn apply_children_nodes<'t>(node: Node<'t>, mut f: impl FnMut(Node<'t>)) {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            f(child);
        }
    }
}

/// Invoke `f` for `node` and every following sibling on the same level.
pub fn apply_level_nodes<'t>(node: Node<'t>, mut f: impl FnMut(Node<'t>)) {
    let mut current = Some(node);
    while let Some(n) = current {
        f(n);
        current = n.next_sibling();
    }
}

/// Depth-first pre-order traversal below `node`.
///
/// The visitor sees every descendant (not `node` itself). `Continue` recurses
/// into the visited child, `Skip` moves on to its next sibling, and `Break`
/// aborts the whole traversal.
pub fn df_visit<'t, F>(node: Option<Node<'t>>, visit: &mut F)
where
    F: FnMut(Node<'t>) -> Motion,
{
    fn walk<'t, F>(node: Node<'t>, visit: &mut F) -> bool
    where
        F: FnMut(Node<'t>) -> Motion,
    {
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else {
                continue;
            };
            match visit(child) {
                Motion::Continue => {
                    if !walk(child, visit) {
                        return false;
                    }
                }
                Motion::Break => return false,
                Motion::Skip => {}
            }
        }
        true
    }

    if let Some(n) = node {
        walk(n, visit);
    }
}

/// Level-order traversal below `node` with the same control semantics as
/// [`df_visit`]: `Break` stops globally, `Continue` enqueues the visited
/// node's children, `Skip` does not enqueue them.
pub fn bf_visit<'t, F>(node: Option<Node<'t>>, visit: &mut F)
where
    F: FnMut(Node<'t>) -> Motion,
{
    let Some(root) = node else {
        return;
    };
    let mut queue: Vec<Node<'t>> = Vec::new();
    for i in 0..root.child_count() {
        if let Some(child) = root.child(i) {
            queue.push(child);
        }
    }
    let mut cursor = 0;
    while cursor < queue.len() {
        let current = queue[cursor];
        cursor += 1;
        match visit(current) {
            Motion::Break => return,
            Motion::Continue => {
                for i in 0..current.child_count() {
                    if let Some(child) = current.child(i) {
                        queue.push(child);
                    }
                }
            }
            Motion::Skip => {}
        }
    }
}

/// Number of line breaks a node spans: end row minus start row, zero for a
/// missing node or a single-line span.
pub fn node_lines(node: Option<Node<'_>>) -> usize {
    match node {
        Some(n) => n.end_position().row.saturating_sub(n.start_position().row),
        None => 0,
    }
}
