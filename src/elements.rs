//! Semantic elements extracted from a parsed file.
//!
//! One tree-sitter query per language captures functions, types, methods,
//! constants, variables and call expressions in a single pass. The query uses
//! a shared capture-name convention (`func.name`, `method.owner`, …) so the
//! extractor itself stays language-agnostic; each language module only
//! supplies the query text.

use std::collections::HashMap;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor, Tree};

/// Byte span of a declaration node; enough to recover the node later via
/// `descendant_for_byte_range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Source position, zero-based row and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

/// A free function definition.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub position: Position,
    pub span: Span,
    /// Line breaks the definition spans.
    pub lines: usize,
}

/// A type (class/struct) definition with its methods.
///
/// A method seen before (or without) its owning type creates a placeholder
/// entry carrying no position; a later type declaration fills it in rather
/// than replacing the entry.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub position: Option<Position>,
    pub span: Option<Span>,
    pub methods: Vec<Method>,
}

/// A method bound to a type.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub owner: String,
    pub receiver: Option<String>,
    /// Whether the receiver is taken through a pointer.
    pub pointer: bool,
    pub position: Position,
    pub span: Span,
    pub lines: usize,
}

/// A constant definition.
#[derive(Debug, Clone)]
pub struct Const {
    pub name: String,
    pub position: Position,
    pub span: Span,
}

/// A file-scope variable definition.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub position: Position,
    pub span: Span,
}

/// A call expression. One entry per distinct callee name; the position is the
/// first occurrence in match order.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub name: String,
    pub position: Position,
    pub span: Span,
}

/// Per-file semantic index, keyed by element name.
#[derive(Debug, Clone, Default)]
pub struct ElementIndex {
    pub functions: HashMap<String, Function>,
    pub types: HashMap<String, TypeDecl>,
    pub consts: HashMap<String, Const>,
    pub variables: HashMap<String, Variable>,
    pub calls: HashMap<String, CallExpr>,
}

impl ElementIndex {
    /// Total number of indexed elements, call sites included.
    pub fn len(&self) -> usize {
        self.functions.len()
            + self.types.len()
            + self.consts.len()
            + self.variables.len()
            + self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Language-specific query configuration consumed by [`extract`].
pub struct ElementQueries {
    /// Combined element query using the shared capture-name convention.
    pub elements: &'static str,
    /// Node kind of a comment in this grammar.
    pub comment: &'static str,
}

fn position_of(node: Node<'_>) -> Position {
    let p = node.start_position();
    Position {
        row: p.row,
        col: p.column,
    }
}

fn span_of(node: Node<'_>) -> Span {
    Span {
        start: node.start_byte(),
        end: node.end_byte(),
    }
}

fn lines_of(node: Node<'_>) -> usize {
    node.end_position().row.saturating_sub(node.start_position().row)
}

fn text_of(node: Node<'_>, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

/// Walk the parsed tree once and build the element index.
///
/// A query that fails to compile against the grammar is a defect in the
/// language module; it is logged and yields an empty index instead of
/// aborting the file.
pub fn extract(
    tree: &Tree,
    source: &[u8],
    queries: &ElementQueries,
    grammar: &tree_sitter::Language,
) -> ElementIndex {
    let query = match Query::new(grammar, queries.elements) {
        Ok(q) => q,
        Err(err) => {
            tracing::error!("failed to compile element query: {err}");
            return ElementIndex::default();
        }
    };

    let mut index = ElementIndex::default();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, tree.root_node(), source);

    while let Some(m) = matches.next() {
        let mut caps: HashMap<&str, Node<'_>> = HashMap::new();
        for capture in m.captures {
            caps.insert(query.capture_names()[capture.index as usize], capture.node);
        }

        if let Some(name) = caps.get("func.name") {
            let decl = caps.get("func.decl").copied().unwrap_or(*name);
            let name = text_of(*name, source);
            if name.is_empty() {
                continue;
            }
            index.functions.entry(name.clone()).or_insert(Function {
                name,
                position: position_of(decl),
                span: span_of(decl),
                lines: lines_of(decl),
            });
        } else if let Some(name) = caps.get("method.name") {
            let decl = caps.get("method.decl").copied().unwrap_or(*name);
            let pointer = caps.contains_key("method.owner.ptr");
            let owner = caps
                .get("method.owner.ptr")
                .or_else(|| caps.get("method.owner"))
                .map(|n| text_of(*n, source))
                .unwrap_or_default();
            let name = text_of(*name, source);
            if name.is_empty() || owner.is_empty() {
                continue;
            }
            let method = Method {
                name,
                owner: owner.clone(),
                receiver: caps.get("method.recv").map(|n| text_of(*n, source)),
                pointer,
                position: position_of(decl),
                span: span_of(decl),
                lines: lines_of(decl),
            };
            // Merge onto the owning type, creating a placeholder when the
            // type declaration has not been seen.
            index
                .types
                .entry(owner.clone())
                .or_insert(TypeDecl {
                    name: owner,
                    position: None,
                    span: None,
                    methods: Vec::new(),
                })
                .methods
                .push(method);
        } else if let Some(name) = caps.get("type.name") {
            let decl = caps.get("type.decl").copied().unwrap_or(*name);
            let name = text_of(*name, source);
            if name.is_empty() {
                continue;
            }
            let entry = index.types.entry(name.clone()).or_insert(TypeDecl {
                name,
                position: None,
                span: None,
                methods: Vec::new(),
            });
            if entry.span.is_none() {
                entry.position = Some(position_of(decl));
                entry.span = Some(span_of(decl));
            }
        } else if let Some(name) = caps.get("const.name") {
            let decl = caps.get("const.decl").copied().unwrap_or(*name);
            let name = text_of(*name, source);
            if name.is_empty() {
                continue;
            }
            index.consts.entry(name.clone()).or_insert(Const {
                name,
                position: position_of(decl),
                span: span_of(decl),
            });
        } else if let Some(name) = caps.get("var.name") {
            let decl = caps.get("var.decl").copied().unwrap_or(*name);
            let name = text_of(*name, source);
            if name.is_empty() {
                continue;
            }
            index.variables.entry(name.clone()).or_insert(Variable {
                name,
                position: position_of(decl),
                span: span_of(decl),
            });
        } else if let Some(name) = caps.get("call.name") {
            let expr = caps.get("call.expr").copied().unwrap_or(*name);
            let name = text_of(*name, source);
            if name.is_empty() {
                continue;
            }
            index.calls.entry(name.clone()).or_insert(CallExpr {
                name,
                position: position_of(expr),
                span: span_of(expr),
            });
        }
    }

    index
}
