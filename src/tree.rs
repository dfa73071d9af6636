//! Project tree: packages (directories) and leaves (files).
//!
//! Built in one recursive walk with independent glob exclusion for files and
//! directories. An excluded directory is pruned without descending; a file
//! whose extension has no dispatch entry is skipped silently, since language
//! coverage is opt-in. Sibling order follows directory-listing order and is
//! not guaranteed sorted.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::context::FileContext;
use crate::error::Error;
use crate::model::Pipeline;

/// A directory node exclusively owning its children.
#[derive(Debug)]
pub struct Package {
    path: PathBuf,
    children: Vec<Node>,
}

impl Package {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

/// A tree node: either a package or a file leaf.
#[derive(Debug)]
pub enum Node {
    Package(Package),
    Leaf(FileContext),
}

impl Node {
    pub fn path(&self) -> &Path {
        match self {
            Node::Package(pkg) => pkg.path(),
            Node::Leaf(ctx) => ctx.path(),
        }
    }

    pub fn is_package(&self) -> bool {
        matches!(self, Node::Package(_))
    }

    /// Leaf-only accessor; a package is a clear error, never a panic.
    pub fn context(&self) -> Result<&FileContext, Error> {
        match self {
            Node::Leaf(ctx) => Ok(ctx),
            Node::Package(pkg) => Err(Error::NotALeaf(pkg.path.clone())),
        }
    }

    /// Visit every leaf, depth-first, in build order.
    pub fn each_leaf<'a>(&'a self, f: &mut impl FnMut(&'a FileContext)) {
        match self {
            Node::Leaf(ctx) => f(ctx),
            Node::Package(pkg) => {
                for child in &pkg.children {
                    child.each_leaf(f);
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.each_leaf(&mut |_| count += 1);
        count
    }
}

/// OR-ed shell-style glob sets for file and directory names.
#[derive(Debug)]
pub struct Exclusions {
    files: GlobSet,
    dirs: GlobSet,
}

impl Exclusions {
    pub fn new(files: &[String], dirs: &[String]) -> Result<Self, Error> {
        Ok(Exclusions {
            files: build_set(files)?,
            dirs: build_set(dirs)?,
        })
    }

    pub fn none() -> Self {
        Exclusions {
            files: GlobSet::empty(),
            dirs: GlobSet::empty(),
        }
    }

    fn file(&self, name: &str) -> bool {
        self.files.is_match(name)
    }

    fn dir(&self, name: &str) -> bool {
        self.dirs.is_match(name)
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet, Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Build the project tree rooted at `root`.
///
/// `dispatch` resolves a file path to its compiled pipeline; `None` skips
/// the file. A single-file root yields a leaf node directly.
pub fn build_tree(
    root: &Path,
    exclusions: &Exclusions,
    dispatch: &dyn Fn(&Path) -> Option<Arc<Pipeline>>,
) -> Result<Node, Error> {
    build(root, exclusions, dispatch)?.ok_or_else(|| {
        Error::io(
            root,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "project root is excluded or has no lintable files",
            ),
        )
    })
}

fn build(
    path: &Path,
    exclusions: &Exclusions,
    dispatch: &dyn Fn(&Path) -> Option<Arc<Pipeline>>,
) -> Result<Option<Node>, Error> {
    let meta = fs::symlink_metadata(path).map_err(|e| Error::io(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if meta.is_dir() {
        if exclusions.dir(&name) {
            tracing::debug!("excluded directory {}", path.display());
            return Ok(None);
        }
        let mut package = Package {
            path: path.to_path_buf(),
            children: Vec::new(),
        };
        let entries = fs::read_dir(path).map_err(|e| Error::io(path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(path, e))?;
            if let Some(child) = build(&entry.path(), exclusions, dispatch)? {
                package.children.push(child);
            }
        }
        Ok(Some(Node::Package(package)))
    } else {
        if exclusions.file(&name) {
            tracing::debug!("excluded file {}", path.display());
            return Ok(None);
        }
        match dispatch(path) {
            Some(unit) => {
                let package = path.parent().unwrap_or(Path::new("")).to_path_buf();
                Ok(Some(Node::Leaf(FileContext::new(path, package, unit))))
            }
            None => {
                tracing::debug!("no pipeline for {}", path.display());
                Ok(None)
            }
        }
    }
}
