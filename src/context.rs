//! Per-file analysis context.
//!
//! A [`FileContext`] binds one file to its lint pipeline and lazily loads
//! everything a rule can ask for: raw content, the line/line-ending table,
//! the parsed syntax tree, and the semantic element index. Each of those is
//! computed at most once and is immutable for the remainder of the run.
//!
//! A context is processed by exactly one worker at a time; defects are
//! appended there and read by the outputer afterwards.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;
use serde::Serialize;
use tree_sitter::{Parser, Tree};

use crate::elements::{self, ElementIndex, Span};
use crate::error::Error;
use crate::model::Pipeline;

/// How a line ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Cr,
    Lf,
    CrLf,
    /// Final unterminated fragment: the file ended without a line break.
    Eof,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Cr => "\\r",
            LineEnding::Lf => "\\n",
            LineEnding::CrLf => "\\r\\n",
            LineEnding::Eof => "end of file",
        }
    }
}

/// Ordered table of `(byte length, ending)` pairs, one per line.
///
/// A file terminated by a final line break produces no trailing empty entry;
/// an unterminated last line is recorded with [`LineEnding::Eof`] so rules
/// can tell "missing trailing newline" apart from "wrong newline style".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinesInfo(Vec<(usize, LineEnding)>);

impl LinesInfo {
    /// Classify every line ending in one linear scan.
    pub fn scan(content: &[u8]) -> Self {
        let mut info = Vec::new();
        let mut gap = 0;
        let mut i = 0;
        let n = content.len();
        while i < n {
            match content[i] {
                b'\r' => {
                    let len = i - gap;
                    if i + 1 < n && content[i + 1] == b'\n' {
                        info.push((len, LineEnding::CrLf));
                        i += 1;
                    } else {
                        info.push((len, LineEnding::Cr));
                    }
                    gap = i + 1;
                }
                b'\n' => {
                    info.push((i - gap, LineEnding::Lf));
                    gap = i + 1;
                }
                _ => {}
            }
            i += 1;
        }
        if i > gap {
            info.push((i - gap, LineEnding::Eof));
        }
        LinesInfo(info)
    }

    /// Number of lines.
    pub fn count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, LineEnding)> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[(usize, LineEnding)] {
        &self.0
    }
}

/// A reported issue: rule name, description and source position.
///
/// Append-only once raised; ordering within a context is detection order,
/// not necessarily source order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Defect {
    pub model: String,
    pub desc: String,
    pub row: usize,
    pub col: usize,
}

impl std::fmt::Display for Defect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "model: {:?}, desc: {}, position:({},{})",
            self.model, self.desc, self.row, self.col
        )
    }
}

/// Per-file lazy state machine: `Unloaded → ContentLoaded → Parsed → Indexed`.
pub struct FileContext {
    path: PathBuf,
    /// Owning package path. Back-reference only, never ownership.
    package: PathBuf,
    unit: Arc<Pipeline>,
    content: OnceCell<Vec<u8>>,
    lines: OnceCell<LinesInfo>,
    tree: OnceCell<Option<Tree>>,
    index: OnceCell<ElementIndex>,
    defects: Mutex<Vec<Defect>>,
}

impl FileContext {
    pub fn new(path: impl Into<PathBuf>, package: impl Into<PathBuf>, unit: Arc<Pipeline>) -> Self {
        FileContext {
            path: path.into(),
            package: package.into(),
            unit,
            content: OnceCell::new(),
            lines: OnceCell::new(),
            tree: OnceCell::new(),
            index: OnceCell::new(),
            defects: Mutex::new(Vec::new()),
        }
    }

    /// Build a context over in-memory content instead of a file on disk.
    /// Used by rule tests and by callers that already hold the bytes.
    pub fn with_content(
        path: impl Into<PathBuf>,
        unit: Arc<Pipeline>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        let ctx = FileContext::new(path, PathBuf::new(), unit);
        let _ = ctx.content.set(content.into());
        ctx
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the package (directory) this context belongs to.
    pub fn package(&self) -> &Path {
        &self.package
    }

    /// Display name of the language this file was dispatched to.
    pub fn language(&self) -> &str {
        &self.unit.language
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.unit
    }

    /// Raw file bytes, read on first access.
    ///
    /// A read failure is reported through the error handler and leaves the
    /// content empty so content-independent rules still run.
    pub fn content(&self) -> &[u8] {
        self.content.get_or_init(|| match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.handle_err(&Error::io(&self.path, err));
                Vec::new()
            }
        })
    }

    /// Line/line-ending table, computed on first access.
    pub fn lines(&self) -> &LinesInfo {
        self.lines.get_or_init(|| LinesInfo::scan(self.content()))
    }

    /// Parsed syntax tree, `None` for grammarless pipelines and on parse
    /// failure. Every dependent accessor treats `None` as "no findings".
    pub fn tree(&self) -> Option<&Tree> {
        self.tree
            .get_or_init(|| {
                let grammar = self.unit.grammar.as_ref()?;
                let mut parser = Parser::new();
                if let Err(err) = parser.set_language(grammar) {
                    tracing::error!("failed to load grammar for {}: {err}", self.path.display());
                    return None;
                }
                let tree = parser.parse(self.content(), None);
                if tree.is_none() {
                    tracing::warn!("failed to parse {}", self.path.display());
                }
                tree
            })
            .as_ref()
    }

    /// Semantic element index, built from one walk of the parsed tree.
    pub fn index(&self) -> &ElementIndex {
        self.index.get_or_init(|| {
            match (self.tree(), self.unit.queries, self.unit.grammar.as_ref()) {
                (Some(tree), Some(queries), Some(grammar)) => {
                    elements::extract(tree, self.content(), queries, grammar)
                }
                _ => ElementIndex::default(),
            }
        })
    }

    /// Recover the syntax node a previously indexed element points at.
    pub fn node_at(&self, span: Span) -> Option<tree_sitter::Node<'_>> {
        self.tree()?
            .root_node()
            .descendant_for_byte_range(span.start, span.end)
    }

    /// Append a defect. Defects are never mutated once raised.
    pub fn add_defect(&self, model: &str, row: usize, col: usize, desc: impl Into<String>) {
        let defect = Defect {
            model: model.to_string(),
            desc: desc.into(),
            row,
            col,
        };
        self.defects.lock().unwrap().push(defect);
    }

    /// Snapshot of the defects raised so far, in detection order.
    pub fn defects(&self) -> Vec<Defect> {
        self.defects.lock().unwrap().clone()
    }

    pub fn defect_count(&self) -> usize {
        self.defects.lock().unwrap().len()
    }

    /// Run every compiled check, accumulating their errors without
    /// short-circuiting. The caller hands the context to the outputer once
    /// afterwards.
    pub fn check(&self) -> Vec<Error> {
        let mut errors = Vec::new();
        for check in &self.unit.checks {
            if let Err(err) = check(self) {
                errors.push(err);
            }
        }
        errors
    }

    /// Report a recoverable per-file failure without aborting the pipeline.
    pub fn handle_err(&self, err: &Error) {
        tracing::warn!("{}: {err}", self.path.display());
    }
}

impl std::fmt::Debug for FileContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileContext")
            .field("path", &self.path)
            .field("language", &self.unit.language)
            .finish()
    }
}
