//! Error taxonomy for the lint engine.
//!
//! Configuration-shaped errors (registry conflicts, unknown names, bad option
//! types, invalid concurrency) are fatal and surface before any file is
//! processed. Per-rule runtime errors are accumulated over the whole run and
//! reported once as an [`Error::Aggregate`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// All errors the engine can raise.
#[derive(Debug, Error)]
pub enum Error {
    /// An extension is already owned by another registered language.
    #[error("conflict extension {extension:?}: owned by {owner}, re-registered by {language}")]
    ExtensionConflict {
        extension: String,
        owner: String,
        language: String,
    },

    /// A model name was declared twice within the same language.
    #[error("conflict {language} model: {model:?}")]
    ModelConflict { language: String, model: String },

    /// A configured language name has no registered counterpart.
    #[error("unsupported language: {0:?}")]
    UnknownLanguage(String),

    /// A configured model name is not registered for its language.
    #[error("invalid {language} language model: {model:?}")]
    UnknownModel { language: String, model: String },

    /// A configured extension does not belong to the named language.
    #[error("invalid extension {extension:?} for language {language}")]
    InvalidExtension { language: String, extension: String },

    /// A model option carries a value of the wrong type.
    #[error("model {model:?} option {key:?} expected {expected} but got {found}")]
    OptionType {
        model: String,
        key: String,
        expected: &'static str,
        found: String,
    },

    /// A model option has the right type but an unusable value.
    #[error("model {model:?} option {key:?}: {reason}")]
    OptionValue {
        model: String,
        key: String,
        reason: String,
    },

    #[error("concurrency must be > 0")]
    InvalidConcurrency,

    #[error("unknown output format: {0:?}")]
    UnknownFormat(String),

    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A check function failed at lint time. Recorded, never fatal mid-run.
    #[error("model {model:?} failed on {path}: {reason}")]
    Check {
        model: String,
        path: PathBuf,
        reason: String,
    },

    /// A package-level pre-handler failed before lint workers started.
    #[error("pre-handler for {language} failed: {source}")]
    PreHandle {
        language: String,
        #[source]
        source: Box<Error>,
    },

    /// A leaf-only operation was invoked on a package node.
    #[error("not a leaf: {0}")]
    NotALeaf(PathBuf),

    /// Every per-rule error accumulated over a run, reported once at the end.
    #[error("{}", join_lines(.0))]
    Aggregate(Vec<Error>),
}

impl Error {
    /// Wrap an I/O failure with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Fold accumulated errors into a single result: `None` stays `Ok`, one
    /// error is returned as itself, more become an [`Error::Aggregate`].
    pub fn aggregate(mut errors: Vec<Error>) -> Result<(), Error> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Error::Aggregate(errors)),
        }
    }
}

fn join_lines(errors: &[Error]) -> String {
    let lines: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    format!("{} error(s):\n  {}", lines.len(), lines.join("\n  "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_empty_is_ok() {
        assert!(Error::aggregate(Vec::new()).is_ok());
    }

    #[test]
    fn aggregate_single_unwraps() {
        let err = Error::aggregate(vec![Error::InvalidConcurrency]).unwrap_err();
        assert!(matches!(err, Error::InvalidConcurrency));
    }

    #[test]
    fn aggregate_many_joins() {
        let err = Error::aggregate(vec![
            Error::InvalidConcurrency,
            Error::UnknownFormat("xml".into()),
        ])
        .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("2 error(s)"));
        assert!(text.contains("concurrency"));
        assert!(text.contains("xml"));
    }
}
