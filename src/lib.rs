//! Treelint - configurable multi-language lint engine.
//!
//! Treelint parses each matched source file into a tree-sitter syntax tree,
//! extracts semantic elements (functions, types, methods, constants,
//! variables, call sites), runs the configured rules concurrently, and
//! collects positioned defects for reporting.
//!
//! # Architecture
//!
//! - `ast`: generic syntax-tree query and traversal toolkit
//! - `lang`: language registry (extensions, grammars, models, pre-handlers)
//! - `model`: rule descriptors, option values, rule compilation
//! - `context`: per-file lazy state (content, lines, tree, element index)
//! - `tree`: project tree builder with glob exclusion
//! - `engine`: pre-handlers plus the bounded concurrent lint scheduler
//! - `output`: serialized text/JSON defect writers
//! - `rules`: built-in models
//! - `config`/`cli`: YAML configuration and the command-line front end
//!
//! # Adding a New Language
//!
//! See `src/lang/` for examples: supply a grammar, one element query using
//! the shared capture conventions, and the model set, then register it in
//! [`lang::register_builtins`].

pub mod ast;
pub mod cli;
pub mod config;
pub mod context;
pub mod elements;
pub mod engine;
pub mod error;
pub mod lang;
pub mod model;
pub mod output;
pub mod rules;
pub mod tree;

pub use config::{Config, LanguageConfig};
pub use context::{Defect, FileContext, LineEnding, LinesInfo};
pub use engine::{lint, Dispatcher, Linter};
pub use error::Error;
pub use lang::{register_builtins, Language, Registry};
pub use model::{compile_models, CheckFn, Model, ModelConfig, Pipeline, Value};
pub use output::{create_output, Outputer};
pub use tree::{build_tree, Exclusions, Node, Package};
