//! Built-in models.
//!
//! Each module declares one model: its name, default tags and options, and
//! the compile function that validates the final option set and produces the
//! check. Language modules pick which models they register.

pub mod comment_style;
pub mod file_basic;
pub mod forbidden_pattern;
pub mod missing_doc;
pub mod sensitive_api;
