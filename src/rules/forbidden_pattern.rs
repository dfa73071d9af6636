//! Forbidden textual patterns.
//!
//! Flags every regex match in file content, optionally skipping matches that
//! fall inside string literals. Needs no syntax tree, so it registers for the
//! anonymous language as well.

use regex::Regex;

use crate::error::Error;
use crate::model::{CheckFn, Model};

pub const NAME: &str = "ForbiddenPattern";

const PATTERNS_KEY: &str = "patterns";
const SKIP_STRINGS_KEY: &str = "skipStrings";

pub fn model() -> Model {
    Model::new(NAME, &["basic"], compile)
        .with_option(PATTERNS_KEY, Vec::<String>::new())
        .with_option(SKIP_STRINGS_KEY, true)
}

fn compile(model: &Model) -> Result<Option<CheckFn>, Error> {
    let patterns = model.list_option(PATTERNS_KEY)?.unwrap_or(&[]);
    if patterns.is_empty() {
        return Ok(None);
    }
    let compiled: Vec<Regex> = patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| model.value_error(PATTERNS_KEY, format!("{p:?}: {e}")))
        })
        .collect::<Result<_, _>>()?;
    let skip_strings = model.bool_option(SKIP_STRINGS_KEY)?.unwrap_or(true);

    let name = model.name.clone();
    Ok(Some(Box::new(move |ctx| {
        let content = String::from_utf8_lossy(ctx.content()).into_owned();
        for (row, line) in content.lines().enumerate() {
            for regex in &compiled {
                for found in regex.find_iter(line) {
                    if skip_strings && inside_string_literal(line, found.start()) {
                        continue;
                    }
                    ctx.add_defect(
                        &name,
                        row,
                        found.start(),
                        format!("forbidden pattern {:?} found", regex.as_str()),
                    );
                }
            }
        }
        Ok(())
    })))
}

/// Whether a byte position in a line falls within a quoted string.
/// Handles double, single and backtick quotes with backslash escapes.
fn inside_string_literal(line: &str, pos: usize) -> bool {
    let mut in_string = false;
    let mut string_char = None;
    let mut escaped = false;

    for (i, ch) in line.char_indices() {
        if i >= pos {
            return in_string;
        }
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' && in_string {
            escaped = true;
            continue;
        }
        if ch == '"' || ch == '\'' || ch == '`' {
            if !in_string {
                in_string = true;
                string_char = Some(ch);
            } else if Some(ch) == string_char {
                in_string = false;
                string_char = None;
            }
        }
    }
    in_string
}
