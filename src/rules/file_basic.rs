//! File-level basics: charset, line count, line length, newline style.
//!
//! Works from raw content and the line table only, so it runs for every
//! language including the anonymous one. An unterminated last line is
//! reported separately from a wrong ending style.

use crate::context::LineEnding;
use crate::error::Error;
use crate::model::{CheckFn, Model};

pub const NAME: &str = "FileBasic";

const CHARSET_KEY: &str = "charset";
const MAX_LINES_KEY: &str = "maxLines";
const MAX_LINE_LENGTH_KEY: &str = "maxLineLength";
const NEW_LINE_KEY: &str = "newLine";

pub fn model() -> Model {
    Model::new(NAME, &["basic", "format"], compile)
        .with_option(CHARSET_KEY, "utf-8")
        .with_option(MAX_LINES_KEY, 1200i64)
        .with_option(MAX_LINE_LENGTH_KEY, 120i64)
        .with_option(NEW_LINE_KEY, "\\n")
}

#[derive(Clone, Copy)]
enum Charset {
    Utf8,
    Ascii,
}

impl Charset {
    fn label(self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Ascii => "ascii",
        }
    }
}

fn positive(model: &Model, key: &str) -> Result<Option<usize>, Error> {
    match model.int_option(key)? {
        None => Ok(None),
        Some(n) if n > 0 => Ok(Some(n as usize)),
        Some(n) => Err(model.value_error(key, format!("must be positive, got {n}"))),
    }
}

fn parse_ending(model: &Model, value: &str) -> Result<LineEnding, Error> {
    match value {
        "\n" | "\\n" => Ok(LineEnding::Lf),
        "\r\n" | "\\r\\n" => Ok(LineEnding::CrLf),
        "\r" | "\\r" => Ok(LineEnding::Cr),
        other => Err(model.value_error(
            NEW_LINE_KEY,
            format!("expected \\n, \\r\\n or \\r, got {other:?}"),
        )),
    }
}

fn compile(model: &Model) -> Result<Option<CheckFn>, Error> {
    let charset = match model.str_option(CHARSET_KEY)? {
        None => None,
        Some("utf-8") | Some("utf8") => Some(Charset::Utf8),
        Some("ascii") => Some(Charset::Ascii),
        Some(other) => {
            return Err(model.value_error(CHARSET_KEY, format!("unsupported charset {other:?}")))
        }
    };
    let max_lines = positive(model, MAX_LINES_KEY)?;
    let max_length = positive(model, MAX_LINE_LENGTH_KEY)?;
    let newline = model
        .str_option(NEW_LINE_KEY)?
        .map(|v| parse_ending(model, v))
        .transpose()?;

    if charset.is_none() && max_lines.is_none() && max_length.is_none() && newline.is_none() {
        return Ok(None);
    }

    let name = model.name.clone();
    Ok(Some(Box::new(move |ctx| {
        if let Some(charset) = charset {
            let content = ctx.content();
            let ok = match charset {
                Charset::Utf8 => std::str::from_utf8(content).is_ok(),
                Charset::Ascii => content.is_ascii(),
            };
            if !ok {
                ctx.add_defect(
                    &name,
                    0,
                    0,
                    format!("the file charset expect {:?}", charset.label()),
                );
            }
        }

        if let Some(limit) = max_lines {
            let count = ctx.lines().count();
            if count > limit {
                ctx.add_defect(
                    &name,
                    0,
                    0,
                    format!("the lines count should be <= {limit}, but {count}"),
                );
            }
        }

        if let Some(limit) = max_length {
            for (row, (len, _)) in ctx.lines().iter().enumerate() {
                if *len > limit {
                    ctx.add_defect(
                        &name,
                        row,
                        0,
                        format!("line length {len} exceeds limit {limit}"),
                    );
                }
            }
        }

        if let Some(want) = newline {
            for (row, (_, ending)) in ctx.lines().iter().enumerate() {
                match ending {
                    LineEnding::Eof => {
                        ctx.add_defect(&name, row, 0, "missing trailing newline");
                    }
                    ending if *ending != want => {
                        ctx.add_defect(
                            &name,
                            row,
                            0,
                            format!(
                                "line ends with {}, expected {}",
                                ending.as_str(),
                                want.as_str()
                            ),
                        );
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    })))
}
