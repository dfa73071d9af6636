//! Sensitive API usage.
//!
//! Flags call expressions whose callee name is on the configured block list.
//! Works from the semantic index, so a file that failed to parse simply has
//! no findings.

use std::collections::HashSet;

use crate::error::Error;
use crate::model::{CheckFn, Model};

pub const NAME: &str = "SensitiveApi";

const SENSITIVES_KEY: &str = "sensitives";

pub fn model() -> Model {
    Model::new(NAME, &["basic", "security"], compile)
        .with_option(SENSITIVES_KEY, Vec::<String>::new())
}

fn compile(model: &Model) -> Result<Option<CheckFn>, Error> {
    let sensitives = model.list_option(SENSITIVES_KEY)?.unwrap_or(&[]);
    if sensitives.is_empty() {
        return Ok(None);
    }
    let blocked: HashSet<String> = sensitives.iter().cloned().collect();

    let name = model.name.clone();
    Ok(Some(Box::new(move |ctx| {
        for call in ctx.index().calls.values() {
            if blocked.contains(&call.name) {
                ctx.add_defect(
                    &name,
                    call.position.row,
                    call.position.col,
                    format!("sensitive api: {:?}", call.name),
                );
            }
        }
        Ok(())
    })))
}
