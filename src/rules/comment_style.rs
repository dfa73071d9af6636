//! Comment style checks.
//!
//! Walks every comment node in the parsed tree: optional ban on multi-line
//! comments, a required space between the comment marker and its text, and a
//! pure-ASCII requirement.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Query, QueryCursor};

use crate::error::Error;
use crate::model::{CheckFn, Model};

pub const NAME: &str = "CommentStyle";

const DISABLE_MULTI_KEY: &str = "disableMulti";
const SPACE_IN_HEAD_KEY: &str = "spaceInHead";
const ALL_ASCII_KEY: &str = "allAscii";

pub fn model() -> Model {
    Model::new(NAME, &["doc", "style"], compile)
        .with_option(DISABLE_MULTI_KEY, false)
        .with_option(SPACE_IN_HEAD_KEY, true)
        .with_option(ALL_ASCII_KEY, true)
}

fn compile(model: &Model) -> Result<Option<CheckFn>, Error> {
    let disable_multi = model.bool_option(DISABLE_MULTI_KEY)?.unwrap_or(false);
    let space_in_head = model.bool_option(SPACE_IN_HEAD_KEY)?.unwrap_or(false);
    let all_ascii = model.bool_option(ALL_ASCII_KEY)?.unwrap_or(false);

    if !disable_multi && !space_in_head && !all_ascii {
        return Ok(None);
    }

    let name = model.name.clone();
    Ok(Some(Box::new(move |ctx| {
        let Some(tree) = ctx.tree() else {
            return Ok(());
        };
        let Some(grammar) = ctx.pipeline().grammar.clone() else {
            return Ok(());
        };
        let kind = ctx
            .pipeline()
            .queries
            .map(|q| q.comment)
            .unwrap_or("comment");
        let query = Query::new(&grammar, &format!("({kind}) @comment"))
            .map_err(|e| ctx_error(&name, ctx, e))?;

        let content = ctx.content();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, tree.root_node(), content);
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                let text = node.utf8_text(content).unwrap_or("");
                let point = node.start_position();

                if disable_multi && text.starts_with("/*") {
                    ctx.add_defect(
                        &name,
                        point.row,
                        point.column,
                        "multi-line comments cannot be used, single-line comments are recommended",
                    );
                }
                if space_in_head {
                    if let Some(rest) = text.strip_prefix("//") {
                        let head = rest.trim_start_matches('/');
                        if !head.is_empty()
                            && !head.starts_with(' ')
                            && !head.starts_with('\t')
                        {
                            ctx.add_defect(
                                &name,
                                point.row,
                                point.column,
                                "there must be a space between the comment marker and the content",
                            );
                        }
                    }
                }
                if all_ascii && !text.is_ascii() {
                    ctx.add_defect(
                        &name,
                        point.row,
                        point.column,
                        "there are non-ascii characters in the comment",
                    );
                }
            }
        }
        Ok(())
    })))
}

fn ctx_error(
    model: &str,
    ctx: &crate::context::FileContext,
    err: tree_sitter::QueryError,
) -> Error {
    Error::Check {
        model: model.to_string(),
        path: ctx.path().to_path_buf(),
        reason: format!("comment query failed to compile: {err}"),
    }
}
