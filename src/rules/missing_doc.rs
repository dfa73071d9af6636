//! Missing documentation on exported elements.
//!
//! An exported (capitalized) function, type, method, constant or file-scope
//! variable needs a comment header immediately above its declaration, and
//! the header text has to open with the element's name. Short functions can
//! be exempted by line count.

use crate::ast;
use crate::context::FileContext;
use crate::elements::Span;
use crate::error::Error;
use crate::model::{CheckFn, Model};

pub const NAME: &str = "MissingDoc";

const SHORT_FUNC_LINES_KEY: &str = "shortFuncLines";
const CHECK_TYPES_KEY: &str = "checkTypes";
const CHECK_METHODS_KEY: &str = "checkMethods";
const CHECK_CONSTS_KEY: &str = "checkConsts";
const CHECK_VARIABLES_KEY: &str = "checkVariables";

pub fn model() -> Model {
    Model::new(NAME, &["doc"], compile)
        .with_option(SHORT_FUNC_LINES_KEY, 6i64)
        .with_option(CHECK_TYPES_KEY, true)
        .with_option(CHECK_METHODS_KEY, true)
        .with_option(CHECK_CONSTS_KEY, true)
        .with_option(CHECK_VARIABLES_KEY, true)
}

fn compile(model: &Model) -> Result<Option<CheckFn>, Error> {
    let short_lines = match model.int_option(SHORT_FUNC_LINES_KEY)? {
        None => 0,
        Some(n) if n >= 0 => n as usize,
        Some(n) => {
            return Err(model.value_error(
                SHORT_FUNC_LINES_KEY,
                format!("must not be negative, got {n}"),
            ))
        }
    };
    let check_types = model.bool_option(CHECK_TYPES_KEY)?.unwrap_or(true);
    let check_methods = model.bool_option(CHECK_METHODS_KEY)?.unwrap_or(true);
    let check_consts = model.bool_option(CHECK_CONSTS_KEY)?.unwrap_or(true);
    let check_variables = model.bool_option(CHECK_VARIABLES_KEY)?.unwrap_or(true);

    let name = model.name.clone();
    Ok(Some(Box::new(move |ctx| {
        let index = ctx.index();

        for function in index.functions.values() {
            if !exported(&function.name) {
                continue;
            }
            if short_lines > 0 && function.lines <= short_lines {
                continue;
            }
            if !has_doc(ctx, function.span, &function.name) {
                ctx.add_defect(
                    &name,
                    function.position.row,
                    function.position.col,
                    format!("{:?} missing function doc comment", function.name),
                );
            }
        }

        for decl in index.types.values() {
            if check_types && exported(&decl.name) {
                if let (Some(position), Some(span)) = (decl.position, decl.span) {
                    if !has_doc(ctx, span, &decl.name) {
                        ctx.add_defect(
                            &name,
                            position.row,
                            position.col,
                            format!("{:?} missing type doc comment", decl.name),
                        );
                    }
                }
            }
            if check_methods {
                for method in &decl.methods {
                    if exported(&method.name) && !has_doc(ctx, method.span, &method.name) {
                        ctx.add_defect(
                            &name,
                            method.position.row,
                            method.position.col,
                            format!("{:?} missing method doc comment", method.name),
                        );
                    }
                }
            }
        }

        if check_consts {
            for constant in index.consts.values() {
                if exported(&constant.name) && !has_doc(ctx, constant.span, &constant.name) {
                    ctx.add_defect(
                        &name,
                        constant.position.row,
                        constant.position.col,
                        format!("{:?} missing const doc comment", constant.name),
                    );
                }
            }
        }

        if check_variables {
            for variable in index.variables.values() {
                if exported(&variable.name) && !has_doc(ctx, variable.span, &variable.name) {
                    ctx.add_defect(
                        &name,
                        variable.position.row,
                        variable.position.col,
                        format!("{:?} missing variable doc comment", variable.name),
                    );
                }
            }
        }

        Ok(())
    })))
}

fn exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Whether a declaration carries a doc header opening with its name.
fn has_doc(ctx: &FileContext, span: Span, name: &str) -> bool {
    let Some(node) = ctx.node_at(span) else {
        // The node cannot be recovered without a tree; nothing to report.
        return true;
    };
    let Some(prev) = node.prev_sibling() else {
        return false;
    };
    if prev.kind() != "comment" {
        return false;
    }
    let Some(header) = ast::query_comment_header(prev, |n| n.kind() == "comment") else {
        return false;
    };
    let text = header.utf8_text(ctx.content()).unwrap_or("");
    opens_with(text, name)
}

fn opens_with(text: &str, name: &str) -> bool {
    match text.strip_prefix("//") {
        Some(rest) => rest.trim_start_matches(' ').starts_with(name),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testutil::go_context;

    fn long_body() -> &'static str {
        "{\n\t_ = 1\n\t_ = 2\n\t_ = 3\n\t_ = 4\n\t_ = 5\n\t_ = 6\n\t_ = 7\n}"
    }

    #[test]
    fn undocumented_exported_function_is_flagged() {
        let source = format!("package main\n\nfunc Exported() {}\n", long_body());
        let ctx = go_context(&model(), &source);
        ctx.check();
        let defects = ctx.defects();
        assert_eq!(defects.len(), 1);
        assert!(defects[0].desc.contains("Exported"));
    }

    #[test]
    fn documented_function_passes() {
        let source = format!(
            "package main\n\n// Exported does things.\nfunc Exported() {}\n",
            long_body()
        );
        let ctx = go_context(&model(), &source);
        ctx.check();
        assert!(ctx.defects().is_empty());
    }

    #[test]
    fn header_block_is_walked_to_its_top() {
        let source = format!(
            "package main\n\n// Exported does things.\n// Second line.\nfunc Exported() {}\n",
            long_body()
        );
        let ctx = go_context(&model(), &source);
        ctx.check();
        assert!(ctx.defects().is_empty());
    }

    #[test]
    fn doc_not_opening_with_name_is_flagged() {
        let source = format!(
            "package main\n\n// does things.\nfunc Exported() {}\n",
            long_body()
        );
        let ctx = go_context(&model(), &source);
        ctx.check();
        assert_eq!(ctx.defects().len(), 1);
    }

    #[test]
    fn short_functions_are_exempt() {
        let ctx = go_context(&model(), "package main\n\nfunc Short() {}\n");
        ctx.check();
        assert!(ctx.defects().is_empty());
    }

    #[test]
    fn unexported_elements_are_ignored() {
        let source = format!("package main\n\nfunc internal() {}\n", long_body());
        let ctx = go_context(&model(), &source);
        ctx.check();
        assert!(ctx.defects().is_empty());
    }

    #[test]
    fn undocumented_type_and_const_are_flagged() {
        let source = "package main\n\ntype Config struct{}\n\nconst Version = \"1\"\n";
        let ctx = go_context(&model(), source);
        ctx.check();
        let defects = ctx.defects();
        assert_eq!(defects.len(), 2);
        assert!(defects.iter().any(|d| d.desc.contains("Config")));
        assert!(defects.iter().any(|d| d.desc.contains("Version")));
    }

    #[test]
    fn toggles_disable_categories() {
        let m = model()
            .with_option(CHECK_TYPES_KEY, false)
            .with_option(CHECK_CONSTS_KEY, false);
        let source = "package main\n\ntype Config struct{}\n\nconst Version = \"1\"\n";
        let ctx = go_context(&m, source);
        ctx.check();
        assert!(ctx.defects().is_empty());
    }

    #[test]
    fn undocumented_method_is_flagged() {
        let source = "package main\n\n// Config holds settings.\ntype Config struct{}\n\nfunc (c *Config) Apply() {\n\t_ = 1\n\t_ = 2\n\t_ = 3\n\t_ = 4\n\t_ = 5\n\t_ = 6\n\t_ = 7\n}\n";
        let ctx = go_context(&model(), source);
        ctx.check();
        let defects = ctx.defects();
        assert_eq!(defects.len(), 1);
        assert!(defects[0].desc.contains("Apply"));
    }
}
