//! Rust language module.

use crate::elements::ElementQueries;
use crate::error::Error;
use crate::lang::Language;
use crate::rules;

/// Free functions at file scope, structs/enums as types, inherent-impl
/// functions as methods, `const` items as constants, `static` items as
/// variables, and plain/method/path call sites.
const ELEMENTS_QUERY: &str = r#"
(source_file (function_item name: (identifier) @func.name) @func.decl)

(struct_item name: (type_identifier) @type.name) @type.decl

(enum_item name: (type_identifier) @type.name) @type.decl

(impl_item
  type: (type_identifier) @method.owner
  body: (declaration_list
    (function_item name: (identifier) @method.name) @method.decl))

(const_item name: (identifier) @const.name) @const.decl

(static_item name: (identifier) @var.name) @var.decl

(call_expression function: [
  (identifier) @call.name
  (field_expression field: (field_identifier) @call.name)
  (scoped_identifier name: (identifier) @call.name)
]) @call.expr
"#;

pub static QUERIES: ElementQueries = ElementQueries {
    elements: ELEMENTS_QUERY,
    comment: "line_comment",
};

fn grammar() -> tree_sitter::Language {
    tree_sitter_rust::LANGUAGE.into()
}

/// The Rust language with its registered models.
pub fn language() -> Result<Language, Error> {
    let mut lang =
        Language::new("rust", "Rust", &[".rs"], &["rs"]).with_grammar(grammar, &QUERIES);
    lang.inject(vec![
        rules::file_basic::model(),
        rules::forbidden_pattern::model(),
        rules::sensitive_api::model(),
    ])?;
    Ok(lang)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements;
    use tree_sitter::Parser;

    fn index(source: &str) -> elements::ElementIndex {
        let grammar = grammar();
        let mut parser = Parser::new();
        parser.set_language(&grammar).unwrap();
        let tree = parser.parse(source.as_bytes(), None).unwrap();
        elements::extract(&tree, source.as_bytes(), &QUERIES, &grammar)
    }

    #[test]
    fn extracts_symbols() {
        let idx = index(
            r#"const MAX: usize = 8;

static REGISTRY: &str = "r";

struct Pool {
    size: usize,
}

impl Pool {
    fn acquire(&self) -> usize {
        self.size
    }
}

fn main() {
    run();
    std::process::exit(0);
}

fn run() {}
"#,
        );

        assert!(idx.functions.contains_key("main"));
        assert!(idx.functions.contains_key("run"));
        assert!(idx.consts.contains_key("MAX"));
        assert!(idx.variables.contains_key("REGISTRY"));
        let pool = idx.types.get("Pool").expect("Pool type");
        assert_eq!(pool.methods.len(), 1);
        assert_eq!(pool.methods[0].name, "acquire");
        assert!(idx.calls.contains_key("run"));
        assert!(idx.calls.contains_key("exit"));
    }

    #[test]
    fn impl_functions_are_methods_not_functions() {
        let idx = index(
            r#"struct S;
impl S {
    fn only_method(&self) {}
}
"#,
        );
        assert!(!idx.functions.contains_key("only_method"));
        assert_eq!(idx.types.get("S").unwrap().methods.len(), 1);
    }
}
