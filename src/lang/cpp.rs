//! C/C++ language module. One grammar covers both; the C subset parses
//! cleanly under the C++ grammar for the constructs the index cares about.

use crate::elements::ElementQueries;
use crate::error::Error;
use crate::lang::Language;
use crate::rules;

/// Object-style macros are indexed as constants; file-scope declarations with
/// an initializer as variables.
const ELEMENTS_QUERY: &str = r#"
(function_definition
  declarator: (function_declarator declarator: (identifier) @func.name)) @func.decl

(class_specifier name: (type_identifier) @type.name) @type.decl

(struct_specifier name: (type_identifier) @type.name) @type.decl

(preproc_def name: (identifier) @const.name) @const.decl

(translation_unit
  (declaration (init_declarator declarator: (identifier) @var.name)) @var.decl)

(call_expression function: [
  (identifier) @call.name
  (field_expression field: (field_identifier) @call.name)
]) @call.expr
"#;

pub static QUERIES: ElementQueries = ElementQueries {
    elements: ELEMENTS_QUERY,
    comment: "comment",
};

fn grammar() -> tree_sitter::Language {
    tree_sitter_cpp::LANGUAGE.into()
}

/// The C/C++ language with its registered models.
pub fn language() -> Result<Language, Error> {
    let mut lang = Language::new(
        "cpp",
        "C/C++",
        &[".c", ".h", ".cpp", ".hpp", ".cxx"],
        &["c", "c++", "c/c++"],
    )
    .with_grammar(grammar, &QUERIES);
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
            r#"#define MAX_SIZE 1024

int counter = 0;

struct point {
    int x;
};

int add(int a, int b) {
    return a + b;
}

int main(void) {
    int r = add(1, 2);
    printf("%d\n", r);
    return r;
}
"#,
        );

        assert!(idx.functions.contains_key("add"));
        assert!(idx.functions.contains_key("main"));
        assert!(idx.consts.contains_key("MAX_SIZE"));
        assert!(idx.variables.contains_key("counter"));
        assert!(idx.types.contains_key("point"));
        assert!(idx.calls.contains_key("add"));
        assert!(idx.calls.contains_key("printf"));
    }

    #[test]
    fn cpp_class_is_a_type() {
        let idx = index(
            r#"class Widget {
public:
    int width;
};
"#,
        );
        assert!(idx.types.contains_key("Widget"));
    }
}
