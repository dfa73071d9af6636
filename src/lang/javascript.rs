//! JavaScript language module.

use crate::elements::ElementQueries;
use crate::error::Error;
use crate::lang::Language;
use crate::rules;

const ELEMENTS_QUERY: &str = r#"
(program (function_declaration name: (identifier) @func.name) @func.decl)

(class_declaration name: (identifier) @type.name) @type.decl

(class_declaration
  name: (identifier) @method.owner
  body: (class_body
    (method_definition name: (property_identifier) @method.name) @method.decl))

(program
  (lexical_declaration (variable_declarator name: (identifier) @var.name)) @var.decl)

(program
  (variable_declaration (variable_declarator name: (identifier) @var.name)) @var.decl)

(call_expression function: [
  (identifier) @call.name
  (member_expression property: (property_identifier) @call.name)
]) @call.expr
"#;

pub static QUERIES: ElementQueries = ElementQueries {
    elements: ELEMENTS_QUERY,
    comment: "comment",
};

fn grammar() -> tree_sitter::Language {
    tree_sitter_javascript::LANGUAGE.into()
}

/// The JavaScript language with its registered models.
pub fn language() -> Result<Language, Error> {
    let mut lang = Language::new("javascript", "JavaScript", &[".js", ".mjs", ".cjs"], &["js"])
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
            r#"const version = "1.0";

function greet(name) {
    console.log(name);
}

class Greeter {
    greet() {
        greet("hi");
    }
}

greet("world");
"#,
        );

        assert!(idx.functions.contains_key("greet"));
        assert!(idx.variables.contains_key("version"));
        let greeter = idx.types.get("Greeter").expect("Greeter class");
        assert_eq!(greeter.methods.len(), 1);
        assert!(idx.calls.contains_key("greet"));
        assert!(idx.calls.contains_key("log"));
    }
}
