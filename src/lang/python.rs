//! Python language module.

use crate::elements::ElementQueries;
use crate::error::Error;
use crate::lang::Language;
use crate::rules;

/// Module-level functions (decorated or not), classes with their methods,
/// module-level assignments as variables, plain and attribute calls. Python
/// has no constant syntax; the const table stays empty.
const ELEMENTS_QUERY: &str = r#"
(module (function_definition name: (identifier) @func.name) @func.decl)

(module
  (decorated_definition
    definition: (function_definition name: (identifier) @func.name)) @func.decl)

(class_definition name: (identifier) @type.name) @type.decl

(class_definition
  name: (identifier) @method.owner
  body: (block
    (function_definition name: (identifier) @method.name) @method.decl))

(module
  (expression_statement
    (assignment left: (identifier) @var.name) @var.decl))

(call function: [
  (identifier) @call.name
  (attribute attribute: (identifier) @call.name)
]) @call.expr
"#;

pub static QUERIES: ElementQueries = ElementQueries {
    elements: ELEMENTS_QUERY,
    comment: "comment",
};

fn grammar() -> tree_sitter::Language {
    tree_sitter_python::LANGUAGE.into()
}

/// The Python language with its registered models.
pub fn language() -> Result<Language, Error> {
    let mut lang = Language::new("python", "Python", &[".py"], &["py", "python3"])
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
            r#"VERSION = "1.0"

def hello():
    print("hi")

class Greeter:
    def greet(self):
        hello()
"#,
        );

        assert!(idx.functions.contains_key("hello"));
        assert!(idx.variables.contains_key("VERSION"));
        let greeter = idx.types.get("Greeter").expect("Greeter class");
        assert_eq!(greeter.methods.len(), 1);
        assert_eq!(greeter.methods[0].name, "greet");
        assert!(idx.calls.contains_key("print"));
        assert!(idx.calls.contains_key("hello"));
    }

    #[test]
    fn methods_are_not_free_functions() {
        let idx = index(
            r#"class A:
    def m(self):
        pass
"#,
        );
        assert!(idx.functions.is_empty());
        assert_eq!(idx.types.get("A").unwrap().methods.len(), 1);
    }

    #[test]
    fn decorated_function_is_indexed() {
        let idx = index(
            r#"@cached
def compute():
    return 1
"#,
        );
        assert!(idx.functions.contains_key("compute"));
    }
}
