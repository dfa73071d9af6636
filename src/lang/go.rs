//! Go language module.

use crate::elements::ElementQueries;
use crate::error::Error;
use crate::lang::Language;
use crate::rules;

/// Element query for Go.
///
/// Captures follow the extractor's shared convention: `func.*`, `method.*`
/// (receiver name and pointer-ness included), `type.*`, `const.*`, `var.*`
/// (file scope only) and `call.*` (plain and selector calls).
const ELEMENTS_QUERY: &str = r#"
(function_declaration name: (identifier) @func.name) @func.decl

(method_declaration
  receiver: (parameter_list
    (parameter_declaration
      name: (identifier)? @method.recv
      type: [
        (pointer_type (type_identifier) @method.owner.ptr)
        (type_identifier) @method.owner
      ]))
  name: (field_identifier) @method.name) @method.decl

(type_declaration (type_spec name: (type_identifier) @type.name)) @type.decl

(const_declaration (const_spec name: (identifier) @const.name)) @const.decl

(source_file
  (var_declaration (var_spec name: (identifier) @var.name)) @var.decl)

(call_expression function: [
  (identifier) @call.name
  (selector_expression field: (field_identifier) @call.name)
]) @call.expr
"#;

pub static QUERIES: ElementQueries = ElementQueries {
    elements: ELEMENTS_QUERY,
    comment: "comment",
};

fn grammar() -> tree_sitter::Language {
    tree_sitter_go::LANGUAGE.into()
}

/// The Go language with its registered models.
pub fn language() -> Result<Language, Error> {
    let mut lang =
        Language::new("go", "Go", &[".go"], &["golang"]).with_grammar(grammar, &QUERIES);
    lang.inject(vec![
        rules::file_basic::model(),
        rules::forbidden_pattern::model(),
        rules::sensitive_api::model(),
        rules::missing_doc::model(),
        rules::comment_style::model(),
    ])?;
    Ok(lang)
}
