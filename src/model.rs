//! Rule descriptors and their compilation into check functions.
//!
//! A [`Model`] is a named, tagged, option-bearing rule. Compiling it against
//! its final option set (declared defaults overlaid with project
//! configuration) yields a [`CheckFn`] bound to a context. Misconfigured
//! options are startup-time failures: every compile function validates the
//! option types it reads before any file is processed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::FileContext;
use crate::elements::ElementQueries;
use crate::error::Error;

/// Late-bound option value. Typed accessors return a typed-mismatch error
/// instead of coercing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::List(_) => "string list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::List(v)
    }
}

/// A compiled check: pure function of a context, raising defects through it.
pub type CheckFn = Box<dyn Fn(&FileContext) -> Result<(), Error> + Send + Sync>;

/// Compiles a model against its final options. Returning `Ok(None)` drops
/// the model from the pipeline (every configured sub-check disabled).
pub type CompileFn = fn(&Model) -> Result<Option<CheckFn>, Error>;

/// A named, tagged, option-configurable rule descriptor.
#[derive(Clone)]
pub struct Model {
    pub name: String,
    pub tags: Vec<String>,
    pub options: BTreeMap<String, Value>,
    pub compile: CompileFn,
}

impl Model {
    pub fn new(name: &str, tags: &[&str], compile: CompileFn) -> Self {
        Model {
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            options: BTreeMap::new(),
            compile,
        }
    }

    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    fn type_error(&self, key: &str, expected: &'static str, found: &Value) -> Error {
        Error::OptionType {
            model: self.name.clone(),
            key: key.to_string(),
            expected,
            found: found.type_name().to_string(),
        }
    }

    /// String option, `Ok(None)` when absent.
    pub fn str_option(&self, key: &str) -> Result<Option<&str>, Error> {
        match self.options.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or_else(|| self.type_error(key, "string", v)),
        }
    }

    /// Integer option, `Ok(None)` when absent.
    pub fn int_option(&self, key: &str) -> Result<Option<i64>, Error> {
        match self.options.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_int()
                .map(Some)
                .ok_or_else(|| self.type_error(key, "int", v)),
        }
    }

    /// Boolean option, `Ok(None)` when absent.
    pub fn bool_option(&self, key: &str) -> Result<Option<bool>, Error> {
        match self.options.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.type_error(key, "bool", v)),
        }
    }

    /// String-list option, `Ok(None)` when absent.
    pub fn list_option(&self, key: &str) -> Result<Option<&[String]>, Error> {
        match self.options.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_list()
                .map(Some)
                .ok_or_else(|| self.type_error(key, "string list", v)),
        }
    }

    /// Error for an option whose type checks out but whose value does not.
    pub fn value_error(&self, key: &str, reason: impl Into<String>) -> Error {
        Error::OptionValue {
            model: self.name.clone(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("options", &self.options)
            .finish()
    }
}

/// Configured model override: name selects the registered model, tags and
/// options replace/overlay the declared defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

impl ModelConfig {
    /// Snapshot of a model's declared defaults, as written by the default
    /// configuration generator.
    pub fn from_model(model: &Model) -> Self {
        ModelConfig {
            name: model.name.clone(),
            tags: model.tags.clone(),
            options: model.options.clone(),
        }
    }
}

/// A compiled per-file pipeline: the language binding plus the ordered check
/// functions produced by [`compile_models`].
pub struct Pipeline {
    /// Display name of the language the pipeline was compiled for.
    pub language: String,
    pub grammar: Option<tree_sitter::Language>,
    pub queries: Option<&'static ElementQueries>,
    pub checks: Vec<CheckFn>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("language", &self.language)
            .field("checks", &self.checks.len())
            .finish()
    }
}

/// Resolve, filter and compile the configured models of one language.
///
/// Each configured model is looked up by name, its tags and options are
/// overridden from configuration (options merge per key over the declared
/// defaults), exclusion by name or tag drops it, and the remaining models are
/// compiled in configuration order. The first compile error aborts: rule
/// misconfiguration is a startup failure, not a per-file one.
pub fn compile_models(
    language: &crate::lang::Language,
    specs: &[ModelConfig],
    exclude_names: &[String],
    exclude_tags: &[String],
) -> Result<Vec<CheckFn>, Error> {
    let mut checks = Vec::with_capacity(specs.len());
    for spec in specs {
        let registered = language.model(&spec.name)?;
        let mut model = registered.clone();
        if !spec.tags.is_empty() {
            model.tags = spec.tags.clone();
        }
        for (key, value) in &spec.options {
            model.options.insert(key.clone(), value.clone());
        }

        if exclude_names.iter().any(|n| *n == model.name) {
            tracing::debug!("model {:?} excluded by name", model.name);
            continue;
        }
        if model.tags.iter().any(|t| exclude_tags.contains(t)) {
            tracing::debug!("model {:?} excluded by tag", model.name);
            continue;
        }

        if let Some(check) = (model.compile)(&model)? {
            checks.push(check);
        }
    }
    Ok(checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Language;

    fn counting_model(name: &str, tags: &[&str]) -> Model {
        Model::new(name, tags, |model| {
            let name = model.name.clone();
            Ok(Some(Box::new(move |ctx| {
                ctx.add_defect(&name, 0, 0, "hit");
                Ok(())
            })))
        })
    }

    fn test_language() -> Language {
        let mut lang = Language::new("test", "Test", &[".t"], &[]);
        lang.inject(vec![
            counting_model("A", &["x"]),
            counting_model("B", &["y"]),
        ])
        .unwrap();
        lang
    }

    fn specs(lang: &Language) -> Vec<ModelConfig> {
        ["A", "B"]
            .iter()
            .map(|n| ModelConfig::from_model(lang.model(n).unwrap()))
            .collect()
    }

    #[test]
    fn value_accessors_reject_wrong_types() {
        let model = Model::new("m", &[], |_| Ok(None))
            .with_option("max", 10i64)
            .with_option("name", "x");

        assert_eq!(model.int_option("max").unwrap(), Some(10));
        assert_eq!(model.str_option("name").unwrap(), Some("x"));
        assert_eq!(model.int_option("missing").unwrap(), None);

        let err = model.int_option("name").unwrap_err();
        assert!(matches!(err, Error::OptionType { .. }));
        assert!(err.to_string().contains("expected int"));
    }

    #[test]
    fn exclusion_by_tag() {
        let lang = test_language();
        let checks =
            compile_models(&lang, &specs(&lang), &[], &["x".to_string()]).unwrap();
        assert_eq!(checks.len(), 1);
        // Only B survives.
        let ctx = crate::context::FileContext::with_content(
            "f.t",
            std::sync::Arc::new(Pipeline {
                language: "Test".into(),
                grammar: None,
                queries: None,
                checks,
            }),
            "",
        );
        assert!(ctx.check().is_empty());
        assert_eq!(ctx.defects()[0].model, "B");
    }

    #[test]
    fn exclusion_by_name() {
        let lang = test_language();
        let checks =
            compile_models(&lang, &specs(&lang), &["B".to_string()], &[]).unwrap();
        assert_eq!(checks.len(), 1);
        let ctx = crate::context::FileContext::with_content(
            "f.t",
            std::sync::Arc::new(Pipeline {
                language: "Test".into(),
                grammar: None,
                queries: None,
                checks,
            }),
            "",
        );
        ctx.check();
        assert_eq!(ctx.defects()[0].model, "A");
    }

    #[test]
    fn configured_tags_override_registered_tags() {
        let lang = test_language();
        let mut spec = ModelConfig::from_model(lang.model("A").unwrap());
        spec.tags = vec!["z".to_string()];
        // The registered tag "x" no longer applies; exclusion by "x" keeps A.
        let checks = compile_models(&lang, &[spec.clone()], &[], &["x".to_string()]).unwrap();
        assert_eq!(checks.len(), 1);
        // Exclusion by the overridden tag drops it.
        let checks = compile_models(&lang, &[spec], &[], &["z".to_string()]).unwrap();
        assert!(checks.is_empty());
    }

    #[test]
    fn unknown_model_is_an_error() {
        let lang = test_language();
        let spec = ModelConfig {
            name: "Nope".into(),
            ..Default::default()
        };
        let err = compile_models(&lang, &[spec], &[], &[]).err().unwrap();
        assert!(matches!(err, Error::UnknownModel { .. }));
    }

    #[test]
    fn options_merge_per_key_over_defaults() {
        let mut lang = Language::new("test", "Test", &[".t"], &[]);
        lang.inject(vec![Model::new("opts", &[], |model| {
            // Both keys must still be present after a partial override.
            let a = model.int_option("a")?.unwrap_or(0);
            let b = model.int_option("b")?.unwrap_or(0);
            let name = model.name.clone();
            Ok(Some(Box::new(move |ctx| {
                ctx.add_defect(&name, a as usize, b as usize, "merged");
                Ok(())
            })))
        })
        .with_option("a", 1i64)
        .with_option("b", 2i64)])
        .unwrap();

        let spec = ModelConfig {
            name: "opts".into(),
            tags: Vec::new(),
            options: BTreeMap::from([("b".to_string(), Value::Int(9))]),
        };
        let checks = compile_models(&lang, &[spec], &[], &[]).unwrap();
        let ctx = crate::context::FileContext::with_content(
            "f.t",
            std::sync::Arc::new(Pipeline {
                language: "Test".into(),
                grammar: None,
                queries: None,
                checks,
            }),
            "",
        );
        ctx.check();
        let defect = &ctx.defects()[0];
        assert_eq!((defect.row, defect.col), (1, 9));
    }
}
