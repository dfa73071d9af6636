//! Language registry.
//!
//! A [`Language`] bundles an identifier, its recognized file extensions, an
//! optional tree-sitter grammar with element queries, an optional
//! whole-package pre-handler, and its table of registered models. The
//! [`Registry`] owns every language, enforces global extension ownership, and
//! resolves configured language entries. It is populated once at startup by
//! [`register_builtins`] and read-only during a run.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{Config, LanguageConfig};
use crate::error::Error;
use crate::model::Model;
use crate::tree::Node;

pub mod cpp;
pub mod go;
pub mod javascript;
pub mod python;
pub mod rust_lang;

/// Identifier of the anonymous, language-independent entry.
pub const ANONYMOUS: &str = "any";

/// Whole-package hook, invoked once per configured language before any lint
/// worker starts.
pub type PreHandlerFn = fn(&Config, &Node) -> Result<(), Error>;

/// A registered language.
pub struct Language {
    id: &'static str,
    display: &'static str,
    extensions: &'static [&'static str],
    aliases: &'static [&'static str],
    grammar: Option<fn() -> tree_sitter::Language>,
    queries: Option<&'static crate::elements::ElementQueries>,
    pre_handler: Option<PreHandlerFn>,
    models: BTreeMap<String, Model>,
}

impl Language {
    pub fn new(
        id: &'static str,
        display: &'static str,
        extensions: &'static [&'static str],
        aliases: &'static [&'static str],
    ) -> Self {
        Language {
            id,
            display,
            extensions,
            aliases,
            grammar: None,
            queries: None,
            pre_handler: None,
            models: BTreeMap::new(),
        }
    }

    pub fn with_grammar(
        mut self,
        grammar: fn() -> tree_sitter::Language,
        queries: &'static crate::elements::ElementQueries,
    ) -> Self {
        self.grammar = Some(grammar);
        self.queries = Some(queries);
        self
    }

    pub fn with_pre_handler(mut self, handler: PreHandlerFn) -> Self {
        self.pre_handler = Some(handler);
        self
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn display(&self) -> &'static str {
        self.display
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    pub fn grammar(&self) -> Option<tree_sitter::Language> {
        self.grammar.map(|f| f())
    }

    pub fn queries(&self) -> Option<&'static crate::elements::ElementQueries> {
        self.queries
    }

    pub fn pre_handler(&self) -> Option<PreHandlerFn> {
        self.pre_handler
    }

    pub fn is_anonymous(&self) -> bool {
        self.id == ANONYMOUS
    }

    /// Idempotent model injection; a duplicate name within the same language
    /// is a conflict error.
    pub fn inject(&mut self, models: Vec<Model>) -> Result<(), Error> {
        for model in models {
            if self.models.contains_key(&model.name) {
                return Err(Error::ModelConflict {
                    language: self.display.to_string(),
                    model: model.name,
                });
            }
            self.models.insert(model.name.clone(), model);
        }
        Ok(())
    }

    /// The registered model with the given name.
    pub fn model(&self, name: &str) -> Result<&Model, Error> {
        self.models.get(name).ok_or_else(|| Error::UnknownModel {
            language: self.display.to_string(),
            model: name.to_string(),
        })
    }

    /// Registered models in name order.
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    /// Every configured extension must belong to this language's registered
    /// set. The anonymous language accepts any extension.
    pub fn validate_extensions(&self, extensions: &[String]) -> Result<(), Error> {
        if self.is_anonymous() {
            return Ok(());
        }
        for ext in extensions {
            let ext = ext.to_ascii_lowercase();
            if !self.extensions.iter().any(|e| *e == ext) {
                return Err(Error::InvalidExtension {
                    language: self.display.to_string(),
                    extension: ext,
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language")
            .field("id", &self.id)
            .field("extensions", &self.extensions)
            .field("models", &self.models.len())
            .finish()
    }
}

/// Process-wide language set, frozen once the lint run begins.
#[derive(Debug, Default)]
pub struct Registry {
    languages: BTreeMap<&'static str, Language>,
    /// Alias (lowercased name) → language id.
    names: BTreeMap<String, &'static str>,
    /// Extension → owning language id. First registration wins.
    extensions: BTreeMap<String, &'static str>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Add a language. Fails with a conflict error when any extension is
    /// already owned by another language; the registry is left unchanged.
    pub fn register(&mut self, language: Language) -> Result<(), Error> {
        for ext in language.extensions {
            if let Some(owner) = self.extensions.get(*ext) {
                return Err(Error::ExtensionConflict {
                    extension: ext.to_string(),
                    owner: owner.to_string(),
                    language: language.id.to_string(),
                });
            }
        }
        for ext in language.extensions {
            self.extensions.insert(ext.to_string(), language.id);
        }
        self.names.insert(language.id.to_ascii_lowercase(), language.id);
        for alias in language.aliases {
            self.names.insert(alias.to_ascii_lowercase(), language.id);
        }
        tracing::debug!("registered language {}", language.id);
        self.languages.insert(language.id, language);
        Ok(())
    }

    /// Resolve a configured language entry: the named language when one was
    /// given (its extensions validated against the registered set), the
    /// anonymous language otherwise.
    pub fn resolve(&self, spec: &LanguageConfig) -> Result<&Language, Error> {
        let id = if spec.name.is_empty() {
            ANONYMOUS
        } else {
            self.names
                .get(&spec.name.to_ascii_lowercase())
                .copied()
                .ok_or_else(|| Error::UnknownLanguage(spec.name.clone()))?
        };
        let language = self
            .languages
            .get(id)
            .ok_or_else(|| Error::UnknownLanguage(spec.name.clone()))?;
        language.validate_extensions(&spec.extensions)?;
        Ok(language)
    }

    pub fn get(&self, id: &str) -> Option<&Language> {
        self.languages.get(id)
    }

    /// Which language id owns an extension, if any.
    pub fn owner_of(&self, extension: &str) -> Option<&str> {
        self.extensions.get(extension).copied()
    }

    /// All registered languages, ordered by id.
    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.languages.values()
    }
}

/// File extension with its leading dot, lowercased; empty for none.
pub fn extension_of(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!(".{}", ext.to_ascii_lowercase()),
        None => String::new(),
    }
}

/// The anonymous language: no extensions, no grammar, only rules that work
/// from raw content.
fn anonymous() -> Result<Language, Error> {
    let mut lang = Language::new(ANONYMOUS, "Any", &[], &["*"]);
    lang.inject(vec![
        crate::rules::file_basic::model(),
        crate::rules::forbidden_pattern::model(),
    ])?;
    Ok(lang)
}

/// Register every built-in language. The single startup entry point every
/// rule-providing module hangs off; call it once before building a linter.
pub fn register_builtins(registry: &mut Registry) -> Result<(), Error> {
    registry.register(anonymous()?)?;
    registry.register(go::language()?)?;
    registry.register(cpp::language()?)?;
    registry.register(python::language()?)?;
    registry.register(rust_lang::language()?)?;
    registry.register(javascript::language()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        register_builtins(&mut registry).unwrap();
        registry
    }

    #[test]
    fn builtin_extension_sets_are_disjoint() {
        let registry = registry();
        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for lang in registry.languages() {
            for ext in lang.extensions() {
                let prev = seen.insert(ext, lang.id());
                assert!(prev.is_none(), "extension {ext} owned twice");
            }
        }
    }

    #[test]
    fn conflicting_registration_leaves_registry_unchanged() {
        let mut registry = registry();
        let intruder = Language::new("golite", "GoLite", &[".golite", ".go"], &[]);
        let err = registry.register(intruder).unwrap_err();
        assert!(matches!(err, Error::ExtensionConflict { .. }));
        // Neither the conflicting nor the fresh extension landed.
        assert_eq!(registry.owner_of(".go"), Some("go"));
        assert_eq!(registry.owner_of(".golite"), None);
        assert!(registry.get("golite").is_none());
    }

    #[test]
    fn resolve_by_name_and_alias() {
        let registry = registry();
        let spec = LanguageConfig {
            name: "golang".into(),
            extensions: vec![".go".into()],
            models: Vec::new(),
        };
        assert_eq!(registry.resolve(&spec).unwrap().id(), "go");
    }

    #[test]
    fn resolve_unnamed_is_anonymous() {
        let registry = registry();
        let spec = LanguageConfig {
            name: String::new(),
            extensions: vec![".cfg".into()],
            models: Vec::new(),
        };
        assert!(registry.resolve(&spec).unwrap().is_anonymous());
    }

    #[test]
    fn resolve_rejects_foreign_extension() {
        let registry = registry();
        let spec = LanguageConfig {
            name: "go".into(),
            extensions: vec![".go".into(), ".py".into()],
            models: Vec::new(),
        };
        let err = registry.resolve(&spec).unwrap_err();
        assert!(matches!(err, Error::InvalidExtension { .. }));
    }

    #[test]
    fn resolve_unknown_name_is_an_error() {
        let registry = registry();
        let spec = LanguageConfig {
            name: "cobol".into(),
            extensions: Vec::new(),
            models: Vec::new(),
        };
        assert!(matches!(
            registry.resolve(&spec),
            Err(Error::UnknownLanguage(_))
        ));
    }

    #[test]
    fn duplicate_model_injection_conflicts() {
        let mut lang = Language::new("t", "T", &[".t"], &[]);
        lang.inject(vec![Model::new("dup", &[], |_| Ok(None))]).unwrap();
        let err = lang
            .inject(vec![Model::new("dup", &[], |_| Ok(None))])
            .unwrap_err();
        assert!(matches!(err, Error::ModelConflict { .. }));
    }

    #[test]
    fn extension_of_normalizes() {
        assert_eq!(extension_of(Path::new("a/b/C.GO")), ".go");
        assert_eq!(extension_of(Path::new("Makefile")), "");
    }
}
