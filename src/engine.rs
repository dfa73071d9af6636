//! The lint engine.
//!
//! Wires configuration, registry and outputer together: compiles every
//! configured language into a per-extension pipeline, builds the project
//! tree, runs pre-handlers to completion, then drives a fixed pool of
//! workers over a bounded work queue. Per-rule runtime errors accumulate
//! across the whole run and surface once, as an aggregate.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use rayon::prelude::*;

use crate::config::Config;
use crate::context::FileContext;
use crate::error::Error;
use crate::lang::{extension_of, PreHandlerFn, Registry};
use crate::model::{compile_models, Pipeline};
use crate::output::{create_output, Outputer};
use crate::tree::{build_tree, Exclusions, Node};

/// Capacity of the queue between the tree walker and the worker pool. One
/// slot keeps the producer in lockstep with the workers, trading memory for
/// backpressure.
const QUEUE_CAPACITY: usize = 1;

/// Maps a file extension to its compiled pipeline.
///
/// Precedence: named-language pipeline, then an anonymous pipeline
/// registered with explicit extensions, then the extension-less anonymous
/// fallback. A file matching none of those is skipped.
pub struct Dispatcher {
    named: HashMap<String, Arc<Pipeline>>,
    anonymous: HashMap<String, Arc<Pipeline>>,
    fallback: Option<Arc<Pipeline>>,
    pre_handlers: Vec<(String, PreHandlerFn)>,
}

impl Dispatcher {
    /// Resolve and compile every configured language. Any failure here is a
    /// startup failure; no file has been touched yet.
    pub fn new(registry: &Registry, config: &Config) -> Result<Self, Error> {
        let mut dispatcher = Dispatcher {
            named: HashMap::new(),
            anonymous: HashMap::new(),
            fallback: None,
            pre_handlers: Vec::new(),
        };

        for spec in &config.languages {
            let language = registry.resolve(spec)?;
            let checks = compile_models(
                language,
                &spec.models,
                &config.exclude_names,
                &config.exclude_tags,
            )?;
            tracing::info!(
                "compiled {} check(s) for language {:?}",
                checks.len(),
                language.display()
            );
            let pipeline = Arc::new(Pipeline {
                language: language.display().to_string(),
                grammar: language.grammar(),
                queries: language.queries(),
                checks,
            });

            let extensions: Vec<String> = if spec.extensions.is_empty() {
                language.extensions().iter().map(|e| e.to_string()).collect()
            } else {
                spec.extensions
                    .iter()
                    .map(|e| e.to_ascii_lowercase())
                    .collect()
            };

            if language.is_anonymous() {
                if extensions.is_empty() {
                    if dispatcher.fallback.is_some() {
                        tracing::warn!("default pipeline configured twice; the later entry wins");
                    }
                    dispatcher.fallback = Some(pipeline);
                } else {
                    for ext in extensions {
                        insert_pipeline(&mut dispatcher.anonymous, ext, pipeline.clone())?;
                    }
                }
            } else {
                for ext in extensions {
                    insert_pipeline(&mut dispatcher.named, ext, pipeline.clone())?;
                }
                if let Some(handler) = language.pre_handler() {
                    let id = language.id().to_string();
                    if !dispatcher.pre_handlers.iter().any(|(seen, _)| *seen == id) {
                        dispatcher.pre_handlers.push((id, handler));
                    }
                }
            }
        }

        Ok(dispatcher)
    }

    /// Pipeline for a file, or `None` when nothing claims its extension.
    pub fn dispatch(&self, path: &Path) -> Option<Arc<Pipeline>> {
        let ext = extension_of(path);
        if let Some(pipeline) = self.named.get(&ext) {
            return Some(pipeline.clone());
        }
        if let Some(pipeline) = self.anonymous.get(&ext) {
            return Some(pipeline.clone());
        }
        self.fallback.clone()
    }

    pub fn pre_handlers(&self) -> &[(String, PreHandlerFn)] {
        &self.pre_handlers
    }
}

fn insert_pipeline(
    map: &mut HashMap<String, Arc<Pipeline>>,
    ext: String,
    pipeline: Arc<Pipeline>,
) -> Result<(), Error> {
    if let Some(existing) = map.get(&ext) {
        return Err(Error::ExtensionConflict {
            extension: ext,
            owner: existing.language.clone(),
            language: pipeline.language.clone(),
        });
    }
    map.insert(ext, pipeline);
    Ok(())
}

/// One lint run over one project tree.
pub struct Linter {
    config: Config,
    dispatcher: Dispatcher,
    output: Box<dyn Outputer>,
}

/// Check a project with the given registry and configuration.
///
/// The single entry point the CLI calls: validates configuration, compiles
/// the pipelines, and runs the scheduler. The returned error is an aggregate
/// of everything that went wrong; the engine never terminates the process.
pub fn lint(registry: &Registry, config: Config, project: &Path) -> Result<(), Error> {
    config.validate()?;
    let linter = Linter::new(registry, config)?;
    linter.run(project)
}

impl Linter {
    pub fn new(registry: &Registry, config: Config) -> Result<Self, Error> {
        // Compile before touching the report destination: a configuration
        // failure must not leave an empty report behind.
        let dispatcher = Dispatcher::new(registry, &config)?;
        let output = create_output(&config.output_file, &config.output_format)?;
        Ok(Linter {
            config,
            dispatcher,
            output,
        })
    }

    pub fn run(&self, project: &Path) -> Result<(), Error> {
        tracing::info!("lint run starting at {}", project.display());
        let exclusions = Exclusions::new(&self.config.exclude_files, &self.config.exclude_dirs)?;
        let tree = build_tree(project, &exclusions, &|path| self.dispatcher.dispatch(path))?;
        tracing::info!("built project tree with {} file(s)", tree.leaf_count());

        let mut errors = self.pre_handle(&tree);
        errors.extend(self.visit(&tree));
        self.output.close();
        tracing::info!("lint run finished");
        Error::aggregate(errors)
    }

    /// Run every configured pre-handler to completion before lint workers
    /// start. Handlers for different languages run concurrently against each
    /// other; failures are recorded, never propagated as cancellation.
    fn pre_handle(&self, root: &Node) -> Vec<Error> {
        if self.dispatcher.pre_handlers().is_empty() {
            return Vec::new();
        }
        let errors: Vec<Error> = self
            .dispatcher
            .pre_handlers()
            .par_iter()
            .filter_map(|(id, handler)| {
                handler(&self.config, root).err().map(|source| Error::PreHandle {
                    language: id.clone(),
                    source: Box::new(source),
                })
            })
            .collect();
        for err in &errors {
            tracing::error!("{err}");
        }
        errors
    }

    /// Producer/worker scheduling over the built tree.
    ///
    /// A single producer walks the tree and feeds leaves into a bounded
    /// channel; `concurrency` workers pull, run each context's pipeline, and
    /// hand the context to the outputer exactly once. Completion order
    /// across contexts is nondeterministic.
    fn visit(&self, tree: &Node) -> Vec<Error> {
        let run_errors = Mutex::new(Vec::new());

        thread::scope(|scope| {
            let (sender, receiver) = mpsc::sync_channel::<&FileContext>(QUEUE_CAPACITY);
            let receiver = Arc::new(Mutex::new(receiver));

            scope.spawn(move || {
                tree.each_leaf(&mut |ctx| {
                    let _ = sender.send(ctx);
                });
            });

            for _ in 0..self.config.concurrency {
                let receiver = Arc::clone(&receiver);
                let run_errors = &run_errors;
                scope.spawn(move || loop {
                    let received = receiver.lock().unwrap().recv();
                    let Ok(ctx) = received else {
                        break;
                    };
                    tracing::debug!("lint {}", ctx.path().display());
                    let errors = ctx.check();
                    self.output.write(ctx);
                    if !errors.is_empty() {
                        run_errors.lock().unwrap().extend(errors);
                    }
                });
            }
        });

        run_errors.into_inner().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LanguageConfig;
    use crate::lang::{register_builtins, Language};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        register_builtins(&mut registry).unwrap();
        registry
    }

    fn language_entry(name: &str) -> LanguageConfig {
        LanguageConfig {
            name: name.to_string(),
            extensions: Vec::new(),
            models: Vec::new(),
        }
    }

    #[test]
    fn dispatch_precedence() {
        let registry = registry();
        let config = Config {
            languages: vec![
                language_entry("go"),
                LanguageConfig {
                    name: String::new(),
                    extensions: vec![".cfg".into()],
                    models: Vec::new(),
                },
                language_entry(""),
            ],
            ..Config::default()
        };
        let dispatcher = Dispatcher::new(&registry, &config).unwrap();

        let go = dispatcher.dispatch(Path::new("m.go")).unwrap();
        assert_eq!(go.language, "Go");
        let cfg = dispatcher.dispatch(Path::new("app.cfg")).unwrap();
        assert_eq!(cfg.language, "Any");
        // Unclaimed extension falls back to the default pipeline.
        assert!(dispatcher.dispatch(Path::new("notes.txt")).is_some());
    }

    #[test]
    fn unclaimed_extension_without_fallback_is_skipped() {
        let registry = registry();
        let config = Config {
            languages: vec![language_entry("go")],
            ..Config::default()
        };
        let dispatcher = Dispatcher::new(&registry, &config).unwrap();
        assert!(dispatcher.dispatch(Path::new("notes.txt")).is_none());
    }

    #[test]
    fn duplicate_extension_configuration_conflicts() {
        let registry = registry();
        let config = Config {
            languages: vec![language_entry("go"), language_entry("go")],
            ..Config::default()
        };
        let err = Dispatcher::new(&registry, &config).err().unwrap();
        assert!(matches!(err, Error::ExtensionConflict { .. }));
    }

    static PRE_HANDLED: AtomicUsize = AtomicUsize::new(0);

    fn counting_pre_handler(_config: &Config, root: &Node) -> Result<(), Error> {
        PRE_HANDLED.fetch_add(root.leaf_count(), Ordering::SeqCst);
        Ok(())
    }

    #[test]
    fn pre_handlers_run_before_workers() {
        let mut registry = registry();
        registry
            .register(
                Language::new("pre", "Pre", &[".pre"], &[])
                    .with_pre_handler(counting_pre_handler),
            )
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pre"), "x\n").unwrap();
        std::fs::write(dir.path().join("b.pre"), "y\n").unwrap();

        let report = dir.path().join("report.txt");
        let config = Config {
            languages: vec![language_entry("pre")],
            output_file: report.display().to_string(),
            concurrency: 2,
            ..Config::default()
        };

        PRE_HANDLED.store(0, Ordering::SeqCst);
        lint(&registry, config, dir.path()).unwrap();
        assert_eq!(PRE_HANDLED.load(Ordering::SeqCst), 2);
    }

    fn failing_pre_handler(_config: &Config, _root: &Node) -> Result<(), Error> {
        Err(Error::UnknownFormat("boom".into()))
    }

    #[test]
    fn pre_handler_failure_is_recorded_not_fatal_mid_run() {
        let mut registry = registry();
        registry
            .register(
                Language::new("prefail", "PreFail", &[".prefail"], &[])
                    .with_pre_handler(failing_pre_handler),
            )
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.prefail"), "x\n").unwrap();
        let report = dir.path().join("report.txt");
        let config = Config {
            languages: vec![language_entry("prefail")],
            output_file: report.display().to_string(),
            ..Config::default()
        };

        let err = lint(&registry, config, dir.path()).unwrap_err();
        assert!(matches!(err, Error::PreHandle { .. }));
        // The run still completed: the report file exists.
        assert!(report.exists());
    }
}
