//! Command-line interface.
//!
//! Two subcommands: `lint` checks a project tree, `config` writes the
//! default configuration. Flags override the loaded configuration file.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::lang::{register_builtins, Registry};

const DEFAULT_CONFIG_FILE: &str = "treelint.yaml";

#[derive(Parser)]
#[command(
    name = "treelint",
    version,
    about = "Configurable multi-language lint engine built on tree-sitter"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check a project tree against the configured rules.
    Lint {
        /// Project root to lint.
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Configuration file.
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Number of lint workers.
        #[arg(short, long)]
        concurrency: Option<usize>,
        /// Report format: cmd or json.
        #[arg(long)]
        output_format: Option<String>,
        /// Report file; stdout when omitted.
        #[arg(long)]
        output_file: Option<String>,
        /// Silence warnings.
        #[arg(long)]
        disable_warning: bool,
        /// Rule tags to exclude, comma separated.
        #[arg(long, value_delimiter = ',')]
        exclude_tags: Vec<String>,
        /// Rule names to exclude, comma separated.
        #[arg(long, value_delimiter = ',')]
        exclude_names: Vec<String>,
    },
    /// Write the default configuration covering every registered model.
    Config {
        /// Destination file; stdout when omitted. Refuses to overwrite.
        path: Option<PathBuf>,
    },
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut registry = Registry::new();
    register_builtins(&mut registry)?;

    match cli.command {
        Command::Lint {
            path,
            config,
            concurrency,
            output_format,
            output_file,
            disable_warning,
            exclude_tags,
            exclude_names,
        } => {
            let mut conf = if config.exists() {
                Config::load(&config).with_context(|| format!("loading {}", config.display()))?
            } else {
                // No project configuration: fall back to the full defaults.
                Config::template(&registry)
            };
            if let Some(n) = concurrency {
                conf.concurrency = n;
            }
            if let Some(format) = output_format {
                conf.output_format = format;
            }
            if let Some(file) = output_file {
                conf.output_file = file;
            }
            if disable_warning {
                conf.warning_disable = true;
            }
            conf.exclude_tags.extend(exclude_tags);
            conf.exclude_names.extend(exclude_names);

            init_logging(&conf)?;
            crate::engine::lint(&registry, conf, &path)?;
            Ok(())
        }
        Command::Config { path } => {
            let yaml = Config::template(&registry).to_yaml()?;
            match path {
                None => print!("{yaml}"),
                Some(path) => {
                    use std::io::Write as _;
                    let mut file = std::fs::File::create_new(&path).with_context(|| {
                        format!("cannot create config file at {}", path.display())
                    })?;
                    file.write_all(yaml.as_bytes())?;
                }
            }
            Ok(())
        }
    }
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let level = if config.warning_disable {
        "error"
    } else {
        config.log_level.as_str()
    };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("error"));

    if config.log_file.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        let file = std::fs::File::create(&config.log_file)
            .with_context(|| format!("cannot create log file at {}", config.log_file))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    }
    Ok(())
}
