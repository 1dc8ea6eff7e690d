//! Logging setup shared by the web3-state binaries.
//!
//! [`init`] installs a global `tracing` subscriber built from a [`LogConfig`].
//! `RUST_LOG` directives, when present, take precedence over `level`.

use anyhow::Result;
use serde::Deserialize;
use std::{fs::File, str::FromStr, sync::Mutex};
use tracing::Level;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter, Registry};

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Plain,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    File,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct LogConfig {
    /// Log level, e.g. "info", "debug", "trace".
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub output: LogOutput,
    /// Required when `output` is `file`.
    pub file_path: Option<String>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
        }
    }
}

impl LogConfig {
    /// The configured level; unknown names fall back to `INFO`.
    pub fn level(&self) -> Level {
        Level::from_str(&self.level).unwrap_or(Level::INFO)
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level()).into())
            .from_env_lossy()
    }
}

/// Installs the global subscriber. Fails if one is already installed or the
/// log file cannot be created.
pub fn init(config: &LogConfig) -> Result<()> {
    let subscriber = Registry::default().with(config.filter());

    match config.output {
        LogOutput::File => {
            let file_path = config
                .file_path
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Log output is 'file' but 'file_path' is not specified"))?;
            let file_writer = Mutex::new(File::create(file_path)?);

            match config.format {
                LogFormat::Json => subscriber
                    .with(fmt::layer().with_writer(file_writer).with_ansi(false).json())
                    .try_init()?,
                LogFormat::Plain => subscriber
                    .with(fmt::layer().with_writer(file_writer).with_ansi(false).pretty())
                    .try_init()?,
            }
        }
        LogOutput::Stdout => match config.format {
            LogFormat::Json => subscriber
                .with(fmt::layer().with_writer(std::io::stdout).json())
                .try_init()?,
            LogFormat::Plain => subscriber
                .with(fmt::layer().with_writer(std::io::stdout).pretty())
                .try_init()?,
        },
    };

    Ok(())
}
