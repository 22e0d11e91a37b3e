//! Log setup. The TUI owns the terminal, so everything goes to a file under
//! the state directory.
//!
//! - `CRUNCHYUTILS_LOG` or `RUST_LOG`: filter directive
//!   (default `crunchyutils=info`)
//! - `CRUNCHYUTILS_LOG_FORMAT`: `text` (default) or `json`

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "crunchyutils=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub filter: String,
    pub format: LogFormat,
    pub file: PathBuf,
}

impl LogConfig {
    pub fn from_env(dir: &Path) -> Self {
        let filter = std::env::var("CRUNCHYUTILS_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_FILTER.to_string());
        let format = std::env::var("CRUNCHYUTILS_LOG_FORMAT")
            .map(|s| LogFormat::parse(&s))
            .unwrap_or_default();
        Self { filter, format, file: dir.join("crunchyutils.log") }
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: &LogConfig) -> Result<()> {
    if let Some(parent) = config.file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)
        .with_context(|| format!("opening {}", config.file.display()))?;

    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let writer = Mutex::new(file);

    match config.format {
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(writer));
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
        LogFormat::Text => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(writer));
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
    }

    #[test]
    fn log_file_lives_in_given_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = LogConfig::from_env(dir.path());
        assert_eq!(cfg.file, dir.path().join("crunchyutils.log"));
    }
}
