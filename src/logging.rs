//! Logging setup shared by both tools. Log output always goes to stderr: stdout carries
//! the tools' actual results.

use std::path::Path;

use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{runtime::ConfigErrors, Appender, Root},
    encode::pattern::PatternEncoder,
    Config,
};
use thiserror::Error;

/// Logging configuration picked up from the working directory when present.
pub const LOG_CONFIG: &str = "log4rs.yaml";

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to load logging config {path}: {message}")]
    File { path: String, message: String },
    #[error(transparent)]
    Config(#[from] ConfigErrors),
    #[error(transparent)]
    Install(#[from] log::SetLoggerError),
}

/// Initialise logging from `config_file`, or from `log4rs.yaml` if it exists, or else
/// with warnings and errors on stderr.
pub fn init(config_file: Option<&Path>) -> Result<(), LoggingError> {
    let path = config_file.unwrap_or_else(|| Path::new(LOG_CONFIG));
    if config_file.is_some() || path.exists() {
        log4rs::init_file(path, Default::default()).map_err(|err| LoggingError::File {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        info!("Initialised logging from {}", path.display());
    } else {
        log4rs::init_config(default_config(LevelFilter::Warn)?)?;
    }
    Ok(())
}

/// Everything at `level` and above on stderr.
pub fn default_config(level: LevelFilter) -> Result<Config, ConfigErrors> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();
    Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config() {
        let config = default_config(LevelFilter::Info).unwrap();
        assert_eq!(config.root().level(), LevelFilter::Info);
        assert_eq!(config.appenders().len(), 1);
    }

    #[test]
    fn missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        match init(Some(&path)) {
            Err(LoggingError::File { path: reported, .. }) => {
                assert_eq!(reported, path.display().to_string())
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
