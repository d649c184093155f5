use std::io::Error as IoError;

use figment::Error as ConfigError;
use thiserror::Error;

use crate::credentials::CredentialError;
use crate::logging::LoggingError;
use crate::mailer::MailError;
use crate::spool::SpoolError;
use crate::template::TemplateError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort one of the tools.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Spool(#[from] SpoolError),
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Mail(#[from] MailError),
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error("Failed to read the password: {0}")]
    Prompt(#[source] IoError),
    #[error("Failed to write output: {0}")]
    Output(#[source] IoError),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: IoError,
    },
}
