//! Batch delivery of voting credentials over SMTP.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::thread;
use std::time::Duration;

use lettre::{
    address::AddressError,
    message::{header::ContentType, Mailbox},
    transport::smtp::{self, authentication::Credentials},
    Message, SmtpTransport, Transport,
};
use thiserror::Error;

use crate::config::MailerConfig;
use crate::credentials::CredentialRow;
use crate::template::{self, Template, TemplateError};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid `{field}` address: {source}")]
    Address {
        field: &'static str,
        #[source]
        source: AddressError,
    },
    #[error("Invalid recipient on line {line} of the credential file: {source}")]
    Recipient {
        line: usize,
        #[source]
        source: AddressError,
    },
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP session with {host} failed: {source}")]
    Smtp {
        host: String,
        #[source]
        source: smtp::Error,
    },
    #[error("Failed to send the message for line {line}: {source}")]
    Transport {
        line: usize,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// The STARTTLS transport used for the whole batch. Nothing is sent over the network
/// yet: the session opens and authenticates with the first message, then is reused.
pub fn connect(config: &MailerConfig, password: String) -> Result<SmtpTransport, MailError> {
    let host = config.smtp_host();
    let smtp_error = |source| MailError::Smtp {
        host: host.to_string(),
        source,
    };
    let mut builder = SmtpTransport::starttls_relay(host)
        .map_err(smtp_error)?
        .credentials(Credentials::new(config.username().to_string(), password));
    if let Some(port) = config.smtp_port() {
        builder = builder.port(port);
    }
    info!("Mailing through {host} as {}", config.username());
    Ok(builder.build())
}

/// Sends one templated message per credential row through a single transport.
pub struct Mailer<T> {
    transport: T,
    template: Template,
    sender: Mailbox,
    subject: String,
    election_uuid: String,
    /// Replaces every recipient when set.
    debug_recipient: Option<Mailbox>,
    delay: Duration,
}

impl<T> Mailer<T>
where
    T: Transport,
    T::Error: StdError + Send + Sync + 'static,
{
    /// Check the configured addresses and the template up front, so that a mistake
    /// there is caught before anything is sent.
    pub fn new(transport: T, config: &MailerConfig, template: Template) -> Result<Self, MailError> {
        let sender = parse_address("from", config.sender())?;
        let debug_recipient = if config.debug() {
            warn!(
                "Debug mode: every message goes to {} instead of the voters",
                config.debug_address()
            );
            Some(parse_address("debug_address", config.debug_address())?)
        } else {
            None
        };
        let mailer = Self {
            transport,
            template,
            sender,
            subject: config.subject().to_string(),
            election_uuid: config.election_uuid().to_string(),
            debug_recipient,
            delay: config.delay(),
        };
        mailer.body("")?;
        Ok(mailer)
    }

    fn body(&self, code: &str) -> Result<String, TemplateError> {
        let values = HashMap::from([
            (template::UUID, self.election_uuid.as_str()),
            (template::ELECTION_CODE, code),
        ]);
        self.template.substitute(&values)
    }

    /// The message for one row.
    pub fn compose(&self, row: &CredentialRow) -> Result<Message, MailError> {
        // Checked in debug mode too, so a pre-flight run catches bad rows.
        let recipient: Mailbox = row
            .recipient()
            .parse()
            .map_err(|source| MailError::Recipient {
                line: row.line,
                source,
            })?;
        let recipient = self.debug_recipient.clone().unwrap_or(recipient);
        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(self.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(self.body(&row.code)?)?;
        Ok(message)
    }

    /// Send one message per row, pausing between messages. Every message is built before
    /// the first one is sent; the first delivery failure stops the batch.
    pub fn send_all(&self, rows: &[CredentialRow]) -> Result<usize, MailError> {
        let messages = rows
            .iter()
            .map(|row| Ok((row, self.compose(row)?)))
            .collect::<Result<Vec<_>, MailError>>()?;

        for (index, (row, message)) in messages.iter().enumerate() {
            if index > 0 {
                thread::sleep(self.delay);
            }
            self.transport
                .send(message)
                .map_err(|err| MailError::Transport {
                    line: row.line,
                    source: Box::new(err),
                })?;
            let to = message.headers().get_raw("To").unwrap_or_default();
            info!("Sent credential {}/{} to {to}", index + 1, messages.len());
        }
        Ok(messages.len())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

fn parse_address(field: &'static str, address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|source| MailError::Address { field, source })
}
