//! Settings of the credential mailer, layered from defaults, a TOML file and the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default location of the mailer configuration file.
pub const CONFIG_FILE: &str = "Mailer.toml";

/// Prefix of the environment variables overriding the configuration file.
pub const ENV_PREFIX: &str = "MAILER_";

/// Mailer configuration, derived from built-in defaults, `Mailer.toml` and `MAILER_*`
/// environment variables, in increasing order of priority. The SMTP password is never
/// part of it: it is asked for interactively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailerConfig {
    // outgoing mail
    smtp_host: String,
    smtp_port: Option<u16>,
    username: String,
    // message
    from: String,
    subject: String,
    template_file: Option<PathBuf>,
    // election
    election_uuid: String,
    code_file: PathBuf,
    // pacing and pre-flight
    delay_ms: u64,
    debug: bool,
    debug_address: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.example.com".into(),
            smtp_port: None,
            username: String::new(),
            from: "election@example.com".into(),
            subject: "Your voting material / Votre matériel de vote".into(),
            template_file: None,
            election_uuid: String::new(),
            code_file: PathBuf::from("codefile.txt"),
            delay_ms: 200,
            debug: false,
            debug_address: "election@example.com".into(),
        }
    }
}

impl MailerConfig {
    /// The layered configuration sources, with `path` as the configuration file.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(MailerConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load the configuration, with `path` as the configuration file. A missing file
    /// is not an error: defaults and environment variables still apply.
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        Self::from_figment(&Self::figment(path))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, figment::Error> {
        let config: Self = figment.extract()?;
        debug!(
            "Loaded mailer config: relay {}, election {}, debug {}",
            config.smtp_host, config.election_uuid, config.debug
        );
        Ok(config)
    }

    /// SMTP relay, reached with STARTTLS.
    pub fn smtp_host(&self) -> &str {
        &self.smtp_host
    }

    /// Relay port, if not the standard submission port.
    pub fn smtp_port(&self) -> Option<u16> {
        self.smtp_port
    }

    /// Login on the relay.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Sender of every message, typically the credential authority.
    pub fn sender(&self) -> &str {
        &self.from
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// File holding the message template; the built-in bilingual one is used otherwise.
    pub fn template_file(&self) -> Option<&Path> {
        self.template_file.as_deref()
    }

    /// Identifier of the election the credentials belong to.
    pub fn election_uuid(&self) -> &str {
        &self.election_uuid
    }

    /// File with one `<address> <credential>` pair per line.
    pub fn code_file(&self) -> &Path {
        &self.code_file
    }

    /// Pause between two messages, to spare the relay.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// When set, every message goes to `debug_address` instead of the voter.
    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn debug_address(&self) -> &str {
        &self.debug_address
    }
}
