//! Mail each voter their private credential, using the settings in `Mailer.toml`.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::{value_parser, Arg, ArgMatches, Command};
use log::{error, info};

use election_contrib::{
    config::{MailerConfig, CONFIG_FILE},
    credentials::{self, CredentialRow},
    error::{Error, Result},
    logging,
    mailer::{self, Mailer},
    template::Template,
};

const PROGRAM_NAME: &str = "send-credentials";

const ABOUT_TEXT: &str = "Send every voter of an election their personal credential by email.

Settings are read from the configuration file, then from MAILER_* environment
variables (e.g. MAILER_DEBUG=true). The SMTP password is asked for on startup.";

const CONFIG: &str = "config";
const LOG_CONFIG: &str = "log-config";

const PASSWORD_PROMPT: &str = "please type your password: ";

/// Construct the CLI configuration.
fn cli() -> Command {
    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(CONFIG)
                .long(CONFIG)
                .value_name("PATH")
                .help("Mailer configuration file")
                .value_parser(value_parser!(PathBuf))
                .default_value(CONFIG_FILE),
        )
        .arg(
            Arg::new(LOG_CONFIG)
                .long(LOG_CONFIG)
                .value_name("PATH")
                .help("log4rs configuration file [default: log4rs.yaml if present]")
                .value_parser(value_parser!(PathBuf)),
        )
}

fn read_codes(path: &Path) -> Result<Vec<CredentialRow>> {
    let file = File::open(path).map_err(|source| Error::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(credentials::read_rows(BufReader::new(file))?)
}

fn load_template(config: &MailerConfig) -> Result<Template> {
    match config.template_file() {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| Error::Read {
                path: path.display().to_string(),
                source,
            })?;
            Ok(Template::new(text))
        }
        None => Ok(Template::default()),
    }
}

fn run(args: &ArgMatches) -> Result<()> {
    let config_path: &PathBuf = args.get_one(CONFIG).unwrap(); // Has a default.
    let config = MailerConfig::load(config_path)?;

    let rows = read_codes(config.code_file())?;
    let template = load_template(&config)?;
    info!(
        "{} credentials to send for election {}",
        rows.len(),
        config.election_uuid()
    );

    let password = rpassword::prompt_password(PASSWORD_PROMPT).map_err(Error::Prompt)?;
    let transport = mailer::connect(&config, password)?;
    let mailer = Mailer::new(transport, &config, template)?;
    let sent = mailer.send_all(&rows)?;
    info!("Sent {sent} credentials");
    Ok(())
}

fn main() {
    let args = cli().get_matches();
    let log_config: Option<&PathBuf> = args.get_one(LOG_CONFIG);
    if let Err(err) = logging::init(log_config.map(PathBuf::as_path)) {
        eprintln!("{PROGRAM_NAME}: {err}");
        std::process::exit(1);
    }

    if let Err(err) = run(&args) {
        error!("{err}");
        error!("Mailing aborted, some voters may already have received their credential");
        std::process::exit(1)
    }
}
