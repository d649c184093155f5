//! List the elections of a spool that are alive and deserve to be monitored: finalized,
//! not a test, not in degraded mode, and not stale.

use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{Duration, Local};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::debug;

use election_contrib::{
    liveness::{Criteria, LivenessFilter, MalformedPolicy},
    logging,
};

const PROGRAM_NAME: &str = "list-live-elections";

const ABOUT_TEXT: &str = "List elections that are alive and deserve to be monitored.

Identifiers of live elections are printed on stdout, one per line.

EXIT CODES:
     0: Success.
     1: Error, e.g. an unreadable spool entry.";

const SPOOL_DIRECTORY: &str = "SPOOL_DIRECTORY";
const VERBOSE: &str = "verbose";
const MIN_VOTERS: &str = "min-voters";
const MAX_TALLIED_AGE: &str = "max-tallied-age";
const MAX_FINALIZED_AGE: &str = "max-finalized-age";
const SKIP_MALFORMED: &str = "skip-malformed";
const LOG_CONFIG: &str = "log-config";

/// The largest number of days a `chrono::Duration` can hold.
const MAX_AGE_DAYS: i64 = 106_751_991;

/// Construct the CLI configuration.
fn cli() -> Command {
    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(SPOOL_DIRECTORY)
                .help("Spool directory where the elections are stored")
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Set)
                .required(true),
        )
        .arg(
            Arg::new(VERBOSE)
                .long(VERBOSE)
                .help("Explain why elections are discarded, on stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(MIN_VOTERS)
                .long(MIN_VOTERS)
                .value_name("COUNT")
                .help("Elections with fewer voters are considered tests")
                .value_parser(value_parser!(usize))
                .default_value("5"),
        )
        .arg(
            Arg::new(MAX_TALLIED_AGE)
                .long(MAX_TALLIED_AGE)
                .value_name("DAYS")
                .help("Discard elections tallied longer ago than this")
                .value_parser(value_parser!(i64).range(0..=MAX_AGE_DAYS))
                .default_value("7"),
        )
        .arg(
            Arg::new(MAX_FINALIZED_AGE)
                .long(MAX_FINALIZED_AGE)
                .value_name("DAYS")
                .help("Discard untallied elections finalized longer ago than this")
                .value_parser(value_parser!(i64).range(0..=MAX_AGE_DAYS))
                .default_value("30"),
        )
        .arg(
            Arg::new(SKIP_MALFORMED)
                .long(SKIP_MALFORMED)
                .help("Skip elections with missing or invalid files instead of stopping")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(LOG_CONFIG)
                .long(LOG_CONFIG)
                .value_name("PATH")
                .help("log4rs configuration file [default: log4rs.yaml if present]")
                .value_parser(value_parser!(PathBuf)),
        )
}

/// Filtering criteria from the command line.
fn criteria(args: &ArgMatches) -> Criteria {
    // Unwraps are safe: these arguments all have defaults.
    Criteria {
        min_voters: *args.get_one::<usize>(MIN_VOTERS).unwrap(),
        max_tallied_age: Duration::days(*args.get_one::<i64>(MAX_TALLIED_AGE).unwrap()),
        max_finalized_age: Duration::days(*args.get_one::<i64>(MAX_FINALIZED_AGE).unwrap()),
        verbose: args.get_flag(VERBOSE),
        on_malformed: if args.get_flag(SKIP_MALFORMED) {
            MalformedPolicy::Skip
        } else {
            MalformedPolicy::Abort
        },
    }
}

/// Run the filter, report any error, and return the exit code.
fn run(args: &ArgMatches, out: &mut impl Write, diagnostics: &mut impl Write) -> u8 {
    let spool: &PathBuf = args.get_one(SPOOL_DIRECTORY).unwrap(); // Required argument is guaranteed to be present.
    let filter = LivenessFilter::new(criteria(args));
    debug!("Filtering {} with {:?}", spool.display(), filter.criteria());
    match filter.run(spool, Local::now().naive_local(), out, diagnostics) {
        Ok(_) => 0,
        Err(err) => {
            // Nothing more can be done if stderr itself is gone.
            let _ = writeln!(diagnostics, "{PROGRAM_NAME}: {err}");
            1
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let log_config: Option<&PathBuf> = args.get_one(LOG_CONFIG);
    if let Err(err) = logging::init(log_config.map(PathBuf::as_path)) {
        eprintln!("{PROGRAM_NAME}: {err}");
        std::process::exit(1);
    }
    let exit_code = run(&args, &mut io::stdout().lock(), &mut io::stderr().lock());
    std::process::exit(exit_code.into())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use serde_json::json;

    use super::*;

    fn init_logging() {
        log4rs_test_utils::test_logging::init_logging_once_for(
            ["list_live_elections", "election_contrib"],
            None,
            None,
        );
    }

    /// Write an election that is live, unless `name` or `tallied_days_ago` say otherwise.
    fn write_election(spool: &Path, id: &str, name: &str, tallied_days_ago: i64) {
        let dir = spool.join(id);
        fs::create_dir_all(&dir).unwrap();
        let tally = Local::now().naive_local() - Duration::days(tallied_days_ago);
        let files = [
            ("election.json", json!({ "name": name }).to_string()),
            (
                "metadata.json",
                json!({ "cred_authority": "Alice" }).to_string(),
            ),
            (
                "dates.json",
                json!({
                    "finalization": (tally - Duration::days(1)).format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
                    "tally": tally.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
                })
                .to_string(),
            ),
            ("voters.txt", "a\nb\nc\nd\ne\n".to_string()),
        ];
        for (file, contents) in files {
            fs::write(dir.join(file), contents).unwrap();
        }
    }

    fn run_with(command_line: &[&str]) -> (u8, String, String) {
        init_logging();
        let args = cli().try_get_matches_from(command_line).unwrap();
        let (mut out, mut diagnostics) = (Vec::new(), Vec::new());
        let code = run(&args, &mut out, &mut diagnostics);
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(diagnostics).unwrap(),
        )
    }

    #[test]
    fn correct_cli_usage() {
        let spool = tempfile::tempdir().unwrap();
        write_election(spool.path(), "live", "Board of directors", 1);
        write_election(spool.path(), "stale", "Board of directors", 10);
        write_election(spool.path(), "trial", "Test election", 1);
        let spool_path = spool.path().to_str().unwrap();

        let (code, out, diagnostics) = run_with(&[PROGRAM_NAME, spool_path]);
        assert_eq!(code, 0);
        assert_eq!(out, "live\n");
        assert_eq!(diagnostics, "");

        let (code, out, diagnostics) = run_with(&[PROGRAM_NAME, "--verbose", spool_path]);
        assert_eq!(code, 0);
        assert_eq!(out, "live\n");
        assert_eq!(
            diagnostics,
            "Election stale is old\nElection trial is probably a test election\n"
        );

        let (code, out, _) = run_with(&[PROGRAM_NAME, spool_path, "--max-tallied-age", "30"]);
        assert_eq!(code, 0);
        assert_eq!(out, "live\nstale\n");

        let (code, out, _) = run_with(&[PROGRAM_NAME, spool_path, "--min-voters", "6"]);
        assert_eq!(code, 0);
        assert_eq!(out, "");
    }

    #[test]
    fn malformed_spool() {
        let spool = tempfile::tempdir().unwrap();
        write_election(spool.path(), "live", "Board of directors", 1);
        fs::create_dir(spool.path().join("empty")).unwrap();
        let spool_path = spool.path().to_str().unwrap();

        let (code, out, diagnostics) = run_with(&[PROGRAM_NAME, spool_path]);
        assert_eq!(code, 1);
        assert_eq!(out, "");
        assert!(diagnostics.contains("Election empty has no election.json"));
        assert_eq!(diagnostics.matches("has no election.json").count(), 1);

        let (code, out, _) = run_with(&[PROGRAM_NAME, "--skip-malformed", spool_path]);
        assert_eq!(code, 0);
        assert_eq!(out, "live\n");

        let (code, _, _) = run_with(&[PROGRAM_NAME, "not a real directory"]);
        assert_eq!(code, 1);
    }

    #[test]
    fn bad_cli_usage() {
        // No spool directory.
        let command_line = [PROGRAM_NAME];
        cli().try_get_matches_from(command_line).unwrap_err();

        // Too many positional arguments.
        let command_line = [PROGRAM_NAME, "spool", "extra"];
        cli().try_get_matches_from(command_line).unwrap_err();

        // Ages must be non-negative whole days.
        let command_line = [PROGRAM_NAME, "spool", "--max-tallied-age", "-1"];
        cli().try_get_matches_from(command_line).unwrap_err();
        let command_line = [PROGRAM_NAME, "spool", "--max-finalized-age", "soon"];
        cli().try_get_matches_from(command_line).unwrap_err();

        // Ages too large for a duration are rejected rather than overflowing.
        let command_line = [PROGRAM_NAME, "spool", "--max-tallied-age", "9223372036854775807"];
        cli().try_get_matches_from(command_line).unwrap_err();
        let command_line = [PROGRAM_NAME, "spool", "--max-finalized-age", "106751992"];
        cli().try_get_matches_from(command_line).unwrap_err();
        let command_line = [PROGRAM_NAME, "spool", "--max-finalized-age", "106751991"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(
            criteria(&args).max_finalized_age,
            Duration::days(MAX_AGE_DAYS)
        );
    }

    #[test]
    fn default_criteria() {
        let args = cli().try_get_matches_from([PROGRAM_NAME, "spool"]).unwrap();
        assert_eq!(criteria(&args), Criteria::default());
    }
}
