//! Selection of the elections in a spool that are worth monitoring.

use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::Path;

use chrono::{Duration, NaiveDateTime};

use crate::error::{Error, Result};
use crate::spool::{self, Dates, ElectionDir, SpoolError};

pub const DEFAULT_MIN_VOTERS: usize = 5;
pub const DEFAULT_MAX_TALLIED_AGE_DAYS: i64 = 7;
pub const DEFAULT_MAX_FINALIZED_AGE_DAYS: i64 = 30;

/// What to do with an election whose documents are missing or unreadable.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Stop at the first malformed election and report it.
    #[default]
    Abort,
    /// Log it and carry on with the rest of the spool.
    Skip,
}

/// Thresholds and switches for the liveness filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria {
    /// Elections with fewer voters are considered tests.
    pub min_voters: usize,
    /// How long a tallied election stays interesting.
    pub max_tallied_age: Duration,
    /// How long a finalized but untallied election stays interesting.
    pub max_finalized_age: Duration,
    /// Explain every exclusion on the diagnostics stream.
    pub verbose: bool,
    pub on_malformed: MalformedPolicy,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            min_voters: DEFAULT_MIN_VOTERS,
            max_tallied_age: Duration::days(DEFAULT_MAX_TALLIED_AGE_DAYS),
            max_finalized_age: Duration::days(DEFAULT_MAX_FINALIZED_AGE_DAYS),
            verbose: false,
            on_malformed: MalformedPolicy::Abort,
        }
    }
}

/// The reason an election is not worth monitoring.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Exclusion {
    /// Deleted, or still a draft.
    DraftOrDeleted,
    /// Named like a test, or too few voters.
    Test,
    /// The server alone holds the credentials and the decryption key.
    Degraded,
    /// Archived, or tallied/finalized too long ago.
    Old,
}

impl Exclusion {
    fn reason(&self) -> &'static str {
        match self {
            Self::DraftOrDeleted => "is deleted or not yet finalized",
            Self::Test => "is probably a test election",
            Self::Degraded => "is in degraded mode",
            Self::Old => "is old",
        }
    }
}

/// Outcome of evaluating one election.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Verdict {
    Live,
    Excluded(Exclusion),
}

/// A human-readable account of an exclusion, e.g. "Election abc is old".
pub struct Explanation<'a> {
    pub id: &'a str,
    pub exclusion: Exclusion,
}

impl Display for Explanation<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Election {} {}", self.id, self.exclusion.reason())
    }
}

/// Counts from one pass over a spool.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub live: usize,
    pub excluded: usize,
    pub malformed: usize,
}

pub struct LivenessFilter {
    criteria: Criteria,
}

impl LivenessFilter {
    pub fn new(criteria: Criteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Run the checks in order, stopping at the first one that excludes the election.
    /// Each check only reads the documents it needs.
    pub fn evaluate(
        &self,
        election: &ElectionDir,
        now: NaiveDateTime,
    ) -> std::result::Result<Verdict, SpoolError> {
        if election.is_draft_or_deleted() {
            return Ok(Verdict::Excluded(Exclusion::DraftOrDeleted));
        }
        if self.is_test(election)? {
            return Ok(Verdict::Excluded(Exclusion::Test));
        }
        if !election.is_secure()? {
            return Ok(Verdict::Excluded(Exclusion::Degraded));
        }
        if self.is_old(election.id(), &election.dates()?, now) {
            return Ok(Verdict::Excluded(Exclusion::Old));
        }
        Ok(Verdict::Live)
    }

    fn is_test(&self, election: &ElectionDir) -> std::result::Result<bool, SpoolError> {
        if election.election()?.has_test_name() {
            return Ok(true);
        }
        let voters = election.voter_count()?;
        debug!("Election {} has {voters} voters", election.id());
        Ok(voters < self.criteria.min_voters)
    }

    fn is_old(&self, id: &str, dates: &Dates, now: NaiveDateTime) -> bool {
        if dates.archive {
            return true;
        }
        match (dates.tally, dates.finalization) {
            (Some(tallied), _) => now - tallied > self.criteria.max_tallied_age,
            (None, Some(finalized)) => now - finalized > self.criteria.max_finalized_age,
            (None, None) => {
                warn!("Election {id} has neither a tally nor a finalization date");
                false
            }
        }
    }

    /// Evaluate every election under `root`, writing live identifiers to `out` one per line.
    /// In verbose mode, every exclusion is explained on `diagnostics`.
    pub fn run(
        &self,
        root: &Path,
        now: NaiveDateTime,
        out: &mut impl Write,
        diagnostics: &mut impl Write,
    ) -> Result<Summary> {
        let mut summary = Summary::default();
        for election in spool::list_elections(root)? {
            let id = election.id();
            match self.evaluate(&election, now) {
                Ok(Verdict::Live) => {
                    summary.live += 1;
                    writeln!(out, "{id}").map_err(Error::Output)?;
                }
                Ok(Verdict::Excluded(exclusion)) => {
                    summary.excluded += 1;
                    debug!("Excluding election {id}: {exclusion:?}");
                    if self.criteria.verbose {
                        writeln!(diagnostics, "{}", Explanation { id, exclusion })
                            .map_err(Error::Output)?;
                    }
                }
                Err(err) => match self.criteria.on_malformed {
                    MalformedPolicy::Abort => return Err(err.into()),
                    MalformedPolicy::Skip => {
                        summary.malformed += 1;
                        warn!("Skipping malformed election {id}: {err}");
                        if self.criteria.verbose {
                            writeln!(diagnostics, "Election {id} is malformed: {err}")
                                .map_err(Error::Output)?;
                        }
                    }
                },
            }
        }
        out.flush().map_err(Error::Output)?;
        info!(
            "{} live, {} excluded, {} malformed",
            summary.live, summary.excluded, summary.malformed
        );
        Ok(summary)
    }
}
