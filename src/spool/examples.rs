//! Example spool entries for tests.

use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::{json, Value};

use super::{ElectionDir, DATES, DELETED_MARKER, DRAFT_MARKER, ELECTION, METADATA, VOTERS};

/// A fixed reference time, so ages do not depend on the test clock.
pub fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

/// Render a time the way the election server writes it.
pub fn timestamp(time: NaiveDateTime) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// An election to be written into a spool.
#[derive(Debug, Clone)]
pub struct ExampleElection {
    name: String,
    voters: usize,
    metadata: Value,
    dates: Value,
    draft: bool,
    deleted: bool,
}

impl ExampleElection {
    /// An election that passes every liveness check at `now`: delegated credentials, two
    /// trustees, five voters, finalized the day before.
    pub fn live(now: NaiveDateTime) -> Self {
        Self {
            name: "Board of directors".into(),
            voters: 5,
            metadata: json!({
                "cred_authority": "Alice",
                "trustees": [{ "name": "Bob" }, { "name": "Carol" }],
                "server_is_trustee": false,
            }),
            dates: json!({ "finalization": timestamp(now - Duration::days(1)) }),
            draft: false,
            deleted: false,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.into();
        self
    }

    pub fn voters(mut self, voters: usize) -> Self {
        self.voters = voters;
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn dates(mut self, dates: Value) -> Self {
        self.dates = dates;
        self
    }

    pub fn draft(mut self) -> Self {
        self.draft = true;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn write(&self, spool: &Path, id: &str) -> ElectionDir {
        let dir = spool.join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(ELECTION),
            json!({ "name": self.name, "uuid": id }).to_string(),
        )
        .unwrap();
        fs::write(dir.join(METADATA), self.metadata.to_string()).unwrap();
        fs::write(dir.join(DATES), self.dates.to_string()).unwrap();
        let voters: String = (0..self.voters)
            .map(|i| format!("voter{i}@example.com,voter{i}\n"))
            .collect();
        fs::write(dir.join(VOTERS), voters).unwrap();
        if self.draft {
            fs::write(dir.join(DRAFT_MARKER), "{}").unwrap();
        }
        if self.deleted {
            fs::write(dir.join(DELETED_MARKER), "{}").unwrap();
        }
        ElectionDir::new(dir)
    }
}
