//! Read-only access to an election spool: one subdirectory per election, named by its
//! identifier, holding the JSON documents written by the election server.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

mod documents;

#[cfg(test)]
pub(crate) mod examples;

pub use documents::{Dates, ElectionDesc, Metadata, SERVER_AUTHORITY, TIMESTAMP_FORMAT};

pub const DRAFT_MARKER: &str = "draft.json";
pub const DELETED_MARKER: &str = "deleted.json";
pub const METADATA: &str = "metadata.json";
pub const ELECTION: &str = "election.json";
pub const DATES: &str = "dates.json";
pub const VOTERS: &str = "voters.txt";

/// A spool entry that cannot be evaluated.
#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("Cannot list spool directory {path}: {source}")]
    List {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Election {election} has no {document}")]
    MissingDocument {
        election: String,
        document: &'static str,
    },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} lists a single trustee but has no `{field}`")]
    MissingField { path: String, field: &'static str },
}

/// One election directory inside the spool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionDir {
    id: String,
    path: PathBuf,
}

impl ElectionDir {
    /// The election identifier is the directory name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { id, path }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the election was deleted or has not been finalized yet.
    pub fn is_draft_or_deleted(&self) -> bool {
        self.path.join(DELETED_MARKER).exists() || self.path.join(DRAFT_MARKER).exists()
    }

    pub fn metadata(&self) -> Result<Metadata, SpoolError> {
        self.read_json(METADATA)
    }

    /// Whether the election runs in a secure configuration, see [`Metadata::is_secure`].
    /// A single trustee listed without `server_is_trustee` cannot be decided.
    pub fn is_secure(&self) -> Result<bool, SpoolError> {
        self.metadata()?
            .is_secure()
            .ok_or_else(|| SpoolError::MissingField {
                path: self.display(METADATA),
                field: "server_is_trustee",
            })
    }

    pub fn election(&self) -> Result<ElectionDesc, SpoolError> {
        self.read_json(ELECTION)
    }

    pub fn dates(&self) -> Result<Dates, SpoolError> {
        self.read_json(DATES)
    }

    /// Number of lines in the voter roster, blank ones included.
    pub fn voter_count(&self) -> Result<usize, SpoolError> {
        let reader = BufReader::new(self.open(VOTERS)?);
        let mut count = 0;
        for line in reader.split(b'\n') {
            line.map_err(|source| SpoolError::Io {
                path: self.display(VOTERS),
                source,
            })?;
            count += 1;
        }
        Ok(count)
    }

    fn read_json<T: DeserializeOwned>(&self, document: &'static str) -> Result<T, SpoolError> {
        let reader = BufReader::new(self.open(document)?);
        serde_json::from_reader(reader).map_err(|source| SpoolError::Json {
            path: self.display(document),
            source,
        })
    }

    fn open(&self, document: &'static str) -> Result<File, SpoolError> {
        File::open(self.path.join(document)).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => SpoolError::MissingDocument {
                election: self.id.clone(),
                document,
            },
            _ => SpoolError::Io {
                path: self.display(document),
                source,
            },
        })
    }

    fn display(&self, document: &str) -> String {
        self.path.join(document).display().to_string()
    }
}

/// All election directories in the spool, sorted by identifier. Plain files are ignored.
pub fn list_elections(spool: &Path) -> Result<Vec<ElectionDir>, SpoolError> {
    let list_error = |source| SpoolError::List {
        path: spool.display().to_string(),
        source,
    };
    let mut elections = Vec::new();
    for entry in fs::read_dir(spool).map_err(list_error)? {
        let path = entry.map_err(list_error)?.path();
        if path.is_dir() {
            elections.push(ElectionDir::new(path));
        }
    }
    elections.sort_unstable_by(|a, b| a.id.cmp(&b.id));
    debug!("Found {} elections in {}", elections.len(), spool.display());
    Ok(elections)
}
