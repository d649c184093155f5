//! The credential file handed over by the credential authority: one voter per line,
//! `<address>[,<suffix>] <credential>`.

use std::io::{self, BufRead};

use thiserror::Error;

/// One line of the credential file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRow {
    /// Line number in the file, starting at 1.
    pub line: usize,
    /// The address column, possibly followed by a comma and extra data.
    pub address: String,
    /// The voter's private credential.
    pub code: String,
}

impl CredentialRow {
    /// The mailbox to send to: the address column up to its first comma.
    pub fn recipient(&self) -> &str {
        self.address
            .split_once(',')
            .map_or(self.address.as_str(), |(recipient, _)| recipient)
    }
}

// Messages never quote the line itself, as it contains a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Line {line} of the credential file needs an address and a credential")]
    MalformedRow { line: usize },
    #[error("Failed to read the credential file: {0}")]
    Io(#[from] io::Error),
}

/// Parse one line. Blank lines yield `None`; columns after the second are ignored.
pub fn parse_line(line: usize, text: &str) -> Result<Option<CredentialRow>, CredentialError> {
    let mut columns = text.split_whitespace();
    let Some(address) = columns.next() else {
        return Ok(None);
    };
    let code = columns
        .next()
        .ok_or(CredentialError::MalformedRow { line })?;
    Ok(Some(CredentialRow {
        line,
        address: address.to_string(),
        code: code.to_string(),
    }))
}

/// Read the whole file, top to bottom.
pub fn read_rows(reader: impl BufRead) -> Result<Vec<CredentialRow>, CredentialError> {
    let mut rows = Vec::new();
    for (index, text) in reader.lines().enumerate() {
        if let Some(row) = parse_line(index + 1, &text?)? {
            rows.push(row);
        }
    }
    debug!("Read {} credentials", rows.len());
    Ok(rows)
}
