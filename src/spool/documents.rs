use chrono::NaiveDateTime;
use serde::{de::IgnoredAny, Deserialize, Deserializer};
use serde_json::Value;

/// Layout of the lifecycle timestamps in `dates.json`, e.g. `2024-03-01 09:30:00.123456`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Credential authority value meaning the platform issues credentials itself.
pub const SERVER_AUTHORITY: &str = "server";

/// The trust configuration found in `metadata.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Metadata {
    /// Who generates the voter credentials.
    pub cred_authority: Option<String>,
    /// Trustee groups holding shares of the decryption key.
    pub trustees: Option<Vec<Value>>,
    /// Whether the platform holds a key share itself.
    pub server_is_trustee: Option<bool>,
}

impl Metadata {
    /// An election is secure as soon as credentials are delegated or the key is shared with
    /// someone other than the server. Anything else is degraded mode.
    ///
    /// `None` when a single trustee is listed without `server_is_trustee`, the one case
    /// where that flag decides.
    pub fn is_secure(&self) -> Option<bool> {
        if let Some(authority) = &self.cred_authority {
            if authority != SERVER_AUTHORITY {
                return Some(true);
            }
        }
        match &self.trustees {
            Some(trustees) if trustees.len() > 1 => Some(true),
            Some(_) => self.server_is_trustee.map(|server_is_trustee| !server_is_trustee),
            None => Some(false),
        }
    }
}

/// The election descriptor, `election.json`. Only the name is of interest here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ElectionDesc {
    pub name: String,
}

impl ElectionDesc {
    /// Whether the name contains "test" in any letter case.
    pub fn has_test_name(&self) -> bool {
        self.name.to_lowercase().contains("test")
    }
}

/// Lifecycle dates, `dates.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Dates {
    /// Set when the key is present at all, whatever its value.
    #[serde(default, deserialize_with = "present")]
    pub archive: bool,
    #[serde(default, deserialize_with = "timestamp")]
    pub tally: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "timestamp")]
    pub finalization: Option<NaiveDateTime>,
}

fn present<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    IgnoredAny::deserialize(deserializer)?;
    Ok(true)
}

fn timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    Option::<String>::deserialize(deserializer)?
        .map(|value| {
            NaiveDateTime::parse_from_str(&value, TIMESTAMP_FORMAT)
                .map_err(|err| D::Error::custom(format!("invalid timestamp {value:?}: {err}")))
        })
        .transpose()
}
