use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_RECIPIENT: &str = "jum@anubis.han.de";
pub const DEFAULT_STATION_ID: &str = "DJOE";

/// Who every message is addressed to and which station it is reported as.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Identity {
    /// Mail address in the `To:` header (default: jum@anubis.han.de)
    #[serde(default = "default_recipient")]
    pub recipient: String,

    /// Station identifier used for `IDENT:` and message file names (default: DJOE)
    #[serde(default = "default_station_id")]
    pub station_id: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            recipient: default_recipient(),
            station_id: default_station_id(),
        }
    }
}

impl Identity {
    /// Load an identity from a JSON file such as `{"stationId": "DK1AB"}`.
    /// Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::io(path, source))?;
        serde_json::from_str(&text).map_err(|source| Error::IdentityFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject identities that cannot produce a valid message or file name.
    pub fn validate(&self) -> Result<()> {
        if self.recipient.trim().is_empty() {
            return Err(Error::Config {
                message: "recipient address must not be empty".to_string(),
            });
        }
        if self.station_id.is_empty() {
            return Err(Error::Config {
                message: "station identifier must not be empty".to_string(),
            });
        }
        if self
            .station_id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ';') || c.is_whitespace() || c.is_control())
        {
            return Err(Error::Config {
                message: format!(
                    "station identifier '{}' must not contain separators, ';' or whitespace",
                    self.station_id
                ),
            });
        }
        Ok(())
    }
}

fn default_recipient() -> String {
    DEFAULT_RECIPIENT.to_string()
}

fn default_station_id() -> String {
    DEFAULT_STATION_ID.to_string()
}
