//! Client configuration from the environment and command line
//!
//! Settings are read from environment variables; command-line flags override
//! them. Nothing has a hidden default except the endpoint and timeout.
//!
//! | variable              | flag           | required |
//! |-----------------------|----------------|----------|
//! | `SHEETS_URI`          | `--uri`        | no       |
//! | `SHEETS_TOKEN`        | `--token`      | yes      |
//! | `SHEETS_WORKBOOK_ID`  | `--workbookId` | yes      |
//! | `SHEETS_TIMEOUT_SECS` | `--timeout`    | no       |

use crate::sheets::{Result, SheetsError};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

pub const ENV_URI: &str = "SHEETS_URI";
pub const ENV_TOKEN: &str = "SHEETS_TOKEN";
pub const ENV_WORKBOOK_ID: &str = "SHEETS_WORKBOOK_ID";
pub const ENV_TIMEOUT_SECS: &str = "SHEETS_TIMEOUT_SECS";

/// Public Sheets v4 endpoint
pub const DEFAULT_ENDPOINT: &str = "https://sheets.googleapis.com/v4/";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Command-line flags and the variable each one overrides
const FLAGS: [(&str, &str); 4] = [
    ("--uri", ENV_URI),
    ("--token", ENV_TOKEN),
    ("--workbookId", ENV_WORKBOOK_ID),
    ("--timeout", ENV_TIMEOUT_SECS),
];

#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the API, with or without trailing slash
    pub endpoint: String,

    /// Bearer token, obtained out-of-band
    pub token: String,

    /// Opaque workbook ID
    pub workbook_id: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    /// Load from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from environment variables, letting `args` (as from
    /// `std::env::args()`) override them
    pub fn from_args_and_env(args: &[String]) -> Result<Self> {
        let overrides = parse_args(args);
        Self::from_lookup(|name| {
            overrides
                .get(name)
                .cloned()
                .or_else(|| std::env::var(name).ok())
        })
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let endpoint = get(ENV_URI).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(SheetsError::Config(format!(
                "{} must be an http(s) URL, got '{}'",
                ENV_URI, endpoint
            )));
        }

        let token = get(ENV_TOKEN)
            .ok_or_else(|| SheetsError::Config(format!("{} environment variable not set", ENV_TOKEN)))?;

        let workbook_id = get(ENV_WORKBOOK_ID).ok_or_else(|| {
            SheetsError::Config(format!("{} environment variable not set", ENV_WORKBOOK_ID))
        })?;

        let timeout = match get(ENV_TIMEOUT_SECS) {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(SheetsError::Config(format!(
                        "{} must be a positive number of seconds, got '{}'",
                        ENV_TIMEOUT_SECS, raw
                    )))
                }
            },
        };

        Ok(ClientConfig {
            endpoint,
            token,
            workbook_id: workbook_id.trim().to_string(),
            timeout,
        })
    }

    /// First characters of the token, for display
    pub fn token_preview(&self) -> String {
        let head: String = self.token.chars().take(8).collect();
        if self.token.chars().count() > 8 {
            format!("{}...***", head)
        } else {
            head
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token_preview())
            .field("workbook_id", &self.workbook_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Collect `--flag value` pairs, keyed by the variable they override
fn parse_args(args: &[String]) -> HashMap<&'static str, String> {
    let mut overrides = HashMap::new();
    let mut i = 1;
    while i < args.len() {
        let flag = FLAGS.iter().find(|(flag, _)| *flag == args[i]);
        match flag {
            Some((_, var)) if i + 1 < args.len() => {
                overrides.insert(*var, args[i + 1].clone());
                i += 2;
            }
            _ => i += 1,
        }
    }
    overrides
}
