//! Run configuration: what to book, where, and as whom.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LisError, LisResult};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration for the HTTP client behind a session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string
    pub user_agent: String,
    /// Timeout for establishing a connection
    pub connect_timeout: Duration,
    /// Timeout for a whole request
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Login credentials as the sessions endpoint expects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub groupname: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        groupname: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            groupname: groupname.into(),
        }
    }
}

fn default_description() -> String {
    "To Play".to_string()
}

/// Everything a single booking run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub time: String,
    #[serde(default = "default_description")]
    pub description: String,
    /// Reference date override (`YYYY-MM-DD`)
    #[serde(default)]
    pub as_of: Option<String>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            username: String::new(),
            password: String::new(),
            group: String::new(),
            day: String::new(),
            time: String::new(),
            description: default_description(),
            as_of: None,
        }
    }
}

impl BookingConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// Fields missing from the file stay empty and are caught by
    /// [`BookingConfig::validate`].
    pub fn load_from_file(path: &Path) -> LisResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| LisError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        serde_json::from_str(&content).map_err(|e| LisError::Config {
            message: format!("cannot parse {}: {}", path.display(), e),
        })
    }

    /// Checks required fields and returns the parsed endpoint and day.
    pub fn validate(&self) -> LisResult<(Url, Weekday)> {
        let required = [
            ("endpoint", &self.endpoint),
            ("username", &self.username),
            ("password", &self.password),
            ("group", &self.group),
            ("day", &self.day),
            ("time", &self.time),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(LisError::Config {
                    message: format!("missing required value: {}", name),
                });
            }
        }

        let endpoint = Url::parse(&self.endpoint)?;
        let day = self.day.parse::<Weekday>().map_err(|_| LisError::Config {
            message: format!("unknown day '{}'", self.day),
        })?;

        Ok((endpoint, day))
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password, &self.group)
    }
}
