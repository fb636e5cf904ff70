//! Error types shared by the session, schedule and booking layers.

use thiserror::Error;

/// Errors that can occur while talking to the booking API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LisError {
    /// Missing or invalid required input
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Credentials rejected or the session could not be confirmed
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Network/HTTP request failed
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Response body was not the JSON we expected
    #[error("Failed to deserialize {resource}: {message}")]
    Deserialization { resource: String, message: String },

    /// Server answered with a status we cannot work with
    #[error("Unexpected status {status} from {path}")]
    UnexpectedStatus { path: String, status: u16 },

    /// Schedule work attempted with a session that never authenticated
    #[error("Session is not authorised")]
    NotAuthorized,

    /// Booking attempted before the schedule was rendered
    #[error("Schedule has not been rendered yet")]
    NotRendered,

    /// Nothing free matched the requested day and time
    #[error("No available slot on {day} at {time}")]
    NoAvailableSlot { day: String, time: String },

    /// Reference date override is not `YYYY-MM-DD`
    #[error("Invalid date '{value}', expected format YYYY-MM-DD")]
    InvalidDateFormat { value: String },
}

pub type LisResult<T> = Result<T, LisError>;

impl LisError {
    /// Process exit code for this error.
    ///
    /// Anything that stops the run before the booking scan is a setup
    /// failure (1). Only a scan that found nothing to book exits with 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            LisError::NoAvailableSlot { .. } => 2,
            _ => 1,
        }
    }

    pub(crate) fn deserialization(resource: &str, err: serde_json::Error) -> Self {
        LisError::Deserialization {
            resource: resource.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for LisError {
    fn from(err: reqwest::Error) -> Self {
        LisError::Transport {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LisError {
    fn from(err: serde_json::Error) -> Self {
        LisError::Deserialization {
            resource: "response".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for LisError {
    fn from(err: url::ParseError) -> Self {
        LisError::Config {
            message: format!("invalid endpoint: {}", err),
        }
    }
}
