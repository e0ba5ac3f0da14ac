//! Error types for the mailer plugin.
//!
//! Hook-level problems that must reach the engine (a play without an
//! `admin_email`, a failed SMTP submission) surface through [`Error`].
//! Bookkeeping anomalies are not errors; they are folded into the report.

use std::path::PathBuf;
use thiserror::Error;

use crate::notify::NotificationError;

/// Result type alias for mailer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the mailer plugin.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Notification Errors
    // ========================================================================
    /// The play has no usable `admin_email` variable.
    #[error("No admin email configured for play '{play}'")]
    MissingAdminEmail {
        /// Name of the play that was being reported
        play: String,
    },

    /// A play variable that ends up in a header or SMTP command holds a line break.
    #[error("Play variable '{name}' contains a line break and cannot be used in mail headers")]
    InvalidHeaderValue {
        /// Variable name (`admin_email` or `hostname`)
        name: String,
    },

    /// Stats arrived with something to report but no play was ever started.
    #[error("Cannot send report: no play has started")]
    NoActivePlay,

    /// The mail transport failed.
    #[error(transparent)]
    Notification(#[from] NotificationError),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to parse a configuration file.
    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParse {
        /// Path to the configuration file
        path: PathBuf,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Replay Errors
    // ========================================================================
    /// Failed to parse a recorded event stream.
    #[error("Failed to parse events from '{path}': {message}")]
    EventParse {
        /// Path to the event file
        path: PathBuf,
        /// Error message
        message: String,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a new missing admin email error.
    pub fn missing_admin_email(play: impl Into<String>) -> Self {
        Self::MissingAdminEmail { play: play.into() }
    }

    /// Creates a new invalid header value error.
    pub fn invalid_header_value(name: impl Into<String>) -> Self {
        Self::InvalidHeaderValue { name: name.into() }
    }

    /// Creates a new config parse error.
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new event parse error.
    pub fn event_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::EventParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::MissingAdminEmail { .. }
            | Error::InvalidHeaderValue { .. }
            | Error::NoActivePlay => 2,
            Error::Notification(_) => 3,
            Error::Config(_) | Error::ConfigParse { .. } => 4,
            Error::EventParse { .. } => 5,
            Error::Io(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::missing_admin_email("site");
        assert_eq!(err.to_string(), "No admin email configured for play 'site'");

        let err = Error::event_parse("run.jsonl", "line 3: missing field `event`");
        assert_eq!(
            err.to_string(),
            "Failed to parse events from 'run.jsonl': line 3: missing field `event`"
        );
    }

    #[test]
    fn test_notification_error_is_transparent() {
        let err: Error = NotificationError::smtp(Some(550), "mailbox unavailable").into();
        assert_eq!(err.to_string(), "SMTP error (550): mailbox unavailable");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::NoActivePlay.exit_code(), 2);
        assert_eq!(Error::invalid_header_value("hostname").exit_code(), 2);
        assert_eq!(Error::Config("bad port".into()).exit_code(), 4);
        assert_eq!(
            Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom")).exit_code(),
            1
        );
    }
}
