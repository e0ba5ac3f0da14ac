//! Error types for mail delivery.

use std::fmt;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors that can occur while delivering a report.
#[derive(Debug)]
pub enum NotificationError {
    /// Configuration error.
    Config(String),

    /// Network/connection error.
    Network(String),

    /// SMTP protocol error.
    Smtp {
        /// Reply code from the server, if one was parsed
        code: Option<u16>,
        /// Error message
        message: String,
    },

    /// Timeout error.
    Timeout(String),

    /// Generic internal error.
    Internal(String),
}

impl NotificationError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates an SMTP error.
    pub fn smtp(code: Option<u16>, message: impl Into<String>) -> Self {
        Self::Smtp {
            code,
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the SMTP reply code carried by this error, if any.
    pub fn smtp_code(&self) -> Option<u16> {
        match self {
            Self::Smtp { code, .. } => *code,
            _ => None,
        }
    }

    /// Returns true if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl fmt::Display for NotificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Smtp { code, message } => {
                if let Some(code) = code {
                    write!(f, "SMTP error ({}): {}", code, message)
                } else {
                    write!(f, "SMTP error: {}", message)
                }
            }
            Self::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for NotificationError {}

impl From<std::io::Error> for NotificationError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                Self::timeout(err.to_string())
            }
            _ => Self::network(err.to_string()),
        }
    }
}
