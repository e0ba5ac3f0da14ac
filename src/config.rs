//! Configuration module for the mailer plugin
//!
//! Handles loading configuration from:
//! - Default values
//! - Project configuration (./rustible-mailer.toml)
//! - User configuration (~/.rustible/mailer.toml)
//! - System configuration (/etc/rustible/mailer.toml)
//! - Environment variables
//!
//! The first file found wins; environment variables are applied on top.
//! The admin address and report hostname are not configured here, they
//! come from the play variables `admin_email` and `hostname`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

/// Register name whose stdout is copied into the report.
pub const DEFAULT_NOTE_REGISTER: &str = "admin_email_note";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    /// SMTP relay settings
    pub smtp: SmtpConfig,

    /// Tasks registered under this name contribute a note
    pub note_register: String,

    /// Local part of the sender address (`<sender>@<hostname>`)
    pub sender: String,

    /// Hostname used when the play does not define `hostname`
    pub default_hostname: Option<String>,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            smtp: SmtpConfig::default(),
            note_register: DEFAULT_NOTE_REGISTER.to_string(),
            sender: "noreply".to_string(),
            default_hostname: None,
        }
    }
}

/// SMTP relay settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Relay hostname
    pub host: String,

    /// Relay port
    pub port: u16,

    /// Connect/read/write timeout in seconds
    pub timeout_secs: u64,

    /// AUTH LOGIN username
    pub username: Option<String>,

    /// AUTH LOGIN password
    pub password: Option<String>,

    /// Name announced in EHLO (defaults to the system hostname)
    pub helo_name: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 25,
            timeout_secs: 30,
            username: None,
            password: None,
            helo_name: None,
        }
    }
}

impl SmtpConfig {
    /// Returns the socket timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MailerConfig {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = match Self::get_config_paths(config_path)
            .into_iter()
            .find(|p| p.exists())
        {
            Some(path) => {
                debug!("Loading mailer config from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                if let Some(path) = config_path {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::default()
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = Vec::new();

        // Project config (current directory)
        paths.push(PathBuf::from("rustible-mailer.toml"));

        // User config
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".rustible/mailer.toml"));
        }

        // System-wide config
        paths.push(PathBuf::from("/etc/rustible/mailer.toml"));

        paths
    }

    /// Load from a specific file, picking the format from the extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let parsed = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(&content).map_err(|e| e.to_string()),
            _ => toml::from_str(&content).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| Error::config_parse(path, message))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // RUSTIBLE_MAILER_SMTP_HOST
        if let Ok(host) = std::env::var("RUSTIBLE_MAILER_SMTP_HOST") {
            self.smtp.host = host;
        }

        // RUSTIBLE_MAILER_SMTP_PORT
        if let Ok(port) = std::env::var("RUSTIBLE_MAILER_SMTP_PORT") {
            self.smtp.port = port.parse().map_err(|_| {
                Error::Config(format!("RUSTIBLE_MAILER_SMTP_PORT is not a port: {}", port))
            })?;
        }

        // RUSTIBLE_MAILER_SMTP_TIMEOUT
        if let Ok(timeout) = std::env::var("RUSTIBLE_MAILER_SMTP_TIMEOUT") {
            self.smtp.timeout_secs = timeout.parse().map_err(|_| {
                Error::Config(format!(
                    "RUSTIBLE_MAILER_SMTP_TIMEOUT is not a number of seconds: {}",
                    timeout
                ))
            })?;
        }

        // RUSTIBLE_MAILER_SMTP_USER / RUSTIBLE_MAILER_SMTP_PASSWORD
        if let Ok(user) = std::env::var("RUSTIBLE_MAILER_SMTP_USER") {
            self.smtp.username = Some(user);
        }
        if let Ok(password) = std::env::var("RUSTIBLE_MAILER_SMTP_PASSWORD") {
            self.smtp.password = Some(password);
        }

        // RUSTIBLE_MAILER_NOTE_REGISTER
        if let Ok(register) = std::env::var("RUSTIBLE_MAILER_NOTE_REGISTER") {
            self.note_register = register;
        }

        // RUSTIBLE_MAILER_HOSTNAME
        if let Ok(hostname) = std::env::var("RUSTIBLE_MAILER_HOSTNAME") {
            self.default_hostname = Some(hostname);
        }

        Ok(())
    }

    /// Checks values that would otherwise only fail at send time.
    pub fn validate(&self) -> Result<()> {
        if self.smtp.host.trim().is_empty() {
            return Err(Error::Config("smtp.host must not be empty".to_string()));
        }
        if self.smtp.port == 0 {
            return Err(Error::Config("smtp.port must not be 0".to_string()));
        }
        if self.smtp.timeout_secs == 0 {
            return Err(Error::Config("smtp.timeout_secs must not be 0".to_string()));
        }
        if self.sender.is_empty() || self.sender.contains('@') {
            return Err(Error::Config(format!(
                "sender must be a bare local part, got '{}'",
                self.sender
            )));
        }
        if self.smtp.username.is_some() != self.smtp.password.is_some() {
            return Err(Error::Config(
                "smtp.username and smtp.password must be set together".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MailerConfig::default();
        assert_eq!(config.smtp.host, "localhost");
        assert_eq!(config.smtp.port, 25);
        assert_eq!(config.note_register, "admin_email_note");
        assert_eq!(config.sender, "noreply");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "note_register = \"report_note\"\n\n[smtp]\nhost = \"relay.internal\"\nport = 2525"
        )
        .unwrap();

        let config = MailerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.smtp.host, "relay.internal");
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.smtp.timeout_secs, 30);
        assert_eq!(config.note_register, "report_note");
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "smtp:\n  port: 587\ndefault_hostname: build01").unwrap();

        let config = MailerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.host, "localhost");
        assert_eq!(config.default_hostname.as_deref(), Some("build01"));
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[smtp]\nport = \"twenty-five\"").unwrap();

        let err = MailerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_validate_rejects_half_credentials() {
        let mut config = MailerConfig::default();
        config.smtp.username = Some("mailer".to_string());
        assert!(config.validate().is_err());

        config.smtp.password = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_full_sender_address() {
        let config = MailerConfig {
            sender: "noreply@example.com".to_string(),
            ..MailerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        std::env::set_var("RUSTIBLE_MAILER_SMTP_PORT", "2526");
        std::env::set_var("RUSTIBLE_MAILER_NOTE_REGISTER", "ops_note");
        let mut config = MailerConfig::default();
        let result = config.apply_env_overrides();
        std::env::remove_var("RUSTIBLE_MAILER_SMTP_PORT");
        std::env::remove_var("RUSTIBLE_MAILER_NOTE_REGISTER");

        assert!(result.is_ok());
        assert_eq!(config.smtp.port, 2526);
        assert_eq!(config.note_register, "ops_note");
    }

    #[test]
    #[serial]
    fn test_env_override_rejects_bad_port() {
        std::env::set_var("RUSTIBLE_MAILER_SMTP_PORT", "smtp");
        let mut config = MailerConfig::default();
        let result = config.apply_env_overrides();
        std::env::remove_var("RUSTIBLE_MAILER_SMTP_PORT");

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let path = PathBuf::from("/nonexistent/rustible-mailer.toml");
        assert!(MailerConfig::load(Some(&path)).is_err());
    }
}
