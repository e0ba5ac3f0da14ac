//! Shared test utilities for the rustible-mailer test suite.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use rustible_mailer::callback::MailerCallback;
use rustible_mailer::config::MailerConfig;
use rustible_mailer::notify::{MailMessage, MailTransport, NotificationError, NotificationResult};
use rustible_mailer::playbook::{Play, Task};

// ============================================================================
// Transports
// ============================================================================

/// Transport that keeps every message it is given.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().clone()
    }

    /// Returns the only message sent, panicking otherwise.
    pub fn single(&self) -> MailMessage {
        let sent = self.sent();
        assert_eq!(sent.len(), 1, "expected exactly one message, got {:?}", sent);
        sent.into_iter().next().unwrap()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, message: &MailMessage) -> NotificationResult<()> {
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

/// Transport that always fails like an unreachable relay.
#[derive(Debug, Default)]
pub struct FailingTransport;

#[async_trait]
impl MailTransport for FailingTransport {
    fn name(&self) -> &str {
        "failing"
    }

    async fn send(&self, _message: &MailMessage) -> NotificationResult<()> {
        Err(NotificationError::network("connection refused"))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A mailer with default config wired to a fresh recording transport.
pub fn recording_mailer() -> (MailerCallback, Arc<RecordingTransport>) {
    let transport = RecordingTransport::new();
    let mailer = MailerCallback::with_transport(MailerConfig::default(), transport.clone());
    (mailer, transport)
}

/// The play most tests run: two web hosts, admin and hostname set.
pub fn web_play() -> Play {
    Play::new("webservers")
        .with_hosts(["web1", "web2"])
        .with_var("admin_email", "admin@example.com")
        .with_var("hostname", "deploy01")
}

/// A task registered as the note sentinel.
pub fn note_task(name: &str) -> Task {
    Task::new(name)
        .with_action("command")
        .with_register("admin_email_note")
}

/// Path to a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
