//! Mailer callback plugin for Rustible.
//!
//! Emails the host administrator a summary when a playbook run finishes.
//! Nothing is printed while the run is in progress; results are collected
//! and a single plain-text report is sent from the final stats hook.
//!
//! # Play variables
//!
//! - `admin_email`: recipient of the report (required once there is
//!   something to report)
//! - `hostname`: used in the subject and sender address
//!
//! # Notes
//!
//! A changed task registered as `admin_email_note` (configurable through
//! [`MailerConfig::note_register`]) has its stdout copied into the report.
//!
//! # Example Report
//!
//! ```text
//! Subject: [web1] site failed
//! From: <noreply@web1>
//!
//! # Changes
//!
//! web1: Install nginx changed
//!
//! # Failures
//!
//! ## web1: Start nginx failed
//!
//! Job for nginx.service failed because the control process exited
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::callback::summary::RunSummary;
use crate::callback::types::{PlaybookStats, TaskOutcome, TaskResult};
use crate::config::MailerConfig;
use crate::error::{Error, Result};
use crate::notify::{MailMessage, MailTransport, SmtpTransport};
use crate::playbook::{Play, Task};
use crate::traits::PlaybookCallback;

/// Message used when a failed result carries no usable detail.
pub const UNKNOWN_FAILURE: &str = "Unknown task failure reason.";

/// Message used when an unreachable result carries no usable detail.
pub const UNKNOWN_UNREACHABLE: &str = "Host unreachable.";

/// Overall status of a finished run, as shown in the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// No host failed or was unreachable
    Complete,
    /// At least one host failed or was unreachable
    Failed,
}

impl RunStatus {
    /// Derives the status from the final stats.
    pub fn from_stats(stats: &PlaybookStats) -> Self {
        if stats.has_failures() {
            Self::Failed
        } else {
            Self::Complete
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Mutable state for one run.
#[derive(Debug, Default)]
struct MailerState {
    /// Play currently executing
    play: Option<Play>,
    /// Accumulated report content
    summary: RunSummary,
    /// Set once the stats hook has concluded the run
    finished: bool,
}

/// Callback plugin that mails a run summary to the play's admin.
///
/// One instance covers one playbook run. Clones share state.
///
/// # Usage
///
/// ```rust,ignore
/// use rustible_mailer::callback::plugins::MailerCallback;
///
/// let callback = MailerCallback::new(MailerConfig::load(None)?);
/// executor.with_callback(Box::new(callback));
/// ```
#[derive(Debug, Clone)]
pub struct MailerCallback {
    config: Arc<MailerConfig>,
    transport: Arc<dyn MailTransport>,
    state: Arc<RwLock<MailerState>>,
}

impl MailerCallback {
    /// Creates a mailer that delivers through the configured SMTP relay.
    #[must_use]
    pub fn new(config: MailerConfig) -> Self {
        let transport = Arc::new(SmtpTransport::new(config.smtp.clone()));
        Self::with_transport(config, transport)
    }

    /// Creates a mailer that delivers through `transport`.
    #[must_use]
    pub fn with_transport(config: MailerConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            state: Arc::new(RwLock::new(MailerState::default())),
        }
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &MailerConfig {
        &self.config
    }

    /// Returns a snapshot of the accumulated summary.
    pub fn summary(&self) -> RunSummary {
        self.state.read().summary.clone()
    }

    /// Returns the name of the current play, if one has started.
    pub fn current_play(&self) -> Option<String> {
        self.state.read().play.as_ref().map(|p| p.name.clone())
    }

    /// Returns true once the final stats hook has run.
    pub fn is_finished(&self) -> bool {
        self.state.read().finished
    }

    /// Registers `task` for every host of the current play.
    fn register_task(&self, task: &Task, kind: &str) {
        let mut state = self.state.write();
        let MailerState { play, summary, .. } = &mut *state;

        let Some(play) = play.as_ref() else {
            warn!("{} '{}' started before any play; not tracked", kind, task);
            return;
        };

        debug!(
            "Registering {} '{}' for {} host(s)",
            kind,
            task,
            play.hosts.len()
        );
        for host in &play.hosts {
            summary.register_task(host, task);
        }
    }

    /// Marks the latest task for the result's host, recording an anomaly if
    /// nothing was registered for it.
    fn mark(summary: &mut RunSummary, result: &TaskResult, outcome: TaskOutcome) {
        if !summary.mark_latest(&result.host, outcome) {
            warn!(
                "No task registered for host '{}' when '{}' reported {}",
                result.host, result.task, outcome
            );
            summary.record_diagnostic(format!(
                "No task was registered for host '{}' when '{}' reported {}.",
                result.host, result.task, outcome
            ));
        }
    }

    /// Resolves the hostname shown in the subject and sender address.
    fn report_hostname(&self, play: &Play) -> String {
        if let Some(hostname) = play.hostname() {
            return hostname.to_string();
        }
        if let Some(hostname) = &self.config.default_hostname {
            return hostname.clone();
        }
        hostname::get()
            .ok()
            .map(|h| h.to_string_lossy().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Builds the report for `play`.
    ///
    /// Fails if the play does not name an admin, or if the admin address or
    /// hostname contains a line break. Line breaks in the play name are
    /// folded to spaces.
    pub fn compose(&self, play: &Play, status: RunStatus, body: String) -> Result<MailMessage> {
        let admin_email = play
            .admin_email()
            .ok_or_else(|| Error::missing_admin_email(&play.name))?;
        let admin_email = single_line("admin_email", admin_email)?;
        let hostname = self.report_hostname(play);
        let hostname = single_line("hostname", &hostname)?;
        let play_name = play.name.replace(['\r', '\n'], " ");

        Ok(MailMessage::new(
            format!("{}@{}", self.config.sender, hostname),
            admin_email,
            format!("[{}] {} {}", hostname, play_name, status),
            body,
        ))
    }
}

/// Rejects values that would split a header or SMTP command line.
fn single_line<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    if value.contains(['\r', '\n']) {
        warn!("Refusing to send report: '{}' contains a line break", name);
        return Err(Error::invalid_header_value(name));
    }
    Ok(value)
}

#[async_trait]
impl PlaybookCallback for MailerCallback {
    async fn on_play_start(&self, play: &Play) {
        debug!("Play '{}' started on {} host(s)", play.name, play.hosts.len());
        let mut state = self.state.write();
        state.play = Some(play.clone());
    }

    async fn on_task_start(&self, task: &Task) {
        self.register_task(task, "Task");
    }

    async fn on_handler_task_start(&self, task: &Task) {
        self.register_task(task, "Handler");
    }

    async fn on_runner_ok(&self, result: &TaskResult) {
        if !result.is_changed() {
            return;
        }

        let mut state = self.state.write();
        let summary = &mut state.summary;

        Self::mark(summary, result, TaskOutcome::Changed);
        summary.record_change(format!("{}: {}", result.host, result.task));

        if result.task.is_registered_as(&self.config.note_register) {
            debug!("Capturing note from '{}' on {}", result.task, result.host);
            summary.record_note(
                format!("{}: {}", result.host, result.task),
                result.stdout_text(),
            );
        }
    }

    async fn on_runner_failed(&self, result: &TaskResult, ignore_errors: bool) {
        if ignore_errors {
            debug!(
                "'{}' failed on {} with ignore_errors set; reporting anyway",
                result.task, result.host
            );
        }

        let message = result
            .first_text(&["stderr", "msg", "failure"])
            .unwrap_or_else(|| UNKNOWN_FAILURE.to_string());

        let mut state = self.state.write();
        let summary = &mut state.summary;

        Self::mark(summary, result, TaskOutcome::Failed);
        summary.record_failure(format!("{}: {}", result.host, result.task), message);
    }

    async fn on_runner_unreachable(&self, result: &TaskResult) {
        let message = result
            .first_text(&["msg", "stderr"])
            .unwrap_or_else(|| UNKNOWN_UNREACHABLE.to_string());

        let mut state = self.state.write();
        let summary = &mut state.summary;

        Self::mark(summary, result, TaskOutcome::Failed);
        summary.record_failure(result.host.clone(), message);
    }

    async fn on_playbook_stats(&self, stats: &PlaybookStats) -> Result<()> {
        let (play, body) = {
            let mut state = self.state.write();

            if state.finished {
                warn!("Playbook stats received again after the report was handled; ignoring");
                return Ok(());
            }
            state.finished = true;

            let body = state.summary.render_body();
            if body.is_empty() && !state.summary.has_failures() {
                info!("No change");
                return Ok(());
            }

            (state.play.clone(), body)
        };

        let play = play.ok_or(Error::NoActivePlay)?;
        let status = RunStatus::from_stats(stats);
        let message = self.compose(&play, status, body)?;

        info!(
            "Sending {} report for '{}' to {} via {}",
            status,
            play.name,
            message.to,
            self.transport.name()
        );
        self.transport.send(&message).await?;

        Ok(())
    }
}
