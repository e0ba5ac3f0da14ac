//! Run accumulator and report body formatting.
//!
//! A [`RunSummary`] collects everything the final report needs while hooks
//! fire: per-host task outcomes, change descriptions, failures, captured
//! notes and bookkeeping anomalies. [`RunSummary::render_body`] turns it into
//! the plain-text email body:
//!
//! ```text
//! # Changes
//!
//! web1: Install nginx changed
//!
//! # Failures
//!
//! ## db1: Restart postgres failed
//!
//! Job for postgresql.service failed
//!
//! # Notes
//!
//! ## web1: Show backup status stdout
//!
//! last backup: 2024-05-01
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::TaskOutcome;
use crate::playbook::Task;

/// One registered task on one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task description
    pub task: String,
    /// What happened to it so far
    pub outcome: TaskOutcome,
}

/// A failure to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    /// What failed: `host: task`, or the host alone when unreachable
    pub subject: String,
    /// Failure message
    pub message: String,
}

/// Output captured from a note task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntry {
    /// Where the output came from: `host: task`
    pub subject: String,
    /// Captured stdout
    pub output: String,
}

/// Everything accumulated during one playbook run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    outcomes: IndexMap<String, Vec<TaskRecord>>,
    changes: Vec<String>,
    failures: Vec<FailureEntry>,
    notes: Vec<NoteEntry>,
    diagnostics: Vec<String>,
}

impl RunSummary {
    /// Creates an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `task` for `host` with an unset outcome.
    pub fn register_task(&mut self, host: &str, task: &Task) {
        self.outcomes
            .entry(host.to_string())
            .or_default()
            .push(TaskRecord {
                task: task.to_string(),
                outcome: TaskOutcome::Unset,
            });
    }

    /// Sets the outcome of the most recent task registered for `host`.
    ///
    /// Returns false if nothing is registered for the host.
    pub fn mark_latest(&mut self, host: &str, outcome: TaskOutcome) -> bool {
        match self.outcomes.get_mut(host).and_then(|records| records.last_mut()) {
            Some(record) => {
                record.outcome = outcome;
                true
            }
            None => false,
        }
    }

    /// Records a change description.
    pub fn record_change(&mut self, description: impl Into<String>) {
        self.changes.push(description.into());
    }

    /// Records a failure.
    pub fn record_failure(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.failures.push(FailureEntry {
            subject: subject.into(),
            message: message.into(),
        });
    }

    /// Records captured note output.
    pub fn record_note(&mut self, subject: impl Into<String>, output: impl Into<String>) {
        self.notes.push(NoteEntry {
            subject: subject.into(),
            output: output.into(),
        });
    }

    /// Records a bookkeeping anomaly.
    pub fn record_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics.push(message.into());
    }

    /// Returns the task records for `host`, oldest first.
    pub fn outcomes(&self, host: &str) -> &[TaskRecord] {
        self.outcomes.get(host).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the recorded change descriptions.
    pub fn changes(&self) -> &[String] {
        &self.changes
    }

    /// Returns the recorded failures.
    pub fn failures(&self) -> &[FailureEntry] {
        &self.failures
    }

    /// Returns the captured notes.
    pub fn notes(&self) -> &[NoteEntry] {
        &self.notes
    }

    /// Returns the recorded anomalies.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Returns true if any failure was recorded.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Returns true if there is nothing to report.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
            && self.failures.is_empty()
            && self.notes.is_empty()
            && self.diagnostics.is_empty()
    }

    /// Builds the report body. Empty sections are left out.
    pub fn render_body(&self) -> String {
        let mut sections = Vec::with_capacity(4);

        if !self.changes.is_empty() {
            let entries: Vec<String> = self
                .changes
                .iter()
                .map(|change| format!("{} changed", change))
                .collect();
            sections.push(format!("# Changes\n\n{}", entries.join("\n\n")));
        }

        if !self.failures.is_empty() {
            let mut section = String::from("# Failures");
            for failure in &self.failures {
                section.push_str(&format!(
                    "\n\n## {} failed\n\n{}",
                    failure.subject, failure.message
                ));
            }
            sections.push(section);
        }

        if !self.notes.is_empty() {
            let mut section = String::from("# Notes");
            for note in &self.notes {
                section.push_str(&format!("\n\n## {} stdout\n\n{}", note.subject, note.output));
            }
            sections.push(section);
        }

        if !self.diagnostics.is_empty() {
            let mut section = String::from("# Diagnostics");
            for diagnostic in &self.diagnostics {
                section.push_str(&format!("\n\n- {}", diagnostic));
            }
            sections.push(section);
        }

        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_summary_renders_nothing() {
        let summary = RunSummary::new();
        assert!(summary.is_empty());
        assert_eq!(summary.render_body(), "");
    }

    #[test]
    fn test_mark_latest_updates_last_record_only() {
        let mut summary = RunSummary::new();
        summary.register_task("web1", &Task::new("first"));
        summary.register_task("web1", &Task::new("second"));

        assert!(summary.mark_latest("web1", TaskOutcome::Changed));
        assert!(!summary.mark_latest("web2", TaskOutcome::Changed));

        let outcomes = summary.outcomes("web1");
        assert_eq!(outcomes[0].outcome, TaskOutcome::Unset);
        assert_eq!(outcomes[1].task, "second");
        assert_eq!(outcomes[1].outcome, TaskOutcome::Changed);
        assert!(summary.outcomes("web2").is_empty());
    }

    #[test]
    fn test_render_all_sections() {
        let mut summary = RunSummary::new();
        summary.record_change("web1: Install nginx");
        summary.record_change("web2: Install nginx");
        assert_eq!(summary.changes(), ["web1: Install nginx", "web2: Install nginx"]);
        summary.record_failure("db1: Restart postgres", "Job failed");
        summary.record_note("web1: Show backup status", "last backup: today\n3 files");

        let expected = "# Changes\n\n\
                        web1: Install nginx changed\n\n\
                        web2: Install nginx changed\n\n\
                        # Failures\n\n\
                        ## db1: Restart postgres failed\n\n\
                        Job failed\n\n\
                        # Notes\n\n\
                        ## web1: Show backup status stdout\n\n\
                        last backup: today\n3 files";
        assert_eq!(summary.render_body(), expected);
    }

    #[test]
    fn test_render_failures_only() {
        let mut summary = RunSummary::new();
        summary.record_failure("db1", "Host unreachable.");

        assert!(summary.has_failures());
        assert_eq!(
            summary.render_body(),
            "# Failures\n\n## db1 failed\n\nHost unreachable."
        );
    }

    #[test]
    fn test_render_diagnostics() {
        let mut summary = RunSummary::new();
        summary.record_diagnostic("no task registered for host 'web9'");

        assert!(!summary.is_empty());
        assert_eq!(
            summary.render_body(),
            "# Diagnostics\n\n- no task registered for host 'web9'"
        );
    }
}
