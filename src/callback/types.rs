//! Result and statistics values passed to callback hooks.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::playbook::Task;

/// The outcome of one task on one host, as far as the mailer tracks it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOutcome {
    /// Registered, no interesting result seen yet
    #[default]
    Unset,
    /// Reported a change
    Changed,
    /// Failed or unreachable
    Failed,
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => write!(f, "unset"),
            Self::Changed => write!(f, "changed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The result of running a task on a single host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Host the task ran on
    pub host: String,

    /// The task that produced this result
    pub task: Task,

    /// Raw module return values (`changed`, `stderr`, `msg`, ...)
    #[serde(default)]
    pub result: IndexMap<String, Value>,
}

impl TaskResult {
    /// Creates an empty result for `task` on `host`.
    pub fn new(host: impl Into<String>, task: Task) -> Self {
        Self {
            host: host.into(),
            task,
            result: IndexMap::new(),
        }
    }

    /// Sets a return value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.result.insert(key.into(), value.into());
        self
    }

    /// Returns true if the module reported a change.
    pub fn is_changed(&self) -> bool {
        self.result.get("changed").is_some_and(is_truthy)
    }

    /// Returns a return value rendered as text, skipping null and empty values.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.result.get(key)? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Array(a) if a.is_empty() => None,
            Value::Object(o) if o.is_empty() => None,
            other => Some(other.to_string()),
        }
    }

    /// Returns the first present value among `keys`.
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// Returns captured stdout, preferring `stdout_lines` joined with `\n`.
    pub fn stdout_text(&self) -> String {
        if let Some(Value::Array(lines)) = self.result.get("stdout_lines") {
            return lines
                .iter()
                .map(|line| match line {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n");
        }

        self.result
            .get("stdout")
            .and_then(Value::as_str)
            .map(|s| s.trim_end_matches('\n').to_string())
            .unwrap_or_default()
    }
}

/// Loose truthiness for module return values.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Final per-host counters reported by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSummary {
    /// Tasks completed without changes
    pub ok: u32,
    /// Tasks that made changes
    pub changed: u32,
    /// Tasks that failed
    pub failures: u32,
    /// Unreachable attempts
    pub unreachable: u32,
    /// Tasks that were skipped
    pub skipped: u32,
    /// Failures recovered by a rescue block
    pub rescued: u32,
    /// Failures ignored via `ignore_errors`
    pub ignored: u32,
}

impl HostSummary {
    /// Returns true if the host failed a task or could not be reached.
    pub fn has_failures(&self) -> bool {
        self.failures > 0 || self.unreachable > 0
    }
}

/// Aggregate statistics handed to the final stats hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybookStats {
    /// Per-host summaries, in processing order
    #[serde(default)]
    pub processed: IndexMap<String, HostSummary>,
}

impl PlaybookStats {
    /// Creates empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a host summary.
    pub fn with_host(mut self, host: impl Into<String>, summary: HostSummary) -> Self {
        self.processed.insert(host.into(), summary);
        self
    }

    /// Returns the summary for `host`, zeroed if the host was not processed.
    pub fn summarize(&self, host: &str) -> HostSummary {
        self.processed.get(host).copied().unwrap_or_default()
    }

    /// Returns the processed host names in order.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.processed.keys().map(String::as_str)
    }

    /// Returns true if any processed host failed or was unreachable.
    pub fn has_failures(&self) -> bool {
        self.hosts().any(|host| self.summarize(host).has_failures())
    }
}
