//! Recorded hook streams.
//!
//! A run can be captured as a list of [`CallbackEvent`]s and fed back through
//! any [`PlaybookCallback`] with [`replay`]. The CLI uses this to drive the
//! mailer from a file.
//!
//! # Formats
//!
//! - `.json`: an array of events
//! - `.jsonl`: one event per line, blank lines skipped
//! - `.yml` / `.yaml`: a sequence of events
//!
//! ```yaml
//! - event: play_start
//!   play:
//!     name: site
//!     hosts: [web1]
//!     vars: { admin_email: ops@example.com }
//! - event: task_start
//!   task: { name: Install nginx }
//! - event: runner_ok
//!   result:
//!     host: web1
//!     task: { name: Install nginx }
//!     result: { changed: true }
//! - event: playbook_stats
//!   stats:
//!     processed: { web1: { ok: 1, changed: 1 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::types::{PlaybookStats, TaskResult};
use crate::error::{Error, Result};
use crate::playbook::{Play, Task};
use crate::traits::PlaybookCallback;

/// One hook invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CallbackEvent {
    /// A play started
    PlayStart { play: Play },
    /// A task started
    TaskStart { task: Task },
    /// A handler started
    HandlerTaskStart { task: Task },
    /// A task succeeded on a host
    RunnerOk { result: TaskResult },
    /// A task failed on a host
    RunnerFailed {
        result: TaskResult,
        #[serde(default)]
        ignore_errors: bool,
    },
    /// A host was unreachable
    RunnerUnreachable { result: TaskResult },
    /// Final statistics
    PlaybookStats {
        #[serde(default)]
        stats: PlaybookStats,
    },
}

impl CallbackEvent {
    /// Returns the hook name, as used in the `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayStart { .. } => "play_start",
            Self::TaskStart { .. } => "task_start",
            Self::HandlerTaskStart { .. } => "handler_task_start",
            Self::RunnerOk { .. } => "runner_ok",
            Self::RunnerFailed { .. } => "runner_failed",
            Self::RunnerUnreachable { .. } => "runner_unreachable",
            Self::PlaybookStats { .. } => "playbook_stats",
        }
    }

    /// Delivers this event to `callback`.
    pub async fn dispatch(&self, callback: &dyn PlaybookCallback) -> Result<()> {
        match self {
            Self::PlayStart { play } => callback.on_play_start(play).await,
            Self::TaskStart { task } => callback.on_task_start(task).await,
            Self::HandlerTaskStart { task } => callback.on_handler_task_start(task).await,
            Self::RunnerOk { result } => callback.on_runner_ok(result).await,
            Self::RunnerFailed {
                result,
                ignore_errors,
            } => callback.on_runner_failed(result, *ignore_errors).await,
            Self::RunnerUnreachable { result } => callback.on_runner_unreachable(result).await,
            Self::PlaybookStats { stats } => return callback.on_playbook_stats(stats).await,
        }
        Ok(())
    }
}

/// Loads events from a file, choosing the format by extension.
pub fn load_events(path: impl AsRef<Path>) -> Result<Vec<CallbackEvent>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let events = match extension.as_str() {
        "json" => serde_json::from_str(&content)
            .map_err(|e| Error::event_parse(path, e.to_string()))?,
        "jsonl" => parse_json_lines(path, &content)?,
        "yml" | "yaml" => serde_yaml::from_str(&content)
            .map_err(|e| Error::event_parse(path, e.to_string()))?,
        other => {
            return Err(Error::event_parse(
                path,
                format!("unsupported extension '{}'", other),
            ))
        }
    };

    debug!("Loaded {} event(s) from {}", events.len(), path.display());
    Ok(events)
}

fn parse_json_lines(path: &Path, content: &str) -> Result<Vec<CallbackEvent>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|e| Error::event_parse(path, format!("line {}: {}", index + 1, e)))
        })
        .collect()
}

/// Feeds `events` to `callback` in order, stopping at the first error.
pub async fn replay(callback: &dyn PlaybookCallback, events: &[CallbackEvent]) -> Result<()> {
    for event in events {
        trace!("Replaying {}", event.name());
        event.dispatch(callback).await?;
    }
    Ok(())
}
