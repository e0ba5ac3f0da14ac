//! The callback contract between the playbook engine and plugins.
//!
//! The engine invokes these hooks sequentially, in the order events happen
//! during a run. Every hook has a no-op default so plugins only implement
//! what they observe.

use async_trait::async_trait;

use crate::callback::types::{PlaybookStats, TaskResult};
use crate::error::Result;
use crate::playbook::{Play, Task};

/// Callback for receiving playbook lifecycle events.
///
/// # Example
///
/// ```rust,ignore
/// use rustible_mailer::prelude::*;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Debug, Default)]
/// struct FailureCounter {
///     failures: AtomicUsize,
/// }
///
/// #[async_trait]
/// impl PlaybookCallback for FailureCounter {
///     async fn on_runner_failed(&self, _result: &TaskResult, _ignore_errors: bool) {
///         self.failures.fetch_add(1, Ordering::SeqCst);
///     }
/// }
/// ```
#[async_trait]
pub trait PlaybookCallback: Send + Sync {
    /// Called when a play starts.
    async fn on_play_start(&self, play: &Play) {
        let _ = play;
    }

    /// Called when a task starts.
    async fn on_task_start(&self, task: &Task) {
        let _ = task;
    }

    /// Called when a handler task starts.
    async fn on_handler_task_start(&self, task: &Task) {
        let _ = task;
    }

    /// Called when a task succeeds on a host.
    async fn on_runner_ok(&self, result: &TaskResult) {
        let _ = result;
    }

    /// Called when a task fails on a host.
    async fn on_runner_failed(&self, result: &TaskResult, ignore_errors: bool) {
        let _ = (result, ignore_errors);
    }

    /// Called when a host cannot be reached.
    async fn on_runner_unreachable(&self, result: &TaskResult) {
        let _ = result;
    }

    /// Called once with the final per-host statistics.
    ///
    /// Errors are returned to the engine, which decides whether they fail
    /// the run.
    async fn on_playbook_stats(&self, stats: &PlaybookStats) -> Result<()> {
        let _ = stats;
        Ok(())
    }
}
