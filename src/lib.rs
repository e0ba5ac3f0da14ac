//! # rustible-mailer
//!
//! A Rustible callback plugin that emails the host administrator a summary
//! when a playbook run finishes.
//!
//! While the run is in progress the plugin stays silent and records, per
//! host, which tasks changed something or failed. When the engine delivers
//! the final statistics, one plain-text report is sent to the play's
//! `admin_email` with a subject of the form `[hostname] play status`.
//!
//! ```text
//!   engine hooks ──▶ MailerCallback ──▶ RunSummary ──▶ MailMessage ──▶ MailTransport
//!   (or replayed                       (changes,                       (SMTP relay or
//!    event file)                        failures, notes)                dry run)
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use rustible_mailer::prelude::*;
//!
//! let mailer = MailerCallback::new(MailerConfig::load(None)?);
//!
//! mailer.on_play_start(&Play::new("site")
//!     .with_hosts(["web1"])
//!     .with_var("admin_email", "ops@example.com")).await;
//! mailer.on_task_start(&Task::new("Install nginx")).await;
//! mailer.on_runner_ok(&TaskResult::new("web1", Task::new("Install nginx"))
//!     .with("changed", true)).await;
//! mailer.on_playbook_stats(&PlaybookStats::new()).await?;
//! ```

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports for writing and driving callbacks.

    pub use crate::callback::prelude::*;
    pub use crate::error::{Error, Result};
    pub use crate::notify::{MailMessage, MailTransport};
}

/// Error types.
pub mod error;

/// The hook contract between the engine and plugins.
pub mod traits;

/// Play and task values.
pub mod playbook;

/// Plugin configuration.
pub mod config;

/// Callback plugins, hook values and event replay.
pub mod callback;

/// Message rendering and delivery.
pub mod notify;

pub use error::{Error, Result};
