//! Callback plugin system for playbook run events.
//!
//! # Architecture
//!
//! 1. **[`PlaybookCallback`]** trait: hooks the engine invokes during a run
//! 2. **[`types`]**: results and statistics handed to the hooks
//! 3. **[`plugins`]**: the built-in [`MailerCallback`]
//! 4. **[`events`]**: recorded hook streams and [`replay`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use rustible_mailer::callback::prelude::*;
//!
//! let mailer = MailerCallback::new(MailerConfig::load(None)?);
//! let events = load_events("run.jsonl")?;
//! replay(&mailer, &events).await?;
//! ```
//!
//! [`PlaybookCallback`]: crate::traits::PlaybookCallback

pub mod events;
pub mod plugins;
pub mod summary;
pub mod types;

pub use events::{load_events, replay, CallbackEvent};
pub use plugins::{MailerCallback, RunStatus};
pub use summary::{FailureEntry, NoteEntry, RunSummary, TaskRecord};
pub use types::{HostSummary, PlaybookStats, TaskOutcome, TaskResult};

/// A boxed callback, as the engine stores them.
pub type BoxedCallback = Box<dyn crate::traits::PlaybookCallback>;

/// A shared callback.
pub type SharedCallback = std::sync::Arc<dyn crate::traits::PlaybookCallback>;

/// Everything needed to write or drive a callback.
pub mod prelude {
    pub use crate::traits::PlaybookCallback;

    pub use super::{
        load_events, replay, BoxedCallback, CallbackEvent, HostSummary, MailerCallback,
        PlaybookStats, RunStatus, RunSummary, SharedCallback, TaskOutcome, TaskResult,
    };

    pub use crate::config::MailerConfig;
    pub use crate::playbook::{Play, Task};

    pub use async_trait::async_trait;
}
