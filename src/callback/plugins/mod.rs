//! Callback plugins.
//!
//! - [`MailerCallback`] - Emails the play's admin a summary of changes,
//!   failures and notes when the run finishes

mod mailer;

pub use mailer::{MailerCallback, RunStatus, UNKNOWN_FAILURE, UNKNOWN_UNREACHABLE};
