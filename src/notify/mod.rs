//! # Mail Delivery for the Mailer Plugin
//!
//! This module turns a finished run report into an email and hands it to a
//! [`MailTransport`]. Two transports ship with the crate:
//!
//! - [`SmtpTransport`]: plain SMTP submission to a local relay
//!   (`localhost:25` unless configured otherwise)
//! - [`DryRunTransport`]: prints the rendered message instead of sending it
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rustible_mailer::notify::{MailMessage, MailTransport, SmtpTransport};
//!
//! let transport = SmtpTransport::new(config.smtp.clone());
//! let message = MailMessage::new(
//!     "noreply@web1",
//!     "admin@example.com",
//!     "[web1] site complete",
//!     "# Changes\n\nweb1: Install nginx changed",
//! );
//! transport.send(&message).await?;
//! ```

mod email;
mod error;

pub use email::{DryRunTransport, SmtpTransport};
pub use error::{NotificationError, NotificationResult};

use std::fmt::Write;

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Largest input chunk per encoded-word; keeps each word within 75 characters.
const ENCODED_WORD_CHUNK: usize = 45;

/// A plain-text email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    /// Sender address (bare, without angle brackets)
    pub from: String,
    /// Recipient address (bare, without angle brackets)
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

impl MailMessage {
    /// Creates a new message.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Renders headers and body as an RFC 5322 message with CRLF line endings.
    ///
    /// Body lines starting with `.` are dot-stuffed so the result can be
    /// written verbatim after an SMTP `DATA` command. The terminating
    /// `CRLF.CRLF` is not included.
    pub fn render(&self) -> String {
        let mut message = String::with_capacity(self.body.len() + 512);

        let _ = write!(message, "From: <{}>\r\n", self.from);
        let _ = write!(message, "To: <{}>\r\n", self.to);
        let _ = write!(message, "Subject: {}\r\n", encode_header(&self.subject));
        let _ = write!(
            message,
            "Date: {}\r\n",
            chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S +0000")
        );
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        message.push_str("Content-Transfer-Encoding: 8bit\r\n");
        message.push_str("X-Mailer: Rustible\r\n");
        message.push_str("\r\n");

        for line in self.body.lines() {
            if line.starts_with('.') {
                message.push('.');
            }
            message.push_str(line);
            message.push_str("\r\n");
        }

        message
    }
}

/// Prepares a header value for the wire.
///
/// Line breaks become spaces. Non-ASCII values are written as RFC 2047
/// `=?utf-8?B?...?=` encoded-words, folded onto continuation lines.
fn encode_header(value: &str) -> String {
    let value = value.replace(['\r', '\n'], " ");
    if value.is_ascii() {
        return value;
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in value.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_CHUNK {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk));
    }

    words.join("\r\n ")
}

fn encoded_word(text: &str) -> String {
    format!(
        "=?utf-8?B?{}?=",
        base64::engine::general_purpose::STANDARD.encode(text)
    )
}

/// Trait for mail delivery backends.
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync + std::fmt::Debug {
    /// Returns the name of this transport.
    fn name(&self) -> &str;

    /// Delivers a message.
    async fn send(&self, message: &MailMessage) -> NotificationResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MailMessage {
        MailMessage::new(
            "noreply@web1",
            "admin@example.com",
            "[web1] site complete",
            "# Changes\n\nweb1: Install nginx changed",
        )
    }

    #[test]
    fn test_render_headers() {
        let rendered = sample().render();

        assert!(rendered.starts_with("From: <noreply@web1>\r\n"));
        assert!(rendered.contains("To: <admin@example.com>\r\n"));
        assert!(rendered.contains("Subject: [web1] site complete\r\n"));
        assert!(rendered.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(rendered.contains("\r\n\r\n# Changes\r\n"));
    }

    #[test]
    fn test_render_encodes_non_ascii_subject() {
        let message = MailMessage::new(
            "noreply@web1",
            "admin@example.com",
            "[web1] Déploiement çà complete",
            "body",
        );
        let rendered = message.render();

        let subject = rendered
            .lines()
            .find(|line| line.starts_with("Subject: "))
            .unwrap();
        assert!(subject.is_ascii());

        let encoded = subject
            .trim_start_matches("Subject: =?utf-8?B?")
            .trim_end_matches("?=");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            "[web1] Déploiement çà complete"
        );
    }

    #[test]
    fn test_long_non_ascii_subject_is_folded() {
        let subject = "é".repeat(60);
        let encoded = encode_header(&subject);

        let words: Vec<&str> = encoded.split("\r\n ").collect();
        assert_eq!(words.len(), 3);
        assert!(words.iter().all(|w| w.len() <= 75 && w.starts_with("=?utf-8?B?")));

        let decoded: String = words
            .iter()
            .map(|w| {
                let payload = w.trim_start_matches("=?utf-8?B?").trim_end_matches("?=");
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(payload)
                    .unwrap();
                String::from_utf8(bytes).unwrap()
            })
            .collect();
        assert_eq!(decoded, subject);
    }

    #[test]
    fn test_ascii_subject_line_breaks_are_folded() {
        assert_eq!(encode_header("[web1] site\r\nBcc: x complete"), "[web1] site  Bcc: x complete");
    }

    #[test]
    fn test_render_uses_crlf_only() {
        let rendered = sample().render();
        assert!(!rendered.replace("\r\n", "").contains('\n'));
        assert!(rendered.ends_with("web1: Install nginx changed\r\n"));
    }

    #[test]
    fn test_render_dot_stuffing() {
        let message = MailMessage::new("a@b", "c@d", "s", "first\n.\n..hidden\nlast");
        let rendered = message.render();

        assert!(rendered.contains("\r\nfirst\r\n..\r\n...hidden\r\nlast\r\n"));
    }
}
