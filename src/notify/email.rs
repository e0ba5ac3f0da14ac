//! SMTP and dry-run mail transports.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use colored::Colorize;
use tracing::{debug, info, warn};

use super::error::{NotificationError, NotificationResult};
use super::{MailMessage, MailTransport};
use crate::config::SmtpConfig;

/// Delivers reports through an SMTP relay, by default the local MTA.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    config: SmtpConfig,
}

impl SmtpTransport {
    /// Creates a new SMTP transport with the given configuration.
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Returns the relay configuration.
    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    fn name(&self) -> &str {
        "SMTP"
    }

    async fn send(&self, message: &MailMessage) -> NotificationResult<()> {
        let config = self.config.clone();
        let message = message.clone();

        debug!(
            "Submitting mail to {}:{} for {}",
            config.host, config.port, message.to
        );

        tokio::task::spawn_blocking(move || send_smtp_message(&config, &message))
            .await
            .map_err(|e| NotificationError::internal(format!("Failed to spawn mail task: {}", e)))?
    }
}

/// Runs one SMTP transaction (blocking).
fn send_smtp_message(config: &SmtpConfig, message: &MailMessage) -> NotificationResult<()> {
    let timeout = config.timeout();
    let stream = connect(&config.host, config.port, timeout)?;

    stream.set_read_timeout(Some(timeout)).ok();
    stream.set_write_timeout(Some(timeout)).ok();

    let mut smtp = SmtpConnection::new(stream);

    smtp.read_response(220)?;

    let helo_name = config.helo_name.clone().unwrap_or_else(|| {
        hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "localhost".to_string())
    });
    smtp.send_command(&format!("EHLO {}", helo_name))?;
    smtp.read_response(250)?;

    if let (Some(user), Some(pass)) = (&config.username, &config.password) {
        smtp.send_command("AUTH LOGIN")?;
        smtp.read_response(334)?;

        let user_b64 = base64::engine::general_purpose::STANDARD.encode(user);
        smtp.send_command(&user_b64)?;
        smtp.read_response(334)?;

        let pass_b64 = base64::engine::general_purpose::STANDARD.encode(pass);
        smtp.send_command(&pass_b64)?;
        smtp.read_response(235)?;
    }

    smtp.send_command(&format!("MAIL FROM:<{}>", message.from))?;
    smtp.read_response(250)?;

    smtp.send_command(&format!("RCPT TO:<{}>", message.to))?;
    smtp.read_response(250)?;

    smtp.send_command("DATA")?;
    smtp.read_response(354)?;

    let mut payload = message.render();
    payload.push_str(".\r\n");
    smtp.send_data(&payload)?;
    smtp.read_response(250)?;

    info!("Mail accepted by {}:{} for {}", config.host, config.port, message.to);

    // Queued once DATA is accepted; QUIT problems are only logged.
    if let Err(e) = smtp
        .send_command("QUIT")
        .and_then(|()| smtp.read_response(221).map(|_| ()))
    {
        warn!("SMTP QUIT did not complete cleanly: {}", e);
    }

    Ok(())
}

/// Connects to the first reachable address the relay name resolves to.
fn connect(host: &str, port: u16, timeout: Duration) -> NotificationResult<TcpStream> {
    let addr = format!("{}:{}", host, port);
    let candidates: Vec<SocketAddr> = addr
        .to_socket_addrs()
        .map_err(|e| NotificationError::config(format!("Invalid SMTP address '{}': {}", addr, e)))?
        .collect();

    if candidates.is_empty() {
        return Err(NotificationError::config(format!(
            "SMTP address '{}' did not resolve",
            addr
        )));
    }

    let mut last_error = None;
    for candidate in candidates {
        match TcpStream::connect_timeout(&candidate, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("Connection to {} failed: {}", candidate, e);
                last_error = Some(e);
            }
        }
    }

    Err(NotificationError::network(format!(
        "Failed to connect to SMTP server '{}': {}",
        addr,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// Simple SMTP connection wrapper.
struct SmtpConnection {
    stream: TcpStream,
    buffer: Vec<u8>,
}

impl SmtpConnection {
    fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            buffer: vec![0u8; 1024],
        }
    }

    fn send_command(&mut self, command: &str) -> NotificationResult<()> {
        let cmd = format!("{}\r\n", command);
        self.stream.write_all(cmd.as_bytes())?;
        self.stream.flush()?;
        Ok(())
    }

    fn send_data(&mut self, data: &str) -> NotificationResult<()> {
        self.stream.write_all(data.as_bytes())?;
        self.stream.flush()?;
        Ok(())
    }

    fn read_response(&mut self, expected_code: u16) -> NotificationResult<String> {
        let mut response = String::new();

        loop {
            let n = self.stream.read(&mut self.buffer)?;

            if n == 0 {
                return Err(NotificationError::smtp(None, "Connection closed unexpectedly"));
            }

            response.push_str(&String::from_utf8_lossy(&self.buffer[..n]));

            // Multi-line replies use "250-"; the final line uses "250 ".
            if response.ends_with("\r\n") {
                let last_line = response.lines().last().unwrap_or("");
                if last_line.len() == 3 || last_line.as_bytes().get(3) == Some(&b' ') {
                    break;
                }
            }
        }

        let code: u16 = response
            .get(..3)
            .and_then(|c| c.parse().ok())
            .ok_or_else(|| {
                NotificationError::smtp(None, format!("Invalid SMTP response: {}", response.trim_end()))
            })?;

        if code != expected_code {
            return Err(NotificationError::smtp(
                Some(code),
                format!(
                    "expected {}, got: {}",
                    expected_code,
                    response.trim_end()
                ),
            ));
        }

        Ok(response)
    }
}

/// Prints reports to stdout instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct DryRunTransport;

impl DryRunTransport {
    /// Creates a new dry-run transport.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailTransport for DryRunTransport {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn send(&self, message: &MailMessage) -> NotificationResult<()> {
        println!(
            "{} mail for {} not sent",
            "DRY RUN:".yellow().bold(),
            message.to.bright_white()
        );
        println!("{}", message.render().replace("\r\n", "\n"));
        Ok(())
    }
}
