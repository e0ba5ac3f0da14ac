//! rustible-mailer - replay a recorded playbook run through the mailer
//!
//! This is the main entry point for the rustible-mailer CLI.

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use cli::{Cli, Commands, ReplayArgs};
use rustible_mailer::callback::{load_events, replay, MailerCallback};
use rustible_mailer::config::MailerConfig;
use rustible_mailer::notify::{DryRunTransport, MailTransport, SmtpTransport};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    init_logging(cli.verbosity(), cli.log_json);
    debug!("rustible-mailer v{}", VERSION);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {:#}", err);

        let code = err
            .downcast_ref::<rustible_mailer::Error>()
            .map_or(1, rustible_mailer::Error::exit_code);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = MailerConfig::load(cli.config.as_ref()).context("failed to load configuration")?;

    let args = match cli.command {
        Commands::Replay(args) => args,
        Commands::Preview(args) => ReplayArgs::from(args),
    };

    execute_replay(config, args).await
}

/// Replay an event file through a mailer built from `config`.
async fn execute_replay(mut config: MailerConfig, args: ReplayArgs) -> Result<()> {
    if let Some(host) = args.smtp_host {
        config.smtp.host = host;
    }
    if let Some(port) = args.smtp_port {
        config.smtp.port = port;
    }
    config.validate()?;

    let events = load_events(&args.events)?;

    let transport: Arc<dyn MailTransport> = if args.dry_run {
        Arc::new(DryRunTransport::new())
    } else {
        Arc::new(SmtpTransport::new(config.smtp.clone()))
    };
    debug!("Using {} transport", transport.name());

    let mailer = MailerCallback::with_transport(config, transport);
    replay(&mailer, &events).await?;

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(verbosity >= 3)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
