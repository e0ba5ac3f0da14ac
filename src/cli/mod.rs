//! CLI module for rustible-mailer
//!
//! Drives the mailer from a recorded hook stream, either sending the report
//! or printing it.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// rustible-mailer - Email the admin a summary of a playbook run
#[derive(Parser, Debug, Clone)]
#[command(name = "rustible-mailer")]
#[command(author = "Rustible Contributors")]
#[command(version)]
#[command(about = "Email the admin a summary of a playbook run", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "RUSTIBLE_MAILER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Replay recorded events through the mailer and send the report
    Replay(ReplayArgs),

    /// Replay recorded events and print the report instead of sending it
    Preview(PreviewArgs),
}

/// Arguments for `replay`
#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Event file (.json, .jsonl, .yml or .yaml)
    pub events: PathBuf,

    /// Print the message instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Override the SMTP relay host
    #[arg(long)]
    pub smtp_host: Option<String>,

    /// Override the SMTP relay port
    #[arg(long)]
    pub smtp_port: Option<u16>,
}

/// Arguments for `preview`
#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    /// Event file (.json, .jsonl, .yml or .yaml)
    pub events: PathBuf,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

impl From<PreviewArgs> for ReplayArgs {
    fn from(args: PreviewArgs) -> Self {
        Self {
            events: args.events,
            dry_run: true,
            smtp_host: None,
            smtp_port: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_replay_args() {
        let cli = Cli::try_parse_from([
            "rustible-mailer",
            "-vv",
            "replay",
            "run.jsonl",
            "--smtp-host",
            "mail.internal",
            "--smtp-port",
            "2525",
        ])
        .unwrap();

        assert_eq!(cli.verbosity(), 2);
        match cli.command {
            Commands::Replay(args) => {
                assert_eq!(args.events, PathBuf::from("run.jsonl"));
                assert!(!args.dry_run);
                assert_eq!(args.smtp_host.as_deref(), Some("mail.internal"));
                assert_eq!(args.smtp_port, Some(2525));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_preview_is_a_dry_run() {
        let cli = Cli::try_parse_from(["rustible-mailer", "preview", "run.yml"]).unwrap();
        let Commands::Preview(args) = cli.command else {
            panic!("expected preview");
        };
        let replay = ReplayArgs::from(args);
        assert!(replay.dry_run);
        assert_eq!(replay.events, PathBuf::from("run.yml"));
    }
}
