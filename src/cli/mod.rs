//! Command-line host
//!
//! Stands in for the editor: takes a pattern (and candidates) from the
//! command line or stdin and calls into the library the way a plugin would.

pub mod inspect;
pub mod session;

#[cfg(all(test, unix))]
#[allow(dead_code)]
#[path = "../host/test_support.rs"]
mod test_support;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rwp_host::{HostError, HostResult, Settings};

pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    /// A client command or the server failed
    pub const FAILURE: i32 = 1;
    /// Bad input, such as an empty pattern
    pub const USAGE_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const UNEXPECTED_FAILURE: i32 = 4;
}

#[derive(Debug, Parser)]
#[command(
    name = "rwp",
    version,
    about = "Run wr22 regex inspections: parse, match and explain patterns"
)]
pub struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Config file (defaults to <config dir>/rwp/config.toml)
    #[arg(long, global = true, env = "RWP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Client executable to run
    #[arg(long, global = true)]
    pub client: Option<String>,

    /// Engine server executable to launch
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Kill a client call after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check that a pattern parses
    Parse(PatternArgs),
    /// Match a pattern against candidates; prompts on stdin when none is given
    Match(MatchArgs),
    /// Explain a pattern
    Explain(PatternArgs),
    /// Run the engine server in the foreground until it exits
    Server,
    /// Start the engine server and read commands from stdin
    Session(SessionArgs),
}

#[derive(Debug, Args)]
pub struct PatternArgs {
    pub pattern: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct MatchArgs {
    pub pattern: String,

    /// String to match; omit to be prompted until a blank line
    pub candidate: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Do not launch the engine server
    #[arg(long)]
    pub no_server: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Config file, then environment, then flags
    pub fn settings(&self) -> HostResult<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load_from(path)?,
            None => Settings::load()?,
        };
        settings.apply_env()?;
        self.apply_flags(&mut settings);
        Ok(settings)
    }

    fn apply_flags(&self, settings: &mut Settings) {
        if let Some(client) = &self.client {
            settings.client_program = client.clone();
        }
        if let Some(server) = &self.server {
            settings.server_program = server.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.command_timeout_secs = Some(timeout);
        }
    }
}

/// Map a subcommand error to a process exit code
pub fn categorize_error(err: &anyhow::Error) -> i32 {
    if let Some(host) = err.downcast_ref::<HostError>() {
        return match host {
            HostError::EmptyPattern => exit_codes::USAGE_ERROR,
            e if e.is_config() => exit_codes::CONFIG_ERROR,
            _ => exit_codes::UNEXPECTED_FAILURE,
        };
    }
    if err.downcast_ref::<rwp_host::Failure>().is_some() {
        return exit_codes::FAILURE;
    }
    if err.downcast_ref::<session::ServerStopped>().is_some() {
        return exit_codes::FAILURE;
    }
    exit_codes::UNEXPECTED_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rwp_host::{Failure, FailureKind};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_match_without_candidate() {
        let cli = Cli::try_parse_from(["rwp", "match", "a+"]).unwrap();
        match cli.command {
            Commands::Match(args) => {
                assert_eq!(args.pattern, "a+");
                assert!(args.candidate.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::try_parse_from([
            "rwp",
            "--client",
            "/tmp/client",
            "--timeout",
            "9",
            "explain",
            "x",
        ])
        .unwrap();

        let mut settings = Settings::default();
        cli.apply_flags(&mut settings);
        assert_eq!(settings.client_program, "/tmp/client");
        assert_eq!(settings.server_program, "wr22-regex-server");
        assert_eq!(settings.command_timeout_secs, Some(9));
    }

    #[test]
    fn test_categorize_error() {
        let err = anyhow::Error::new(HostError::EmptyPattern);
        assert_eq!(categorize_error(&err), exit_codes::USAGE_ERROR);

        let err = anyhow::Error::new(HostError::invalid_env("K", "v"));
        assert_eq!(categorize_error(&err), exit_codes::CONFIG_ERROR);

        let err = anyhow::Error::new(Failure::new(FailureKind::NotFound, "missing"));
        assert_eq!(categorize_error(&err), exit_codes::FAILURE);

        let err = anyhow::anyhow!("something else");
        assert_eq!(categorize_error(&err), exit_codes::UNEXPECTED_FAILURE);
    }
}
