//! `rwp server` and `rwp session`
//!
//! A session mirrors a plugin load: the engine server is started in the
//! background, then each request read from stdin becomes one client call.

use std::io::{BufRead, Write};
use std::sync::Arc;

use rwp_host::host::require_pattern;
use rwp_host::{
    Command, CommandExecutor, DiagnosticSink, ServerExit, ServerSupervisor, Settings,
};
use thiserror::Error;

use super::inspect::{match_loop, print_result};
use super::SessionArgs;

const HELP: &str = "commands: parse <pattern> | explain <pattern> | match <pattern> | quit";

/// The foreground server did not exit cleanly
#[derive(Debug, Error)]
#[error("Engine server stopped: {0:?}")]
pub struct ServerStopped(pub ServerExit);

/// One line of session input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRequest {
    /// A single client call
    Run(Command),
    /// Prompt for candidates against this pattern until a blank line
    MatchLoop(String),
    Help,
    Quit,
    Blank,
    Invalid(String),
}

/// Parse a request line. The pattern is everything after the first space.
pub fn parse_request(line: &str) -> SessionRequest {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() {
        return SessionRequest::Blank;
    }

    let trimmed = line.trim_start();
    let (verb, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));

    let needs_pattern = |make: fn(String) -> SessionRequest| match require_pattern(rest) {
        Ok(pattern) => make(pattern.to_string()),
        Err(e) => SessionRequest::Invalid(format!("{}: {}", verb, e)),
    };

    match verb {
        "parse" => needs_pattern(|p| SessionRequest::Run(Command::parse(p))),
        "explain" => needs_pattern(|p| SessionRequest::Run(Command::explain(p))),
        "match" => needs_pattern(SessionRequest::MatchLoop),
        "help" | "?" => SessionRequest::Help,
        "quit" | "exit" => SessionRequest::Quit,
        other => SessionRequest::Invalid(format!("unknown command '{}'", other)),
    }
}

/// Launch the server and block until it exits
pub fn run_server(settings: &Settings, sink: Arc<dyn DiagnosticSink>) -> anyhow::Result<()> {
    let mut supervisor = supervisor_for(settings, sink);
    let exit = supervisor.start()?.wait().clone();

    if exit.is_success() {
        Ok(())
    } else {
        Err(ServerStopped(exit).into())
    }
}

/// Start the server (unless disabled) and serve requests from `input`
pub fn run_session(
    args: SessionArgs,
    settings: &Settings,
    executor: &CommandExecutor,
    sink: Arc<dyn DiagnosticSink>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut supervisor = supervisor_for(settings, sink);
    if settings.start_server && !args.no_server {
        supervisor.start()?;
    }

    serve_requests(executor, args.json, input, out)?;

    if let Some(handle) = supervisor.handle() {
        match handle.try_exit() {
            None => tracing::info!("Session ended; engine server left running"),
            Some(exit) => tracing::debug!(?exit, "Session ended after engine server"),
        }
    }
    Ok(())
}

/// Read requests until `quit` or EOF. Returns the number of client calls made.
pub fn serve_requests(
    executor: &CommandExecutor,
    json: bool,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let mut calls = 0;
    let mut line = String::new();

    loop {
        write!(out, "rwp> ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        match parse_request(&line) {
            SessionRequest::Run(command) => {
                let result = executor.execute(&command);
                print_result(out, &result, json)?;
                calls += 1;
            }
            SessionRequest::MatchLoop(pattern) => {
                calls += match_loop(&pattern, json, executor, input, out)?;
            }
            SessionRequest::Help => writeln!(out, "{}", HELP)?,
            SessionRequest::Quit => break,
            SessionRequest::Blank => {}
            SessionRequest::Invalid(message) => writeln!(out, "{}", message)?,
        }
    }

    Ok(calls)
}

fn supervisor_for(settings: &Settings, sink: Arc<dyn DiagnosticSink>) -> ServerSupervisor {
    let supervisor = ServerSupervisor::new(settings.server_program.clone(), sink);
    match &settings.working_directory {
        Some(dir) => supervisor.working_directory(dir),
        None => supervisor,
    }
}
