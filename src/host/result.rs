//! Execution results
//!
//! A client call ends in captured text or a [`Failure`]. Non-zero exit codes
//! do not produce a `Failure`; they are reported as diagnostics and the
//! captured text is still returned.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::notifications::DiagnosticKind;

/// Outcome of one client invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionResult {
    /// Stdout lines joined by single spaces
    Output(String),
    /// The client could not be run to completion
    Failure(Failure),
}

/// Why a client call produced no output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Executable not found
    NotFound,
    /// Spawning the process failed
    Launch,
    /// Reading output or waiting for exit failed
    Io,
    /// Ran past the configured timeout and was killed
    TimedOut,
    /// Cancelled by the caller and killed
    Cancelled,
}

impl FailureKind {
    pub fn diagnostic_kind(&self) -> DiagnosticKind {
        match self {
            FailureKind::NotFound | FailureKind::Launch | FailureKind::Io => {
                DiagnosticKind::ClientLaunchFailed
            }
            FailureKind::TimedOut => DiagnosticKind::ClientTimedOut,
            FailureKind::Cancelled => DiagnosticKind::ClientCancelled,
        }
    }
}

/// Failure description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub reason: String,
}

impl Failure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn not_found(program: &str) -> Self {
        Self::new(
            FailureKind::NotFound,
            format!("Binary '{}' not found. Install it or add to PATH.", program),
        )
    }

    pub fn launch(program: &str, err: std::io::Error) -> Self {
        Self::new(
            FailureKind::Launch,
            format!("Failed to launch '{}': {}", program, err),
        )
    }

    pub fn io(err: impl fmt::Display) -> Self {
        Self::new(FailureKind::Io, format!("IO error: {}", err))
    }

    pub fn timed_out(timeout: Duration) -> Self {
        Self::new(
            FailureKind::TimedOut,
            format!("Command timed out after {} ms", timeout.as_millis()),
        )
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "Command cancelled")
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for Failure {}

/// How the client summarized its own result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientVerdict {
    /// `OK`
    Ok,
    /// `Parse error: <hint>`
    ParseError(String),
    /// `Service error: <text>`; the client reached the server but it refused
    ServiceError(String),
    /// Anything else the client printed
    Other(String),
    /// Client ran and printed nothing
    Empty,
    /// Client did not run to completion
    Unavailable,
}

const OK_LINE: &str = "OK";
const PARSE_ERROR_PREFIX: &str = "Parse error:";
const SERVICE_ERROR_PREFIX: &str = "Service error:";

impl ExecutionResult {
    /// Build an `Output` from drained stdout lines
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ExecutionResult::Output(join_lines(lines))
    }

    /// Text to show the user; empty for failures
    pub fn display_text(&self) -> &str {
        match self {
            ExecutionResult::Output(text) => text,
            ExecutionResult::Failure(_) => "",
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ExecutionResult::Output(text) => text,
            ExecutionResult::Failure(_) => String::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionResult::Failure(_))
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            ExecutionResult::Failure(failure) => Some(failure),
            ExecutionResult::Output(_) => None,
        }
    }

    /// Classify the client's summary line
    pub fn verdict(&self) -> ClientVerdict {
        let text = match self {
            ExecutionResult::Failure(_) => return ClientVerdict::Unavailable,
            ExecutionResult::Output(text) => text.trim(),
        };

        if text.is_empty() {
            return ClientVerdict::Empty;
        }
        if text == OK_LINE || text.starts_with("OK ") {
            return ClientVerdict::Ok;
        }
        if let Some(rest) = text.strip_prefix(PARSE_ERROR_PREFIX) {
            return ClientVerdict::ParseError(rest.trim().to_string());
        }
        if let Some(rest) = text.strip_prefix(SERVICE_ERROR_PREFIX) {
            return ClientVerdict::ServiceError(rest.trim().to_string());
        }
        ClientVerdict::Other(text.to_string())
    }
}

/// Join lines with a single space, keeping their order
pub fn join_lines<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, line) in lines.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(line.as_ref());
    }
    out
}
