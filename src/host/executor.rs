//! Command Executor
//!
//! Runs the `wr22-client` executable once per command and captures stdout.
//! Stdout is drained on a reader thread while the calling thread waits for
//! the process, so a chatty client can never fill the pipe and wedge.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use super::command::{Command, CLIENT_PROGRAM};
use super::resolve_program;
use super::result::{join_lines, ExecutionResult, Failure};
use crate::notifications::{Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};

/// How often a bounded wait checks the child, the deadline and the cancel flag
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Executor configuration
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Client executable, as a name on PATH or a path
    pub program: String,
    /// Kill the client after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Working directory for the client
    pub working_directory: Option<PathBuf>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            program: CLIENT_PROGRAM.to_string(),
            timeout: None,
            working_directory: None,
        }
    }
}

impl ExecutorOptions {
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Shared flag to abandon an in-flight call
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A client run that reached exit
struct Completed {
    lines: Vec<String>,
    status: ExitStatus,
}

/// Executor for `wr22-client` commands.
///
/// Cheap to clone; clones share the diagnostic sink. Calls are independent:
/// overlapping calls each get their own subprocess and nothing orders them.
#[derive(Clone)]
pub struct CommandExecutor {
    options: ExecutorOptions,
    /// Environment variables to add
    env_additions: HashMap<String, String>,
    sink: Arc<dyn DiagnosticSink>,
}

impl CommandExecutor {
    pub fn new(options: ExecutorOptions, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            options,
            env_additions: HashMap::new(),
            sink,
        }
    }

    /// Executor for the default client that logs diagnostics
    pub fn with_tracing(options: ExecutorOptions) -> Self {
        Self::new(options, Arc::new(TracingSink))
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_additions.insert(key.into(), value.into());
        self
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// `wr22-client parse <pattern>`, returning display text
    pub fn parse(&self, pattern: &str) -> String {
        self.execute(&Command::parse(pattern)).into_text()
    }

    /// `wr22-client match <pattern> <candidate>`, returning display text
    pub fn match_candidate(&self, pattern: &str, candidate: &str) -> String {
        self.execute(&Command::match_candidate(pattern, candidate))
            .into_text()
    }

    /// `wr22-client explain <pattern>`, returning display text
    pub fn explain(&self, pattern: &str) -> String {
        self.execute(&Command::explain(pattern)).into_text()
    }

    /// Run one command and block until the client exits.
    ///
    /// Never fails: launch and IO problems are reported to the sink and come
    /// back as [`ExecutionResult::Failure`]. A non-zero exit is reported too,
    /// but the captured output is still returned.
    pub fn execute(&self, command: &Command) -> ExecutionResult {
        self.execute_inner(command, None)
    }

    /// Like [`execute`](Self::execute), but gives up once `cancel` is set.
    pub fn execute_with_cancel(&self, command: &Command, cancel: &CancelToken) -> ExecutionResult {
        self.execute_inner(command, Some(cancel))
    }

    /// Run a command on the blocking pool
    pub async fn execute_async(&self, command: Command) -> ExecutionResult {
        let executor = self.clone();
        match tokio::task::spawn_blocking(move || executor.execute(&command)).await {
            Ok(result) => result,
            Err(e) => {
                let failure = Failure::io(format!("client task failed: {}", e));
                self.report_failure(&failure);
                ExecutionResult::Failure(failure)
            }
        }
    }

    fn execute_inner(&self, command: &Command, cancel: Option<&CancelToken>) -> ExecutionResult {
        tracing::debug!(argv = ?command.argv(&self.options.program), "Running client command");

        match self.run(command, cancel) {
            Ok(completed) => {
                if !completed.status.success() {
                    self.sink.report(Diagnostic::new(
                        DiagnosticKind::ClientExitCode,
                        format!(
                            "'{} {}' {}",
                            self.options.program,
                            command.subcommand(),
                            describe_exit(completed.status)
                        ),
                    ));
                }
                ExecutionResult::Output(join_lines(&completed.lines))
            }
            Err(failure) => {
                self.report_failure(&failure);
                ExecutionResult::Failure(failure)
            }
        }
    }

    fn report_failure(&self, failure: &Failure) {
        self.sink.report(Diagnostic::new(
            failure.kind.diagnostic_kind(),
            failure.reason.clone(),
        ));
    }

    fn run(&self, command: &Command, cancel: Option<&CancelToken>) -> Result<Completed, Failure> {
        let program = resolve_program(&self.options.program)
            .ok_or_else(|| Failure::not_found(&self.options.program))?;

        let mut cmd = std::process::Command::new(&program);
        cmd.args(command.args());

        if let Some(dir) = &self.options.working_directory {
            cmd.current_dir(dir);
        }
        for (k, v) in &self.env_additions {
            cmd.env(k, v);
        }

        // Stdout is the only result channel
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());

        let mut child = cmd
            .spawn()
            .map_err(|e| Failure::launch(&self.options.program, e))?;
        tracing::debug!(pid = child.id(), "Client started");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Failure::io("Failed to capture stdout"))?;
        let (lines_tx, lines_rx) = crossbeam_channel::bounded(1);
        let reader = std::thread::Builder::new()
            .name("rwp-client-stdout".to_string())
            .spawn(move || {
                let _ = lines_tx.send(drain_lines(stdout));
            });
        if let Err(e) = reader {
            kill_quietly(&mut child);
            return Err(Failure::io(e));
        }

        // On timeout or cancel the reader is left to finish on its own:
        // a grandchild may still hold the pipe open.
        let limits = Limits::new(self.options.timeout, cancel);
        let status = wait_for_exit(&mut child, &limits)?;
        let lines = collect_lines(&lines_rx, &limits)?;

        Ok(Completed { lines, status })
    }
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("options", &self.options)
            .field("env_additions", &self.env_additions)
            .finish_non_exhaustive()
    }
}

/// Read a stream to EOF as lines, tolerating invalid UTF-8 and CRLF endings
fn drain_lines(stream: impl Read) -> std::io::Result<Vec<String>> {
    let mut reader = BufReader::new(stream);
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        lines.push(String::from_utf8_lossy(&buf).into_owned());
    }

    Ok(lines)
}

/// Deadline and cancel flag bounding one call
struct Limits<'a> {
    timeout: Option<(Duration, Instant)>,
    cancel: Option<&'a CancelToken>,
}

impl<'a> Limits<'a> {
    fn new(timeout: Option<Duration>, cancel: Option<&'a CancelToken>) -> Self {
        Self {
            timeout: timeout.map(|t| (t, Instant::now() + t)),
            cancel,
        }
    }

    fn is_unbounded(&self) -> bool {
        self.timeout.is_none() && self.cancel.is_none()
    }

    fn check(&self) -> Result<(), Failure> {
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(Failure::cancelled());
        }
        match self.timeout {
            Some((timeout, deadline)) if Instant::now() >= deadline => {
                Err(Failure::timed_out(timeout))
            }
            _ => Ok(()),
        }
    }

    /// How long to block before the next check
    fn tick(&self) -> Duration {
        match self.timeout {
            Some((_, deadline)) => deadline
                .saturating_duration_since(Instant::now())
                .min(POLL_INTERVAL),
            None => POLL_INTERVAL,
        }
    }
}

fn wait_for_exit(child: &mut Child, limits: &Limits) -> Result<ExitStatus, Failure> {
    if limits.is_unbounded() {
        return child.wait().map_err(Failure::io);
    }

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if let Err(failure) = limits.check() {
                    kill_quietly(child);
                    return Err(failure);
                }
                std::thread::sleep(limits.tick());
            }
            Err(e) => return Err(Failure::io(e)),
        }
    }
}

/// Receive the drained stdout. The limits still apply after the client has
/// exited, since a leftover grandchild can keep the pipe from reaching EOF.
fn collect_lines(
    lines_rx: &Receiver<std::io::Result<Vec<String>>>,
    limits: &Limits,
) -> Result<Vec<String>, Failure> {
    let lost = || Failure::io("stdout reader ended without reporting");

    if limits.is_unbounded() {
        return lines_rx.recv().map_err(|_| lost())?.map_err(Failure::io);
    }

    loop {
        match lines_rx.recv_timeout(limits.tick()) {
            Ok(lines) => return lines.map_err(Failure::io),
            Err(RecvTimeoutError::Timeout) => limits.check()?,
            Err(RecvTimeoutError::Disconnected) => return Err(lost()),
        }
    }
}

fn kill_quietly(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// "exited with code N", or the signal on unix
pub(crate) fn describe_exit(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exited with code {}", code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("terminated by signal {}", signal);
        }
    }

    "exited without a code".to_string()
}
