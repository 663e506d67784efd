//! Engine server supervisor
//!
//! Launches `wr22-regex-server` once and waits for it on a dedicated thread.
//! The only thing that crosses back to the owner is the terminal status,
//! sent over a channel when the server is gone. There is no polling, no
//! health check and no restart.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use super::executor::describe_exit;
use super::resolve_program;
use super::result::Failure;
use crate::error::{HostError, HostResult};
use crate::notifications::{Diagnostic, DiagnosticKind, DiagnosticSink};

/// Default server executable name
pub const SERVER_PROGRAM: &str = "wr22-regex-server";

/// How the server session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerExit {
    /// Process ran and exited. `code` is `None` when killed by a signal.
    Exited { code: Option<i32> },
    /// Process never started
    LaunchFailed { reason: String },
    /// Process started but its exit could not be observed
    WaitFailed { reason: String },
}

impl ServerExit {
    pub fn is_success(&self) -> bool {
        matches!(self, ServerExit::Exited { code: Some(0) })
    }
}

/// Observable server state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Running,
    Exited,
}

/// Handle on the supervised server.
///
/// Owned by [`ServerSupervisor`]; callers only borrow it to look at the state.
#[derive(Debug)]
pub struct ServerHandle {
    exit_rx: Receiver<ServerExit>,
    exit: OnceLock<ServerExit>,
}

impl ServerHandle {
    fn settle(&self, exit: ServerExit) -> &ServerExit {
        self.exit.get_or_init(|| exit)
    }

    fn lost() -> ServerExit {
        ServerExit::WaitFailed {
            reason: "supervisor thread ended without reporting".to_string(),
        }
    }

    /// Terminal status if the server is gone, without blocking
    pub fn try_exit(&self) -> Option<&ServerExit> {
        if let Some(exit) = self.exit.get() {
            return Some(exit);
        }
        match self.exit_rx.try_recv() {
            Ok(exit) => Some(self.settle(exit)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.settle(Self::lost())),
        }
    }

    pub fn state(&self) -> ServerState {
        match self.try_exit() {
            Some(_) => ServerState::Exited,
            None => ServerState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == ServerState::Running
    }

    /// Block until the server is gone
    pub fn wait(&self) -> &ServerExit {
        if let Some(exit) = self.exit.get() {
            return exit;
        }
        let exit = self.exit_rx.recv().unwrap_or_else(|_| Self::lost());
        self.settle(exit)
    }

    /// Block until the server is gone or `timeout` elapses
    pub fn wait_timeout(&self, timeout: Duration) -> Option<&ServerExit> {
        if let Some(exit) = self.exit.get() {
            return Some(exit);
        }
        match self.exit_rx.recv_timeout(timeout) {
            Ok(exit) => Some(self.settle(exit)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(self.settle(Self::lost())),
        }
    }
}

/// Supervisor for the engine server.
///
/// At most one server is launched per supervisor; a second `start()` is an
/// error and spawns nothing.
pub struct ServerSupervisor {
    program: String,
    working_directory: Option<PathBuf>,
    sink: Arc<dyn DiagnosticSink>,
    handle: Option<ServerHandle>,
}

impl ServerSupervisor {
    pub fn new(program: impl Into<String>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            program: program.into(),
            working_directory: None,
            sink,
            handle: None,
        }
    }

    /// Set the working directory for the server
    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Launch the server on its own thread and return immediately.
    ///
    /// Launch failures are not returned here: the thread reports them to the
    /// sink and the handle moves to [`ServerState::Exited`].
    pub fn start(&mut self) -> HostResult<&ServerHandle> {
        if self.handle.is_some() {
            return Err(HostError::ServerAlreadyStarted);
        }

        let (exit_tx, exit_rx) = crossbeam_channel::bounded(1);
        let program = self.program.clone();
        let working_directory = self.working_directory.clone();
        let sink = Arc::clone(&self.sink);

        std::thread::Builder::new()
            .name("rwp-server-supervisor".to_string())
            .spawn(move || supervise(&program, working_directory, &*sink, exit_tx))
            .map_err(HostError::SupervisorThread)?;

        tracing::debug!(program = %self.program, "Server supervisor started");
        let handle = self.handle.insert(ServerHandle {
            exit_rx,
            exit: OnceLock::new(),
        });
        Ok(&*handle)
    }

    /// Handle on the server, once started
    pub fn handle(&self) -> Option<&ServerHandle> {
        self.handle.as_ref()
    }
}

impl std::fmt::Debug for ServerSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSupervisor")
            .field("program", &self.program)
            .field("working_directory", &self.working_directory)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

fn supervise(
    program: &str,
    working_directory: Option<PathBuf>,
    sink: &dyn DiagnosticSink,
    exit_tx: Sender<ServerExit>,
) {
    let exit = launch_and_wait(program, working_directory, sink);
    // Nobody may be listening any more; the status was already reported
    let _ = exit_tx.send(exit);
}

fn launch_and_wait(
    program: &str,
    working_directory: Option<PathBuf>,
    sink: &dyn DiagnosticSink,
) -> ServerExit {
    let Some(path) = resolve_program(program) else {
        let reason = Failure::not_found(program).reason;
        sink.report(Diagnostic::new(
            DiagnosticKind::ServerLaunchFailed,
            reason.clone(),
        ));
        return ServerExit::LaunchFailed { reason };
    };

    let mut cmd = std::process::Command::new(&path);
    if let Some(dir) = &working_directory {
        cmd.current_dir(dir);
    }
    // Server output is not a result channel; its stderr goes to ours
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::inherit());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            let reason = Failure::launch(program, e).reason;
            sink.report(Diagnostic::new(
                DiagnosticKind::ServerLaunchFailed,
                reason.clone(),
            ));
            return ServerExit::LaunchFailed { reason };
        }
    };
    tracing::info!(pid = child.id(), program, "Engine server started");

    match child.wait() {
        Ok(status) => {
            if status.success() {
                tracing::info!(program, "Engine server exited");
            } else {
                sink.report(Diagnostic::new(
                    DiagnosticKind::ServerExited,
                    format!("'{}' {}", program, describe_exit(status)),
                ));
            }
            ServerExit::Exited {
                code: status.code(),
            }
        }
        Err(e) => {
            let reason = format!("Failed to wait for '{}': {}", program, e);
            sink.report(Diagnostic::new(
                DiagnosticKind::ServerExited,
                reason.clone(),
            ));
            ServerExit::WaitFailed { reason }
        }
    }
}
