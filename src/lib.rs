//! rwp-host - editor bridge for the wr22 regex inspection engine
//!
//! Two independent pieces live here:
//! - [`host::ServerSupervisor`] launches `wr22-regex-server` once per session
//!   and watches it from a background thread
//! - [`host::CommandExecutor`] runs `wr22-client parse|match|explain` once per
//!   user action and turns its stdout into an [`host::ExecutionResult`]
//!
//! Failures never escape either component. They are reported to a
//! [`notifications::DiagnosticSink`] and folded into a best-effort return value.

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod notifications;

pub use config::Settings;
pub use error::{HostError, HostResult};
pub use host::{
    CancelToken, ClientVerdict, Command, CommandExecutor, ExecutionResult, ExecutorOptions,
    Failure, FailureKind, ServerExit, ServerHandle, ServerState, ServerSupervisor,
};
pub use notifications::{ChannelSink, Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
