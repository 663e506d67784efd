//! User-visible diagnostics
//!
//! The supervisor and executor report failures here instead of showing
//! dialogs themselves. A host picks the sink: [`TracingSink`] writes them to
//! the log, [`ChannelSink`] hands them to whoever owns the receiver (a UI
//! thread, or a test).

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

/// Diagnostic types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Engine server could not be launched
    ServerLaunchFailed,
    /// Engine server exited with a non-zero code
    ServerExited,
    /// Client executable could not be launched or read
    ClientLaunchFailed,
    /// Client executable exited with a non-zero code
    ClientExitCode,
    /// Client executable ran past the configured timeout
    ClientTimedOut,
    /// Client call was cancelled by the caller
    ClientCancelled,
}

impl DiagnosticKind {
    pub fn title(&self) -> &'static str {
        match self {
            DiagnosticKind::ServerLaunchFailed => "Regex server failed to start",
            DiagnosticKind::ServerExited => "Regex server stopped",
            DiagnosticKind::ClientLaunchFailed => "Regex client failed",
            DiagnosticKind::ClientExitCode => "Regex client error",
            DiagnosticKind::ClientTimedOut => "Regex client timed out",
            DiagnosticKind::ClientCancelled => "Regex client cancelled",
        }
    }

    /// Whether this concerns the long-lived server rather than a single command
    pub fn is_server(&self) -> bool {
        matches!(
            self,
            DiagnosticKind::ServerLaunchFailed | DiagnosticKind::ServerExited
        )
    }
}

/// A single user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.title(), self.message)
    }
}

/// Receiver of diagnostics.
///
/// Implementations must not block for long; reports happen on the caller's
/// thread and on the supervisor thread.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Arc<S> {
    fn report(&self, diagnostic: Diagnostic) {
        (**self).report(diagnostic)
    }
}

/// Sink that logs every diagnostic through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::ServerLaunchFailed | DiagnosticKind::ClientLaunchFailed => {
                tracing::error!(kind = ?diagnostic.kind, "{}", diagnostic);
            }
            _ => tracing::warn!(kind = ?diagnostic.kind, "{}", diagnostic),
        }
    }
}

/// Sink that forwards diagnostics over a channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Diagnostic>,
}

impl ChannelSink {
    /// Create a sink with an unbounded channel, returning the receiving end
    pub fn new() -> (Self, Receiver<Diagnostic>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl DiagnosticSink for ChannelSink {
    fn report(&self, diagnostic: Diagnostic) {
        if let Err(e) = self.tx.send(diagnostic) {
            // Receiver is gone; keep the message in the log at least
            tracing::debug!("Diagnostic dropped: {}", e.into_inner());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(DiagnosticKind::ClientExitCode, "exited with code 2");
        let text = diag.to_string();
        assert!(text.starts_with("Regex client error"));
        assert!(text.contains("2"));
    }

    #[test]
    fn test_kind_is_server() {
        assert!(DiagnosticKind::ServerExited.is_server());
        assert!(DiagnosticKind::ServerLaunchFailed.is_server());
        assert!(!DiagnosticKind::ClientTimedOut.is_server());
    }

    #[test]
    fn test_channel_sink_forwards() {
        let (sink, rx) = ChannelSink::new();
        sink.report(Diagnostic::new(DiagnosticKind::ServerExited, "code 3"));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.kind, DiagnosticKind::ServerExited);
        assert_eq!(received.message, "code 3");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.report(Diagnostic::new(DiagnosticKind::ClientCancelled, "ignored"));
    }

    #[test]
    fn test_arc_sink_delegates() {
        let (sink, rx) = ChannelSink::new();
        let shared: Arc<dyn DiagnosticSink> = Arc::new(sink);
        shared.report(Diagnostic::new(
            DiagnosticKind::ClientLaunchFailed,
            "missing",
        ));
        assert_eq!(rx.len(), 1);
    }
}
