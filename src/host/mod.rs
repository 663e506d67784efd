//! Host module for the engine server and client command execution

pub mod command;
pub mod executor;
pub mod result;
pub mod supervisor;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

use std::path::{Path, PathBuf};

pub use command::{require_pattern, Command, CLIENT_PROGRAM};
pub use executor::{CancelToken, CommandExecutor, ExecutorOptions};
pub use result::{join_lines, ClientVerdict, ExecutionResult, Failure, FailureKind};
pub use supervisor::{ServerExit, ServerHandle, ServerState, ServerSupervisor, SERVER_PROGRAM};

/// Resolve a program name or path to something we can spawn.
///
/// Existing paths are used as given; bare names are looked up on PATH.
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.exists() {
        return Some(path.to_path_buf());
    }
    which::which(program).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_missing_program() {
        let missing = resolve_program("wr22-program-that-does-not-exist");
        assert!(missing.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_existing_path() {
        let (_dir, path) = test_support::fake_program("wr22-client", "exit 0");
        let resolved = resolve_program(&path.to_string_lossy()).unwrap();
        assert_eq!(resolved, path);
    }
}
