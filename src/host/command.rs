//! Client command model
//!
//! Each variant maps to one fixed `wr22-client` command line:
//!
//! | Variant   | argv                                       |
//! |-----------|--------------------------------------------|
//! | `Parse`   | `wr22-client parse <pattern>`              |
//! | `Match`   | `wr22-client match <pattern> <candidate>`  |
//! | `Explain` | `wr22-client explain <pattern>`            |

use serde::Serialize;

use crate::error::{HostError, HostResult};

/// Default client executable name
pub const CLIENT_PROGRAM: &str = "wr22-client";

/// One inspection request for the client executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Check that a pattern parses.
    Parse { pattern: String },
    /// Trace matching of a pattern against a candidate string.
    Match { pattern: String, candidate: String },
    /// Explain a pattern piece by piece.
    Explain { pattern: String },
}

impl Command {
    pub fn parse(pattern: impl Into<String>) -> Self {
        Command::Parse {
            pattern: pattern.into(),
        }
    }

    pub fn match_candidate(pattern: impl Into<String>, candidate: impl Into<String>) -> Self {
        Command::Match {
            pattern: pattern.into(),
            candidate: candidate.into(),
        }
    }

    pub fn explain(pattern: impl Into<String>) -> Self {
        Command::Explain {
            pattern: pattern.into(),
        }
    }

    /// Subcommand token understood by the client
    pub fn subcommand(&self) -> &'static str {
        match self {
            Command::Parse { .. } => "parse",
            Command::Match { .. } => "match",
            Command::Explain { .. } => "explain",
        }
    }

    pub fn pattern(&self) -> &str {
        match self {
            Command::Parse { pattern }
            | Command::Match { pattern, .. }
            | Command::Explain { pattern } => pattern,
        }
    }

    /// Arguments after the program name, in the order the client expects
    pub fn args(&self) -> Vec<&str> {
        match self {
            Command::Parse { pattern } | Command::Explain { pattern } => {
                vec![self.subcommand(), pattern.as_str()]
            }
            Command::Match { pattern, candidate } => {
                vec![self.subcommand(), pattern.as_str(), candidate.as_str()]
            }
        }
    }

    /// Full argument sequence including the program name
    pub fn argv(&self, program: &str) -> Vec<String> {
        std::iter::once(program)
            .chain(self.args())
            .map(str::to_string)
            .collect()
    }
}

/// Reject an empty or whitespace-only selection before any command is built.
pub fn require_pattern(pattern: &str) -> HostResult<&str> {
    if pattern.trim().is_empty() {
        return Err(HostError::EmptyPattern);
    }
    Ok(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_argv() {
        let cmd = Command::parse("a+b");
        assert_eq!(
            cmd.argv(CLIENT_PROGRAM),
            vec!["wr22-client", "parse", "a+b"]
        );
    }

    #[test]
    fn test_match_argv_keeps_field_order() {
        let cmd = Command::match_candidate("a+", "aaa");
        assert_eq!(
            cmd.argv(CLIENT_PROGRAM),
            vec!["wr22-client", "match", "a+", "aaa"]
        );
    }

    #[test]
    fn test_match_argv_keeps_empty_candidate() {
        let cmd = Command::match_candidate("a+", "");
        assert_eq!(cmd.args(), vec!["match", "a+", ""]);
    }

    #[test]
    fn test_explain_argv() {
        let cmd = Command::explain("(?<year>\\d{4})");
        assert_eq!(
            cmd.argv(CLIENT_PROGRAM),
            vec!["wr22-client", "explain", "(?<year>\\d{4})"]
        );
    }

    #[test]
    fn test_pattern_with_spaces_is_one_argument() {
        let cmd = Command::parse("a b  c");
        assert_eq!(cmd.args(), vec!["parse", "a b  c"]);
    }

    #[test]
    fn test_pattern_accessor() {
        assert_eq!(Command::parse("x").pattern(), "x");
        assert_eq!(Command::match_candidate("y", "z").pattern(), "y");
        assert_eq!(Command::explain("w").pattern(), "w");
    }

    #[test]
    fn test_require_pattern() {
        assert!(require_pattern("a+").is_ok());
        assert!(matches!(require_pattern(""), Err(HostError::EmptyPattern)));
        assert!(matches!(
            require_pattern("  \t"),
            Err(HostError::EmptyPattern)
        ));
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_string(&Command::match_candidate("a", "b")).unwrap();
        assert_eq!(json, r#"{"command":"match","pattern":"a","candidate":"b"}"#);
    }
}
