//! `rwp parse`, `rwp match` and `rwp explain`

use std::io::{self, BufRead, Write};

use rwp_host::host::require_pattern;
use rwp_host::{Command, CommandExecutor, ExecutionResult};

use super::MatchArgs;

const CANDIDATE_PROMPT: &str = "candidate> ";

/// Run one command and print its result.
///
/// A failed call has already been reported by the executor; it is returned
/// as an error only so the exit code reflects it.
pub fn run(
    command: Command,
    json: bool,
    executor: &CommandExecutor,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    require_pattern(command.pattern())?;
    let result = executor.execute(&command);
    print_result(out, &result, json)?;
    into_outcome(result)
}

/// `rwp match`: one candidate from the command line, or a prompt loop
pub fn run_match(
    args: MatchArgs,
    executor: &CommandExecutor,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    require_pattern(&args.pattern)?;

    if let Some(candidate) = args.candidate {
        return run(
            Command::match_candidate(args.pattern, candidate),
            args.json,
            executor,
            out,
        );
    }

    let count = match_loop(&args.pattern, args.json, executor, input, out)?;
    tracing::debug!(count, "Match loop finished");
    Ok(())
}

/// Prompt for candidates and match each one until a blank line or EOF.
///
/// Every iteration is an independent client call. Returns how many were made.
pub fn match_loop(
    pattern: &str,
    json: bool,
    executor: &CommandExecutor,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let mut count = 0;
    while let Some(candidate) = prompt_candidate(input, out)? {
        let result = executor.execute(&Command::match_candidate(pattern, candidate));
        print_result(out, &result, json)?;
        count += 1;
    }
    Ok(count)
}

/// Next candidate, or `None` when the user enters a blank line or input ends
fn prompt_candidate(input: &mut impl BufRead, out: &mut impl Write) -> io::Result<Option<String>> {
    write!(out, "{}", CANDIDATE_PROMPT)?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let candidate = line.trim_end_matches(['\n', '\r']);
    if candidate.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(candidate.to_string()))
}

pub fn print_result(
    out: &mut impl Write,
    result: &ExecutionResult,
    json: bool,
) -> anyhow::Result<()> {
    tracing::debug!(verdict = ?result.verdict(), "Client result");
    if json {
        writeln!(out, "{}", serde_json::to_string(result)?)?;
    } else {
        writeln!(out, "{}", result.display_text())?;
    }
    Ok(())
}

fn into_outcome(result: ExecutionResult) -> anyhow::Result<()> {
    match result {
        ExecutionResult::Output(_) => Ok(()),
        ExecutionResult::Failure(failure) => Err(failure.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rwp_host::{ChannelSink, ExecutorOptions, HostError};
    use std::sync::Arc;

    fn missing_client() -> CommandExecutor {
        let (sink, _rx) = ChannelSink::new();
        CommandExecutor::new(
            ExecutorOptions::default().program("wr22-client-that-does-not-exist"),
            Arc::new(sink),
        )
    }

    #[test]
    fn test_prompt_candidate_stops_on_blank() {
        let mut input = &b"aaa\n  \nbbb\n"[..];
        let mut out = Vec::new();

        assert_eq!(
            prompt_candidate(&mut input, &mut out).unwrap(),
            Some("aaa".to_string())
        );
        assert_eq!(prompt_candidate(&mut input, &mut out).unwrap(), None);
        assert_eq!(String::from_utf8(out).unwrap(), "candidate> candidate> ");
    }

    #[test]
    fn test_prompt_candidate_keeps_inner_spaces() {
        let mut input = &b" a b \r\n"[..];
        let mut out = Vec::new();
        assert_eq!(
            prompt_candidate(&mut input, &mut out).unwrap(),
            Some(" a b ".to_string())
        );
    }

    #[test]
    fn test_prompt_candidate_eof() {
        let mut input = &b""[..];
        let mut out = Vec::new();
        assert_eq!(prompt_candidate(&mut input, &mut out).unwrap(), None);
    }

    #[test]
    fn test_empty_pattern_issues_nothing() {
        let executor = missing_client();
        let mut out = Vec::new();
        let err = run(Command::parse(" "), false, &executor, &mut out).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HostError>(),
            Some(HostError::EmptyPattern)
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_failure_prints_empty_line() {
        let executor = missing_client();
        let mut out = Vec::new();
        let err = run(Command::explain("a"), false, &executor, &mut out).unwrap_err();
        assert!(err.downcast_ref::<rwp_host::Failure>().is_some());
        assert_eq!(out, b"\n");
    }

    #[test]
    fn test_print_result_json() {
        let mut out = Vec::new();
        let result = ExecutionResult::Output("OK".into());
        print_result(&mut out, &result, true).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"output\":\"OK\"}\n");
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use crate::cli::test_support::fake_program;

        fn echo_client() -> (tempfile::TempDir, CommandExecutor) {
            let (dir, path) = fake_program("wr22-client", "echo \"$1:$2:$3\"");

            let (sink, _rx) = ChannelSink::new();
            let executor = CommandExecutor::new(
                ExecutorOptions::default().program(path.to_string_lossy()),
                Arc::new(sink),
            );
            (dir, executor)
        }

        #[test]
        fn test_match_loop_runs_until_blank() {
            let (_dir, executor) = echo_client();
            let mut input = &b"aa\nb b\n\nignored\n"[..];
            let mut out = Vec::new();

            let count = match_loop("a+", false, &executor, &mut input, &mut out).unwrap();
            assert_eq!(count, 2);
            assert_eq!(
                String::from_utf8(out).unwrap(),
                "candidate> match:a+:aa\ncandidate> match:a+:b b\ncandidate> "
            );
        }

        #[test]
        fn test_run_match_with_candidate() {
            let (_dir, executor) = echo_client();
            let args = MatchArgs {
                pattern: "x".into(),
                candidate: Some("y".into()),
                json: false,
            };
            let mut input = &b""[..];
            let mut out = Vec::new();
            run_match(args, &executor, &mut input, &mut out).unwrap();
            assert_eq!(String::from_utf8(out).unwrap(), "match:x:y\n");
        }
    }
}
