//! rwp - command-line host for the wr22 regex tools
//!
//! - `rwp parse|match|explain` run one `wr22-client` command per call
//! - `rwp server` runs `wr22-regex-server` under supervision in the foreground
//! - `rwp session` starts the server in the background and reads commands
//!   from stdin, the way an editor plugin would drive it

mod cli;

use std::sync::Arc;

use clap::Parser;
use cli::{categorize_error, exit_codes, Cli, Commands};
use rwp_host::{logging, Command, CommandExecutor, DiagnosticSink, TracingSink};

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose, cli.json_output) {
        eprintln!("Failed to initialize logging: {}", e);
        return exit_codes::UNEXPECTED_FAILURE;
    }

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::CONFIG_ERROR;
        }
    };
    tracing::debug!(?settings, "Loaded settings");

    let sink: Arc<dyn DiagnosticSink> = Arc::new(TracingSink);
    let executor = CommandExecutor::new(settings.executor_options(), Arc::clone(&sink));

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = match cli.command {
        Commands::Parse(args) => {
            cli::inspect::run(Command::parse(args.pattern), args.json, &executor, &mut out)
        }
        Commands::Explain(args) => cli::inspect::run(
            Command::explain(args.pattern),
            args.json,
            &executor,
            &mut out,
        ),
        Commands::Match(args) => cli::inspect::run_match(args, &executor, &mut input, &mut out),
        Commands::Server => cli::session::run_server(&settings, sink),
        Commands::Session(args) => {
            cli::session::run_session(args, &settings, &executor, sink, &mut input, &mut out)
        }
    };

    match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            let code = categorize_error(&e);
            // Command failures were already surfaced as diagnostics
            if code != exit_codes::FAILURE {
                eprintln!("Error: {:#}", e);
            }
            code
        }
    }
}
