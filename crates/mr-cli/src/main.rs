//! Mr. Repo CLI
//!
//! Parses one command, runs it against the registry root and prints the
//! resulting message. Failures print a single `ERROR:` line on stderr.

mod cli;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match mr_core::run(cli.into_invocation()) {
        Ok(message) => {
            if !message.is_empty() {
                println!("{message}");
            }
        }
        Err(e) => {
            eprintln!("{} {}", "ERROR:".red().bold(), e);
            std::process::exit(exit_code(&e));
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose` when set.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Only fails if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}

/// Registry-open failures exit like argument errors.
fn exit_code(error: &mr_core::Error) -> i32 {
    match error {
        mr_core::Error::NotADirectory { .. } | mr_core::Error::NotARegistry { .. } => 2,
        _ => 1,
    }
}
