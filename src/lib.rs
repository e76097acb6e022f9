//! Core library entry for the `knack-sleuth` CLI.
//!
//! Loads a Knack application's metadata, indexes it as a [`graph::Graph`]
//! and answers usage, coupling, clustering and change-impact questions
//! about its objects and fields.

pub mod adapters;
pub mod cli;
pub mod cluster;
pub mod commands;
pub mod config;
pub mod context;
pub mod coupling;
pub mod error;
pub mod export;
pub mod graph;
pub mod impact;
pub mod loader;
pub mod logging;
pub mod model;
pub mod ports;
pub mod report;
pub mod search;
pub mod summary;

pub use error::{Result, SleuthError};

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// Help and version requests are printed and count as success.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> std::result::Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    logging::init(cli.verbose);
    commands::dispatch(&cli).map_err(|err| format!("Error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["knack-sleuth", "unknown"]);
        assert!(result.is_err());
    }

    #[test]
    fn help_is_not_an_error() {
        assert!(run(["knack-sleuth", "--help"]).is_ok());
    }

    #[test]
    fn missing_file_reports_error_prefix() {
        let err = run(["knack-sleuth", "list-objects", "/no/such/app.json"]).unwrap_err();
        assert!(err.starts_with("Error: Not found"), "{err}");
    }
}
