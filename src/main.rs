//! Binary entrypoint for the `knack-sleuth` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    match knack_sleuth::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
