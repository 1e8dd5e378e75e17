//! Binary entry point for `uwd`.

use std::process::ExitCode;

use clap::Parser;

use unit_watchdog::cli_app::{self, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli_app::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("uwd: {e}");
            ExitCode::FAILURE
        }
    }
}
