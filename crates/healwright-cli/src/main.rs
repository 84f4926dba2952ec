//! Healwright CLI
//!
//! ## Usage
//!
//! ```bash
//! healwright generate --plan plan.yaml --out tests/e2e   # Render Playwright tests
//! healwright candidates username                         # Show selector order
//! healwright verify tests/e2e/*.spec.ts                  # Detect hand edits
//! healwright config --config healwright.yaml             # Effective settings
//! ```

use clap::Parser;
use healwright_cli::{run, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
