//! Command handlers - one module per subcommand
//!
//! Handlers return data or a `CliResult`; printing goes through
//! [`Reporter`](crate::Reporter) so it can be silenced with `-q`.

pub mod candidates;
pub mod config;
pub mod generate;
pub mod verify;

pub use candidates::{candidate_rows, execute_candidates, CandidateRow};
pub use config::{effective_config, execute_config};
pub use generate::{execute_generate, generate_plan, regenerate_command};
pub use verify::{execute_verify, verify_files};
