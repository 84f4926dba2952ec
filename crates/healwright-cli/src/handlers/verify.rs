//! Verify command handler

use std::path::PathBuf;

use healwright_gen::{verify, GenError};

use crate::commands::VerifyArgs;
use crate::error::{CliError, CliResult};
use crate::output::Reporter;

/// Check each file, returning per-file outcomes in input order
pub fn verify_files(files: &[PathBuf]) -> Vec<(PathBuf, Result<(), GenError>)> {
    files
        .iter()
        .map(|path| (path.clone(), verify(path).map(|_| ())))
        .collect()
}

/// Execute the verify command
pub fn execute_verify(reporter: &Reporter, args: &VerifyArgs) -> CliResult<()> {
    let outcomes = verify_files(&args.files);
    let mut failed = 0;
    for (path, outcome) in &outcomes {
        match outcome {
            Ok(()) => reporter.success(&format!("{} matches its manifest", path.display())),
            Err(e) => {
                failed += 1;
                reporter.failure(&e.to_string());
            }
        }
    }
    reporter.summary("verified", outcomes.len() - failed, failed);
    if failed > 0 {
        return Err(CliError::VerifyFailed {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use healwright_gen::{write_test_file, RenderOptions, StepDescriptor, TestScript};

    #[test]
    fn test_mixed_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let script = TestScript::new("ok").step(StepDescriptor::Click { field: "go".into() });
        let good = write_test_file(&script, &RenderOptions::default(), dir.path()).unwrap();
        let stray = dir.path().join("stray.spec.ts");
        std::fs::write(&stray, "test('x', () => {});\n").unwrap();

        let outcomes = verify_files(&[good, stray]);
        assert!(outcomes[0].1.is_ok());
        assert!(matches!(outcomes[1].1, Err(GenError::ManifestError { .. })));

        let reporter = Reporter::new(false, true);
        let args = VerifyArgs {
            files: outcomes.into_iter().map(|(p, _)| p).collect(),
        };
        assert!(matches!(
            execute_verify(&reporter, &args),
            Err(CliError::VerifyFailed { failed: 1, total: 2 })
        ));
    }
}
