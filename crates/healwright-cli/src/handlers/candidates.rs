//! Candidates command handler

use healwright::build_candidates;
use serde::Serialize;

use crate::commands::CandidatesArgs;
use crate::error::CliResult;
use crate::output::Reporter;

/// One printed candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRow {
    /// 1-based priority
    pub rank: usize,
    /// Candidate kind label
    pub kind: &'static str,
    /// Playwright selector
    pub selector: String,
}

/// Candidates for `field` in resolution order
#[must_use]
pub fn candidate_rows(field: &str) -> Vec<CandidateRow> {
    build_candidates(field)
        .iter()
        .enumerate()
        .map(|(i, c)| CandidateRow {
            rank: i + 1,
            kind: c.kind.label(),
            selector: c.selector(),
        })
        .collect()
}

/// Execute the candidates command
pub fn execute_candidates(reporter: &Reporter, args: &CandidatesArgs) -> CliResult<()> {
    let rows = candidate_rows(&args.field);
    if args.json {
        let doc = serde_json::json!({ "field": args.field.trim(), "candidates": rows });
        reporter.data(&serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }
    reporter.header(&format!("Candidates for \"{}\" ({})", args.field.trim(), rows.len()));
    for row in &rows {
        reporter.data(&format!("{:>3}. {:<15} {}", row.rank, row.kind, row.selector));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_follow_builder_order() {
        let rows = candidate_rows("username");
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].kind, "text");
        assert_eq!(rows[1].selector, "[name=\"username\"]");
        assert_eq!(rows[8].kind, "test-id");
    }

    #[test]
    fn test_blank_field_gives_baseline() {
        let rows = candidate_rows("  ");
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[3].selector, "textarea");
    }
}
