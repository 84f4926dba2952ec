//! Terminal output

use console::{style, Term};

/// Styled status lines for command results
#[derive(Debug)]
pub struct Reporter {
    out: Term,
    err: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            use_color,
            quiet,
        }
    }

    fn prefix(&self, symbol: &str, plain: &str, paint: fn(console::StyledObject<String>) -> console::StyledObject<String>) -> String {
        if self.use_color {
            paint(style(symbol.to_string()).bold()).to_string()
        } else {
            plain.to_string()
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("✓", "OK", console::StyledObject::green);
        let _ = self.out.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = self.prefix("✗", "FAIL", console::StyledObject::red);
        let _ = self.err.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("⚠", "WARN", console::StyledObject::yellow);
        let _ = self.err.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.out.write_line(&styled);
    }

    /// Print command data; never suppressed
    pub fn data(&self, text: &str) {
        let _ = self.out.write_line(text.trim_end_matches('\n'));
    }

    /// Print a one-line outcome for a batch of files
    pub fn summary(&self, verb: &str, ok: usize, failed: usize) {
        if self.quiet && failed == 0 {
            return;
        }
        let total = ok + failed;
        let status = match (failed, self.use_color) {
            (0, true) => style("PASSED").green().bold().to_string(),
            (0, false) => "PASSED".to_string(),
            (_, true) => style("FAILED").red().bold().to_string(),
            (_, false) => "FAILED".to_string(),
        };
        let _ = self
            .out
            .write_line(&format!("{status} {verb} {total} file(s) ({ok} ok, {failed} failed)"));
    }
}
