//! Process-level settings derived from global flags

/// How much the CLI reports, from `-q` and repeated `-v`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// `-q`: errors only
    Quiet,
    /// Status lines and warnings
    #[default]
    Normal,
    /// `-v`: adds `info` logs
    Verbose,
    /// `-vv` and beyond: adds `debug` logs
    Debug,
}

impl Verbosity {
    /// `-q` overrides any number of `-v`
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Debug,
        }
    }

    /// Whether status output is suppressed
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// `tracing` filter used when `RUST_LOG` is unset
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// `--color` setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Color even when piped
    Always,
    /// Color only when stdout is a color-capable terminal
    #[default]
    Auto,
    /// Plain text only
    Never,
}

impl ColorChoice {
    /// Resolve `Auto` against the terminal attached to stdout
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stdout().features().colors_supported(),
        }
    }
}

/// Resolved global flags
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Output and log level
    pub verbosity: Verbosity,
    /// Terminal styling
    pub color: ColorChoice,
    /// JSON lines on stderr instead of human-readable logs
    pub log_json: bool,
}

impl CliConfig {
    /// Defaults: normal verbosity, auto color, text logs
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set JSON logging
    #[must_use]
    pub const fn with_log_json(mut self, log_json: bool) -> Self {
        self.log_json = log_json;
        self
    }
}
