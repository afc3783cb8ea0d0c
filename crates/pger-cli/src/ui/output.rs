//! Console output handle used by every command.
//!
//! Informational lines go to stdout and are dropped with `--quiet`.
//! Warnings and errors go to stderr and are never suppressed.

use crossterm::style::Stylize;
use pger_core::Reporter;

use super::theme::Theme;

/// Prints styled status lines to the terminal.
#[derive(Debug, Clone, Default)]
pub struct Output {
    theme: Theme,
    quiet: bool,
}

impl Output {
    /// Create an output handle.
    pub fn new(quiet: bool) -> Self {
        Self {
            theme: Theme::default(),
            quiet,
        }
    }

    /// Theme used for rendering.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Whether informational output is suppressed.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Prints a visual section header for an operation phase.
    pub fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        println!();
        println!("{} {}", title.bold(), "─".repeat(40).with(self.theme.colors.header));
    }

    /// Prints an informational message.
    pub fn info(&self, msg: &str) {
        if self.quiet {
            return;
        }
        println!("  {} {}", self.theme.icons.info.with(self.theme.colors.secondary), msg);
    }

    /// Prints a success message.
    pub fn success(&self, msg: &str) {
        if self.quiet {
            return;
        }
        println!("  {} {}", self.theme.icons.success.with(self.theme.colors.success), msg);
    }

    /// Prints a warning message.
    pub fn warning(&self, msg: &str) {
        eprintln!("  {} {}", self.theme.icons.warning.with(self.theme.colors.warning), msg);
    }

    /// Prints an error message.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {}", self.theme.icons.error.with(self.theme.colors.error), msg);
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        Output::section(self, title);
    }
    fn info(&self, msg: &str) {
        Output::info(self, msg);
    }
    fn success(&self, msg: &str) {
        Output::success(self, msg);
    }
    fn warning(&self, msg: &str) {
        Output::warning(self, msg);
    }
    fn error(&self, msg: &str) {
        Output::error(self, msg);
    }
}
