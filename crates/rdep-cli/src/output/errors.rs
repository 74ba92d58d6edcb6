//! Error message formatting with actionable suggestions.

use std::error::Error;

use rdep_core::error::RdepError;
use rdep_repo::Diagnostic;

use super::colors::ColorSupport;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self::with_colors(ColorSupport::detect())
    }

    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    /// Format an error with its suggestion and source chain
    pub fn format_error(&self, error: &RdepError) -> String {
        let mut output = String::new();

        output.push_str(&self.colors.red("error"));
        output.push_str(": ");
        output.push_str(&error.to_string());
        output.push('\n');

        if let Some(suggestion) = error.suggestion() {
            output.push_str(&self.colors.dim("help"));
            output.push_str(": ");
            output.push_str(suggestion);
            output.push('\n');
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push_str(&self.colors.dim("caused by"));
            output.push_str(": ");
            output.push_str(&err.to_string());
            output.push('\n');
            source = err.source();
        }

        output
    }

    /// Format a dropped stanza as a warning pointing at its location
    pub fn format_diagnostic(&self, file: &str, diagnostic: &Diagnostic) -> String {
        let mut output = format!("{}: {}\n", self.colors.yellow("warning"), diagnostic);
        output.push_str(&format!(
            "  {} {}:{}\n",
            self.colors.dim("-->"),
            file,
            diagnostic.line
        ));
        if let Some(suggestion) = diagnostic.error.suggestion() {
            output.push_str(&format!("  {}: {}\n", self.colors.dim("help"), suggestion));
        }
        output
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
