//! Error handling for the MiniJava backend
//!
//! This module defines the common error type and the diagnostic log that
//! every phase appends to. Phases do not abort the whole compilation on the
//! first problem: they record a diagnostic and move on to the next fragment,
//! and the phase driver checks the log between stages.

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main compiler error type that encompasses all phases of the backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Codegen error in {fragment}: {message}")]
    Selection {
        fragment: String,
        message: String,
    },

    #[error("Input error: {message}")]
    InputError { message: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Compilation failed: {summary}")]
    CompilationFailed { summary: String },

    #[error("Internal compiler error: {message}")]
    InternalError { message: String },
}

impl CompilerError {
    /// Create a selection error for a fragment
    pub fn selection(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        CompilerError::Selection {
            fragment: fragment.into(),
            message: message.into(),
        }
    }

    /// Create an input error (malformed IR program)
    pub fn input(message: impl Into<String>) -> Self {
        CompilerError::InputError {
            message: message.into(),
        }
    }

    /// Errors were reported; `reporter` has the details
    pub fn failed(reporter: &ErrorReporter) -> Self {
        CompilerError::CompilationFailed {
            summary: reporter.summary(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}

/// Convert from String (for simple error cases)
impl From<String> for CompilerError {
    fn from(message: String) -> Self {
        CompilerError::InternalError { message }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with the phase that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub phase: Option<String>,
    pub message: String,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: String) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: String) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn note(message: String) -> Self {
        Self::new(Severity::Note, message)
    }

    fn new(severity: Severity, message: String) -> Self {
        Self {
            severity,
            phase: None,
            message,
            notes: Vec::new(),
        }
    }

    pub fn in_phase(mut self, phase: Option<String>) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    /// Attach a note to a diagnostic already in the log
    pub fn add_note(&mut self, note: String) -> &mut Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.phase {
            Some(phase) => write!(f, "{}[{}]: {}", self.severity, phase, self.message)?,
            None => write!(f, "{}: {}", self.severity, self.message)?,
        }

        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }

        Ok(())
    }
}

/// Error reporter for collecting and displaying diagnostics
///
/// One reporter lives for a whole compilation run. Phases register
/// themselves with [`ErrorReporter::begin_phase`] so diagnostics are tagged
/// with the phase that raised them.
#[derive(Debug)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    phase: Option<String>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            error_count: 0,
            warning_count: 0,
            phase: None,
        }
    }

    /// Enter a new compiler phase
    pub fn begin_phase(&mut self, phase: &str) {
        info!("[Entering {} phase]", phase);
        self.phase = Some(phase.to_string());
    }

    /// Name of the phase currently running
    pub fn current_phase(&self) -> Option<&str> {
        self.phase.as_deref()
    }

    /// Report an error diagnostic
    pub fn error(&mut self, message: String) -> &mut Diagnostic {
        error!("{}", message);
        self.error_count += 1;
        self.push(Diagnostic::error(message))
    }

    /// Report a warning diagnostic
    pub fn warning(&mut self, message: String) -> &mut Diagnostic {
        warn!("{}", message);
        self.warning_count += 1;
        self.push(Diagnostic::warning(message))
    }

    /// Report a note diagnostic
    pub fn note(&mut self, message: String) -> &mut Diagnostic {
        self.push(Diagnostic::note(message))
    }

    /// Record a compiler error as an error diagnostic
    pub fn report(&mut self, err: &CompilerError) -> &mut Diagnostic {
        self.error(err.to_string())
    }

    fn push(&mut self, diagnostic: Diagnostic) -> &mut Diagnostic {
        let index = self.diagnostics.len();
        self.diagnostics.push(diagnostic.in_phase(self.phase.clone()));
        &mut self.diagnostics[index]
    }

    /// Check if any errors have been reported
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Get the number of errors
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Get the number of warnings
    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// Get all diagnostics
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Clear all diagnostics
    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.error_count = 0;
        self.warning_count = 0;
        self.phase = None;
    }

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self) {
        for diagnostic in &self.diagnostics {
            eprintln!("{}", diagnostic);
        }
    }

    /// Create a summary string
    pub fn summary(&self) -> String {
        match (self.error_count, self.warning_count) {
            (0, 0) => "No errors or warnings".to_string(),
            (0, w) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (e, 0) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (e, w) => format!(
                "{} error{} and {} warning{}",
                e,
                if e == 1 { "" } else { "s" },
                w,
                if w == 1 { "" } else { "s" }
            ),
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
