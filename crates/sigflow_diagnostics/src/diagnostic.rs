//! Structured diagnostic messages.

use crate::code::DiagnosticCode;
use crate::label::{Label, Subject};
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A finding about the design with its code, objects, notes and help.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Stable code identifying the rule that produced the finding.
    pub code: DiagnosticCode,
    /// Main message.
    pub message: String,
    /// Annotated design objects, primary first.
    pub labels: Vec<Label>,
    /// Explanatory footnotes.
    pub notes: Vec<String>,
    /// Suggestions for fixing the design.
    pub help: Vec<String>,
}

impl Diagnostic {
    /// Creates a diagnostic with the given severity.
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Creates a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Adds a label.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help line.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    /// The subject of the first primary label, if any.
    pub fn primary_subject(&self) -> Option<&Subject> {
        self.labels
            .iter()
            .find(|l| l.style == crate::label::LabelStyle::Primary)
            .map(|l| &l.subject)
    }
}
