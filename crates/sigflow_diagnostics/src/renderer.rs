//! Rendering diagnostics as text.

use crate::diagnostic::Diagnostic;
use crate::label::LabelStyle;

/// Formats a diagnostic for some output target.
pub trait DiagnosticRenderer {
    /// Renders one diagnostic.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-like terminal layout:
///
/// ```text
/// error[E101]: signal `top.q` has 2 drivers
///   --> signal `top.q`: driven here
///   --- process `top.a`: first driver
///    = note: ...
///    = help: ...
/// ```
pub struct TerminalRenderer {
    /// Wrap the severity header in ANSI color codes.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn header(&self, diag: &Diagnostic) -> String {
        let head = format!("{}[{}]", diag.severity, diag.code);
        if !self.color {
            return head;
        }
        let ansi = if diag.severity.is_error() { "31" } else { "33" };
        format!("\x1b[1;{ansi}m{head}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = format!("{}: {}\n", self.header(diag), diag.message);
        for label in &diag.labels {
            let arrow = match label.style {
                LabelStyle::Primary => "-->",
                LabelStyle::Secondary => "---",
            };
            out.push_str(&format!("  {arrow} {}: {}\n", label.subject, label.message));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use crate::label::{Label, Subject};

    #[test]
    fn renders_labels_notes_and_help() {
        let diag = Diagnostic::error(DiagnosticCode::new(Category::Error, 101), "two drivers")
            .with_label(Label::primary(Subject::Signal("top.q".into()), "driven twice"))
            .with_label(Label::secondary(Subject::Process("top.a".into()), "driver"))
            .with_note("registers have one driver")
            .with_help("merge the processes");
        let out = TerminalRenderer::new(false).render(&diag);
        assert!(out.starts_with("error[E101]: two drivers\n"));
        assert!(out.contains("  --> signal `top.q`: driven twice\n"));
        assert!(out.contains("  --- process `top.a`: driver\n"));
        assert!(out.contains("   = note: registers have one driver\n"));
        assert!(out.contains("   = help: merge the processes\n"));
    }

    #[test]
    fn color_wraps_header() {
        let diag = Diagnostic::warning(DiagnosticCode::new(Category::Warning, 101), "latch");
        let out = TerminalRenderer::new(true).render(&diag);
        assert!(out.starts_with("\x1b[1;33mwarning[W101]\x1b[0m: latch"));
    }
}
