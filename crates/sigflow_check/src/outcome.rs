//! Results of a checker run.

use crate::finding::Finding;
use sigflow_config::WidthPolicy;
use sigflow_diagnostics::Diagnostic;
use sigflow_ir::Design;

/// A design that passed the checker, together with its warnings.
#[derive(Debug, Clone)]
pub struct CheckedDesign {
    design: Design,
    warnings: Vec<Finding>,
    diagnostics: Vec<Diagnostic>,
    width_policy: WidthPolicy,
}

impl CheckedDesign {
    pub(crate) fn new(
        design: Design,
        warnings: Vec<Finding>,
        diagnostics: Vec<Diagnostic>,
        width_policy: WidthPolicy,
    ) -> Self {
        Self {
            design,
            warnings,
            diagnostics,
            width_policy,
        }
    }

    /// The accepted design.
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// Non-fatal findings.
    pub fn warnings(&self) -> &[Finding] {
        &self.warnings
    }

    /// Rendered diagnostics for the warnings.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Width policy the design was checked under; the simulator reconciles
    /// assignment widths with the same policy.
    pub fn width_policy(&self) -> WidthPolicy {
        self.width_policy
    }

    /// Gives up the checked status and returns the design.
    pub fn into_design(self) -> Design {
        self.design
    }
}

/// A design rejected by the checker.
#[derive(Debug, Clone, thiserror::Error)]
#[error("design rejected with {} error(s): {}", .errors.len(), .summary)]
pub struct CheckFailure {
    /// Fatal findings, in rule order.
    pub errors: Vec<Finding>,
    /// Non-fatal findings.
    pub warnings: Vec<Finding>,
    /// Diagnostics for all findings.
    pub diagnostics: Vec<Diagnostic>,
    summary: String,
}

impl CheckFailure {
    pub(crate) fn new(
        errors: Vec<Finding>,
        warnings: Vec<Finding>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let summary = diagnostics
            .iter()
            .find(|d| d.severity.is_error())
            .map(|d| format!("[{}] {}", d.code, d.message))
            .unwrap_or_default();
        Self {
            errors,
            warnings,
            diagnostics,
            summary,
        }
    }
}
