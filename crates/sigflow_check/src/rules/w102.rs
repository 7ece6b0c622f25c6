//! W102: Missing reset. A clocked process with a reset leaves one of its
//! registers without a reset value.

use sigflow_diagnostics::{Category, DiagnosticCode, Severity};

use crate::finding::Finding;
use crate::{CheckContext, CheckRule};

/// Flags driven signals that a process's reset does not initialize.
pub struct MissingReset;

impl CheckRule for MissingReset {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, 102)
    }

    fn name(&self) -> &str {
        "missing-reset"
    }

    fn description(&self) -> &str {
        "register not covered by its process's reset"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, cx: &CheckContext<'_>) -> Vec<Finding> {
        let design = cx.design;
        let mut findings = Vec::new();
        for &pid in design.schedule_order() {
            let process = design.process(pid);
            let Some(reset) = process
                .sensitivity
                .clocking()
                .and_then(|c| c.reset.as_ref())
            else {
                continue;
            };
            for &signal in &process.writes {
                if reset.value_for(signal).is_none() {
                    findings.push(Finding::MissingReset {
                        process: pid,
                        signal,
                    });
                }
            }
        }
        findings
    }
}
