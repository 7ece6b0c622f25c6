//! W101: Latch inference. Some path through a process body neither assigns
//! nor explicitly holds a signal the process drives.

use sigflow_diagnostics::{Category, DiagnosticCode, Severity};
use sigflow_ir::ProcessClass;

use crate::finding::Finding;
use crate::helpers::assigned_bits;
use crate::{CheckContext, CheckRule};

/// Runs path coverage over combinational and clocked bodies. Periodic
/// stimulus is not synthesized and is skipped.
pub struct LatchInference;

impl CheckRule for LatchInference {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, 101)
    }

    fn name(&self) -> &str {
        "latch-inference"
    }

    fn description(&self) -> &str {
        "driven signal left unassigned on some path"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, cx: &CheckContext<'_>) -> Vec<Finding> {
        let design = cx.design;
        let mut findings = Vec::new();
        for &pid in design.schedule_order() {
            let process = design.process(pid);
            if process.sensitivity.class() == ProcessClass::Periodic {
                continue;
            }
            for &signal in &process.writes {
                let width = design.signal(signal).width;
                if !assigned_bits(&process.body, signal, width).iter().all(|b| *b) {
                    findings.push(Finding::LatchInference {
                        process: pid,
                        signal,
                    });
                }
            }
        }
        findings
    }
}
