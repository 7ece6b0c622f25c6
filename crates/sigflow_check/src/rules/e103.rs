//! E103: Width mismatch. An assignment whose source and destination widths
//! the configured width policy cannot reconcile.

use sigflow_diagnostics::{Category, DiagnosticCode, Severity};
use sigflow_ir::{SignalId, SignalRef, Statement};

use crate::finding::Finding;
use crate::{CheckContext, CheckRule};

/// Checks every assignment against the width policy. A slice target that
/// reaches past the end of its signal is reported with the signal width as
/// the expected width.
pub struct WidthMismatch;

impl CheckRule for WidthMismatch {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Error, 103)
    }

    fn name(&self) -> &str {
        "width-mismatch"
    }

    fn description(&self) -> &str {
        "assignment width not accepted by the width policy"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, cx: &CheckContext<'_>) -> Vec<Finding> {
        let design = cx.design;
        let width_of = |id: SignalId| design.signal(id).width;
        let mut findings = Vec::new();
        for &pid in design.schedule_order() {
            design.process(pid).body.visit(&mut |stmt| {
                let Statement::Assign { target, value } = stmt else {
                    return;
                };
                let signal_width = width_of(target.signal());
                if let SignalRef::Slice { high, low, signal } = *target {
                    if high >= signal_width || low > high {
                        findings.push(Finding::WidthMismatch {
                            process: pid,
                            target: signal,
                            expected: signal_width,
                            found: high + 1,
                        });
                        return;
                    }
                }
                let expected = target.width(signal_width);
                let found = value.width(&width_of);
                if !cx.width_policy.accepts(found, expected) {
                    findings.push(Finding::WidthMismatch {
                        process: pid,
                        target: target.signal(),
                        expected,
                        found,
                    });
                }
            });
        }
        findings
    }
}
