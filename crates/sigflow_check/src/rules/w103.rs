//! W103: Kind mismatch. The declared kind of a signal disagrees with the
//! class of its driver.

use sigflow_diagnostics::{Category, DiagnosticCode, Severity};
use sigflow_ir::{ProcessClass, SignalKind};

use crate::finding::Finding;
use crate::{CheckContext, CheckRule};

/// Flags registers driven combinationally, wires driven by clocked
/// processes, and registers with no driver at all.
pub struct KindMismatch;

impl CheckRule for KindMismatch {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, 103)
    }

    fn name(&self) -> &str {
        "kind-mismatch"
    }

    fn description(&self) -> &str {
        "signal kind disagrees with its driver"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, cx: &CheckContext<'_>) -> Vec<Finding> {
        let design = cx.design;
        let mut findings = Vec::new();
        for signal in design.signals() {
            if signal.kind == SignalKind::Register && signal.drivers.is_empty() {
                findings.push(Finding::KindMismatch {
                    signal: signal.id,
                    kind: signal.kind,
                    process: None,
                });
                continue;
            }
            for &pid in &signal.drivers {
                let class = design.process(pid).sensitivity.class();
                let mismatch = matches!(
                    (signal.kind, class),
                    (SignalKind::Register, ProcessClass::Combinational)
                        | (SignalKind::Wire, ProcessClass::Clocked)
                );
                if mismatch {
                    findings.push(Finding::KindMismatch {
                        signal: signal.id,
                        kind: signal.kind,
                        process: Some(pid),
                    });
                }
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigflow_config::WidthPolicy;
    use sigflow_ir::{elaborate, Clocking, Expr, Statement};

    #[test]
    fn each_mismatch_is_reported() {
        let design = elaborate("top", |top| {
            let clk = top.input("clk", 1)?;
            let r = top.register("r", 1)?;
            let w = top.wire("w", 1)?;
            top.register("idle", 1)?;
            top.combinational("comb", &[r], Statement::assign(r, Expr::bit(true)))?;
            top.clocked("ff", Clocking::rising(clk), &[w], Statement::assign(w, r))?;
            Ok(())
        })
        .unwrap();
        let findings = KindMismatch.check(&CheckContext {
            design: &design,
            width_policy: WidthPolicy::Strict,
        });
        let messages: Vec<String> = findings.iter().map(|f| f.message(&design)).collect();
        assert_eq!(
            messages,
            vec![
                "register `top.r` is driven by combinational process `top.comb`",
                "wire `top.w` is driven by clocked process `top.ff`",
                "register `top.idle` has no driver",
            ]
        );
    }
}
