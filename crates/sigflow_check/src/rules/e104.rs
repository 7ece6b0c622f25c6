//! E104: Driver violation. A body writes a signal its process is not
//! registered to drive, or a process drives an input port of its own
//! instance.

use sigflow_diagnostics::{Category, DiagnosticCode, Severity};

use crate::finding::{Finding, ViolationReason};
use crate::{CheckContext, CheckRule};

/// Compares each body's assignment targets and holds with the declared write
/// set, and the write set with the owning instance's input ports.
pub struct DriverViolation;

impl CheckRule for DriverViolation {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Error, 104)
    }

    fn name(&self) -> &str {
        "driver-violation"
    }

    fn description(&self) -> &str {
        "process writes a signal it does not own"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, cx: &CheckContext<'_>) -> Vec<Finding> {
        let design = cx.design;
        let mut findings = Vec::new();
        for &pid in design.schedule_order() {
            let process = design.process(pid);
            let mut written: Vec<_> = Vec::new();
            let mut targets = Vec::new();
            process.body.collect_targets(&mut targets);
            written.extend(targets.iter().map(|t| t.signal()));
            process.body.collect_holds(&mut written);
            written.sort();
            written.dedup();
            for signal in written.into_iter().filter(|s| !process.writes_to(*s)) {
                findings.push(Finding::DriverViolation {
                    process: pid,
                    signal,
                    reason: ViolationReason::Undeclared,
                });
            }

            let instance = design.instance(process.instance);
            for &signal in process.writes.iter().filter(|s| instance.is_input(**s)) {
                findings.push(Finding::DriverViolation {
                    process: pid,
                    signal,
                    reason: ViolationReason::InputPort,
                });
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigflow_config::WidthPolicy;
    use sigflow_ir::{elaborate, Design, Expr, Statement};

    fn run(design: &Design) -> Vec<Finding> {
        DriverViolation.check(&CheckContext {
            design,
            width_policy: WidthPolicy::Strict,
        })
    }

    #[test]
    fn undeclared_target_is_reported() {
        let design = elaborate("top", |top| {
            let a = top.wire("a", 1)?;
            let b = top.wire("b", 1)?;
            top.combinational(
                "p",
                &[a],
                Statement::block([
                    Statement::assign(a, Expr::bit(true)),
                    Statement::assign(b, Expr::bit(true)),
                ]),
            )?;
            Ok(())
        })
        .unwrap();
        let findings = run(&design);
        assert_eq!(findings.len(), 1);
        let Finding::DriverViolation { signal, reason, .. } = findings[0] else {
            panic!("unexpected finding {:?}", findings[0]);
        };
        assert_eq!(design.signal(signal).name, "top.b");
        assert_eq!(reason, ViolationReason::Undeclared);
    }

    #[test]
    fn driving_own_input_is_reported() {
        let design = elaborate("top", |top| {
            let x = top.wire("x", 1)?;
            top.instance("u", &[("i", x)], |u| {
                let i = u.input("i", 1)?;
                u.combinational("bad", &[i], Statement::assign(i, Expr::bit(false)))?;
                Ok(())
            })
        })
        .unwrap();
        let findings = run(&design);
        assert_eq!(findings.len(), 1);
        assert!(matches!(
            findings[0],
            Finding::DriverViolation {
                reason: ViolationReason::InputPort,
                ..
            }
        ));
    }

    #[test]
    fn parent_may_drive_child_input() {
        let design = elaborate("top", |top| {
            let x = top.wire("x", 1)?;
            top.combinational("drive", &[x], Statement::assign(x, Expr::bit(true)))?;
            top.instance("u", &[("i", x)], |u| {
                u.input("i", 1)?;
                Ok(())
            })
        })
        .unwrap();
        assert!(run(&design).is_empty());
    }
}
