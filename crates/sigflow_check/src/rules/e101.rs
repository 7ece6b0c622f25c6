//! E101: Multiple drivers. A signal registered as written by more than one
//! process.

use sigflow_diagnostics::{Category, DiagnosticCode, Severity};

use crate::finding::Finding;
use crate::{CheckContext, CheckRule};

/// Detects signals with more than one driving process.
///
/// Registers have exactly one driver and wires at most one, so any second
/// driver is fatal regardless of signal kind.
pub struct MultipleDrivers;

impl CheckRule for MultipleDrivers {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Error, 101)
    }

    fn name(&self) -> &str {
        "multiple-drivers"
    }

    fn description(&self) -> &str {
        "signal driven by more than one process"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, cx: &CheckContext<'_>) -> Vec<Finding> {
        cx.design
            .signals()
            .filter(|s| s.drivers.len() > 1)
            .map(|s| Finding::MultipleDrivers {
                signal: s.id,
                processes: s.drivers.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigflow_config::WidthPolicy;
    use sigflow_ir::{elaborate, Clocking, Expr, Statement};

    #[test]
    fn two_writers_of_a_register_fire() {
        let design = elaborate("top", |top| {
            let clk = top.input("clk", 1)?;
            let q = top.register("q", 1)?;
            top.clocked("a", Clocking::rising(clk), &[q], Statement::assign(q, Expr::bit(true)))?;
            top.combinational("b", &[q], Statement::assign(q, Expr::bit(false)))?;
            Ok(())
        })
        .unwrap();
        let cx = CheckContext {
            design: &design,
            width_policy: WidthPolicy::Strict,
        };
        let findings = MultipleDrivers.check(&cx);
        assert_eq!(findings.len(), 1);
        let Finding::MultipleDrivers { signal, processes } = &findings[0] else {
            panic!("unexpected finding {:?}", findings[0]);
        };
        assert_eq!(design.signal(*signal).name, "top.q");
        let names: Vec<&str> = processes
            .iter()
            .map(|p| design.process(*p).name.as_str())
            .collect();
        assert_eq!(names, vec!["top.a", "top.b"]);
    }

    #[test]
    fn single_driver_is_clean() {
        let design = elaborate("top", |top| {
            let y = top.wire("y", 1)?;
            top.combinational("a", &[y], Statement::assign(y, Expr::bit(true)))?;
            Ok(())
        })
        .unwrap();
        let cx = CheckContext {
            design: &design,
            width_policy: WidthPolicy::Strict,
        };
        assert!(MultipleDrivers.check(&cx).is_empty());
    }
}
