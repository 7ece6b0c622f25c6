//! E105: Dual-edge clock. A clocked process samples on both edges of its
//! clock, which no single register can do.

use sigflow_diagnostics::{Category, DiagnosticCode, Severity};
use sigflow_ir::Edge;

use crate::finding::Finding;
use crate::{CheckContext, CheckRule};

/// Flags clocked processes whose active edge is [`Edge::Any`].
pub struct DualEdgeClock;

impl CheckRule for DualEdgeClock {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Error, 105)
    }

    fn name(&self) -> &str {
        "dual-edge-clock"
    }

    fn description(&self) -> &str {
        "clocked process triggers on both clock edges"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, cx: &CheckContext<'_>) -> Vec<Finding> {
        let design = cx.design;
        design
            .schedule_order()
            .iter()
            .filter_map(|&pid| {
                let clocking = design.process(pid).sensitivity.clocking()?;
                (clocking.edge == Edge::Any).then_some(Finding::DualEdgeClock {
                    process: pid,
                    clock: clocking.clock,
                })
            })
            .collect()
    }
}
