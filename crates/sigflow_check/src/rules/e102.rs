//! E102: Combinational loop. A cycle through combinational processes with no
//! clocked element to break it.

use petgraph::algo::tarjan_scc;
use petgraph::visit::EdgeRef;
use sigflow_diagnostics::{Category, DiagnosticCode, Severity};
use sigflow_ir::ProcessId;

use crate::finding::Finding;
use crate::helpers::combinational_graph;
use crate::{CheckContext, CheckRule};

/// Detects cycles in the combinational dependency graph, including a single
/// process that reads a signal it drives.
pub struct CombinationalLoop;

impl CheckRule for CombinationalLoop {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Error, 102)
    }

    fn name(&self) -> &str {
        "combinational-loop"
    }

    fn description(&self) -> &str {
        "cycle through combinational logic without a register"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, cx: &CheckContext<'_>) -> Vec<Finding> {
        let graph = combinational_graph(cx.design);
        let mut findings = Vec::new();
        for component in tarjan_scc(&graph) {
            let cyclic = component.len() > 1
                || graph.find_edge(component[0], component[0]).is_some();
            if !cyclic {
                continue;
            }
            let mut signals: Vec<_> = component
                .iter()
                .flat_map(|&n| graph.edges(n))
                .filter(|e| component.contains(&e.target()))
                .map(|e| *e.weight())
                .collect();
            signals.sort();
            signals.dedup();
            let mut processes: Vec<ProcessId> = component.iter().map(|&n| graph[n]).collect();
            processes.sort_by_key(|p| cx.design.process(*p).rank());
            findings.push(Finding::CombinationalLoop { processes, signals });
        }
        findings.sort_by_key(|f| f.processes().first().map(|p| cx.design.process(*p).rank()));
        findings
    }
}
