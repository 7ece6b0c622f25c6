//! Clock and reset domains.
//!
//! [`DomainMap`] groups clocked processes by clock signal and edge and keeps
//! each process's reset discipline. [`DomainMap::decide`] turns a trigger
//! into the action a clocked process takes in the current delta cycle.

use std::collections::BTreeMap;

use sigflow_common::{Logic, LogicVec};
use sigflow_ir::{Design, Edge, ProcessId, Reset, ResetKind, SignalId};

/// Processes sharing a clock signal and active edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockDomain {
    /// Clock signal.
    pub clock: SignalId,
    /// Active edge.
    pub edge: Edge,
    /// Member processes in scheduling order.
    pub processes: Vec<ProcessId>,
}

/// How a clocked process is reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetDiscipline {
    /// No reset.
    None,
    /// Reset sampled at the active clock edge.
    Synchronous(Reset),
    /// Reset acting immediately while asserted.
    Asynchronous(Reset),
}

impl ResetDiscipline {
    fn of(reset: Option<&Reset>) -> Self {
        match reset {
            None => ResetDiscipline::None,
            Some(r) if r.kind == ResetKind::Synchronous => ResetDiscipline::Synchronous(r.clone()),
            Some(r) => ResetDiscipline::Asynchronous(r.clone()),
        }
    }

    /// The reset, if any.
    pub fn reset(&self) -> Option<&Reset> {
        match self {
            ResetDiscipline::None => None,
            ResetDiscipline::Synchronous(r) | ResetDiscipline::Asynchronous(r) => Some(r),
        }
    }
}

/// What a triggered clocked process does in this delta cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockedAction {
    /// Drive the declared reset values.
    Reset,
    /// Run the body.
    Evaluate,
    /// Leave every register unchanged.
    Hold,
}

/// Returns true when the transition of the LSB from `prev` to `next` is the
/// requested edge. Only clean 0/1 transitions count.
pub fn detect_edge(prev: &LogicVec, next: &LogicVec, edge: Edge) -> bool {
    match edge {
        Edge::Rising => prev.lsb() == Logic::Zero && next.lsb() == Logic::One,
        Edge::Falling => prev.lsb() == Logic::One && next.lsb() == Logic::Zero,
        Edge::Any => {
            detect_edge(prev, next, Edge::Rising) || detect_edge(prev, next, Edge::Falling)
        }
    }
}

/// True if `reset` is asserted given the current value of its signal.
pub fn is_asserted(reset: &Reset, value: &LogicVec) -> bool {
    let active = if reset.active_high { Logic::One } else { Logic::Zero };
    value.lsb() == active
}

/// Clock domains and reset disciplines of a design.
#[derive(Debug, Clone, Default)]
pub struct DomainMap {
    domains: Vec<ClockDomain>,
    disciplines: BTreeMap<ProcessId, ResetDiscipline>,
}

impl DomainMap {
    /// Classifies every clocked process of `design`. Domains are ordered by
    /// their first member in scheduling order.
    pub fn classify(design: &Design) -> Self {
        let mut map = Self::default();
        for &pid in design.schedule_order() {
            let Some(clocking) = design.process(pid).sensitivity.clocking() else {
                continue;
            };
            map.disciplines
                .insert(pid, ResetDiscipline::of(clocking.reset.as_ref()));
            match map
                .domains
                .iter_mut()
                .find(|d| d.clock == clocking.clock && d.edge == clocking.edge)
            {
                Some(domain) => domain.processes.push(pid),
                None => map.domains.push(ClockDomain {
                    clock: clocking.clock,
                    edge: clocking.edge,
                    processes: vec![pid],
                }),
            }
        }
        log::debug!(
            "{} clock domain(s), {} clocked process(es)",
            map.domains.len(),
            map.disciplines.len()
        );
        map
    }

    /// All clock domains.
    pub fn domains(&self) -> &[ClockDomain] {
        &self.domains
    }

    /// Reset discipline of a clocked process, `None` for other processes.
    pub fn discipline(&self, process: ProcessId) -> Option<&ResetDiscipline> {
        self.disciplines.get(&process)
    }

    /// Clocked processes with an asynchronous reset, in id order.
    pub fn asynchronous(&self) -> impl Iterator<Item = (ProcessId, &Reset)> + '_ {
        self.disciplines.iter().filter_map(|(pid, d)| match d {
            ResetDiscipline::Asynchronous(r) => Some((*pid, r)),
            _ => None,
        })
    }

    /// Decides what `process` does when triggered. `clock_edge` tells whether
    /// its active clock edge fired in the last update phase; `reset_value`
    /// is the current value of its reset signal, if it has one.
    pub fn decide(
        &self,
        process: ProcessId,
        clock_edge: bool,
        reset_value: Option<&LogicVec>,
    ) -> ClockedAction {
        let asserted = |r: &Reset| reset_value.is_some_and(|v| is_asserted(r, v));
        match self.discipline(process) {
            Some(ResetDiscipline::Asynchronous(r)) if asserted(r) => ClockedAction::Reset,
            Some(ResetDiscipline::Synchronous(r)) if clock_edge && asserted(r) => {
                ClockedAction::Reset
            }
            _ if clock_edge => ClockedAction::Evaluate,
            _ => ClockedAction::Hold,
        }
    }
}
