//! Processes and their sensitivity classification.

use crate::ids::{InstanceId, ProcessId, SignalId};
use crate::stmt::Statement;
use serde::{Deserialize, Serialize};
use sigflow_common::LogicVec;
use std::fmt;

/// Active clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    /// 0 to 1.
    Rising,
    /// 1 to 0.
    Falling,
    /// Either transition between 0 and 1.
    Any,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Edge::Rising => "rising",
            Edge::Falling => "falling",
            Edge::Any => "any",
        })
    }
}

/// How a reset interacts with the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResetKind {
    /// Sampled together with the active clock edge.
    Synchronous,
    /// Acts as soon as it is asserted, independent of the clock.
    Asynchronous,
}

/// Reset attached to a clocked process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reset {
    /// Reset signal; its LSB is tested.
    pub signal: SignalId,
    /// Synchronous or asynchronous.
    pub kind: ResetKind,
    /// Asserted when the LSB is 1 (`true`) or 0 (`false`).
    pub active_high: bool,
    /// Value forced onto each register while reset applies.
    pub values: Vec<(SignalId, LogicVec)>,
}

impl Reset {
    /// Active-high synchronous reset.
    pub fn synchronous(signal: SignalId, values: Vec<(SignalId, LogicVec)>) -> Self {
        Self {
            signal,
            kind: ResetKind::Synchronous,
            active_high: true,
            values,
        }
    }

    /// Active-high asynchronous reset.
    pub fn asynchronous(signal: SignalId, values: Vec<(SignalId, LogicVec)>) -> Self {
        Self {
            signal,
            kind: ResetKind::Asynchronous,
            active_high: true,
            values,
        }
    }

    /// Makes the reset active-low.
    pub fn active_low(mut self) -> Self {
        self.active_high = false;
        self
    }

    /// Declared reset value for `register`.
    pub fn value_for(&self, register: SignalId) -> Option<&LogicVec> {
        self.values
            .iter()
            .find(|(id, _)| *id == register)
            .map(|(_, v)| v)
    }
}

/// Clock, edge and optional reset of a clocked process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clocking {
    /// Clock signal; its LSB is tested.
    pub clock: SignalId,
    /// Active edge.
    pub edge: Edge,
    /// Optional reset.
    pub reset: Option<Reset>,
}

impl Clocking {
    /// Rising-edge clocking without reset.
    pub fn rising(clock: SignalId) -> Self {
        Self {
            clock,
            edge: Edge::Rising,
            reset: None,
        }
    }

    /// Falling-edge clocking without reset.
    pub fn falling(clock: SignalId) -> Self {
        Self {
            clock,
            edge: Edge::Falling,
            reset: None,
        }
    }

    /// Attaches a reset.
    pub fn with_reset(mut self, reset: Reset) -> Self {
        self.reset = Some(reset);
        self
    }
}

/// When a process is re-evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sensitivity {
    /// On any change of a signal the body reads.
    Combinational,
    /// On the active edge of a clock, or a change of an asynchronous reset.
    Clocked(Clocking),
    /// At `offset`, then every `period` ticks. Used for clock generators and
    /// other stimulus; never part of the synthesized design.
    Periodic {
        /// Ticks between evaluations, at least 1.
        period: u64,
        /// Time of the first evaluation.
        offset: u64,
    },
}

/// Coarse class of a [`Sensitivity`], as exported to netlist generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessClass {
    /// Combinational logic.
    Combinational,
    /// Edge-triggered logic.
    Clocked,
    /// Time-driven stimulus.
    Periodic,
}

impl fmt::Display for ProcessClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProcessClass::Combinational => "combinational",
            ProcessClass::Clocked => "clocked",
            ProcessClass::Periodic => "periodic",
        })
    }
}

impl Sensitivity {
    /// The coarse class.
    pub fn class(&self) -> ProcessClass {
        match self {
            Sensitivity::Combinational => ProcessClass::Combinational,
            Sensitivity::Clocked(_) => ProcessClass::Clocked,
            Sensitivity::Periodic { .. } => ProcessClass::Periodic,
        }
    }

    /// Clocking, for clocked processes.
    pub fn clocking(&self) -> Option<&Clocking> {
        match self {
            Sensitivity::Clocked(c) => Some(c),
            _ => None,
        }
    }
}

/// A unit of re-evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    /// Identity.
    pub id: ProcessId,
    /// Hierarchical name.
    pub name: String,
    /// Owning instance.
    pub instance: InstanceId,
    /// Declaration position within the owning instance.
    pub index: u32,
    /// Body.
    pub body: Statement,
    /// Re-evaluation condition.
    pub sensitivity: Sensitivity,
    /// Signals the process is registered to drive, sorted by id.
    pub writes: Vec<SignalId>,
    /// Signals the body reads, sorted by id.
    pub reads: Vec<SignalId>,
}

impl Process {
    /// Signals whose change may reactivate this process: the read set for
    /// combinational processes, the clock and any asynchronous reset for
    /// clocked ones, nothing for periodic ones.
    pub fn triggers(&self) -> Vec<SignalId> {
        match &self.sensitivity {
            Sensitivity::Combinational => self.reads.clone(),
            Sensitivity::Clocked(c) => {
                let mut out = vec![c.clock];
                if let Some(r) = c.reset.as_ref().filter(|r| r.kind == ResetKind::Asynchronous) {
                    if r.signal != c.clock {
                        out.push(r.signal);
                    }
                }
                out
            }
            Sensitivity::Periodic { .. } => Vec::new(),
        }
    }

    /// Deterministic evaluation rank: instance elaboration order, then
    /// declaration order within the instance.
    pub fn rank(&self) -> (u32, u32) {
        (self.instance.as_raw(), self.index)
    }

    /// True if the process is registered to drive `signal`.
    pub fn writes_to(&self, signal: SignalId) -> bool {
        self.writes.binary_search(&signal).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(sensitivity: Sensitivity) -> Process {
        Process {
            id: ProcessId::from_raw(0),
            name: "top.p".to_string(),
            instance: InstanceId::from_raw(2),
            index: 5,
            body: Statement::Nop,
            sensitivity,
            writes: vec![SignalId::from_raw(1), SignalId::from_raw(4)],
            reads: vec![SignalId::from_raw(7)],
        }
    }

    #[test]
    fn combinational_triggers_on_reads() {
        let p = process(Sensitivity::Combinational);
        assert_eq!(p.triggers(), vec![SignalId::from_raw(7)]);
        assert_eq!(p.sensitivity.class(), ProcessClass::Combinational);
    }

    #[test]
    fn clocked_triggers_on_clock_and_async_reset_only() {
        let clk = SignalId::from_raw(8);
        let rst = SignalId::from_raw(9);
        let sync = process(Sensitivity::Clocked(
            Clocking::rising(clk).with_reset(Reset::synchronous(rst, Vec::new())),
        ));
        assert_eq!(sync.triggers(), vec![clk]);
        let asynch = process(Sensitivity::Clocked(
            Clocking::falling(clk).with_reset(Reset::asynchronous(rst, Vec::new()).active_low()),
        ));
        assert_eq!(asynch.triggers(), vec![clk, rst]);
        assert!(!asynch.sensitivity.clocking().unwrap().reset.as_ref().unwrap().active_high);
    }

    #[test]
    fn periodic_has_no_signal_triggers() {
        let p = process(Sensitivity::Periodic { period: 5, offset: 0 });
        assert!(p.triggers().is_empty());
        assert_eq!(p.sensitivity.class().to_string(), "periodic");
    }

    #[test]
    fn rank_and_write_lookup() {
        let p = process(Sensitivity::Combinational);
        assert_eq!(p.rank(), (2, 5));
        assert!(p.writes_to(SignalId::from_raw(4)));
        assert!(!p.writes_to(SignalId::from_raw(2)));
    }

    #[test]
    fn reset_value_lookup() {
        let q = SignalId::from_raw(3);
        let r = Reset::synchronous(SignalId::from_raw(0), vec![(q, LogicVec::from_u64(2, 2))]);
        assert_eq!(r.value_for(q).and_then(|v| v.to_u64()), Some(2));
        assert!(r.value_for(SignalId::from_raw(4)).is_none());
    }
}
