//! The signal graph: every signal with its driver and observer relations.

use crate::arena::Arena;
use crate::ids::{InstanceId, ProcessId, SignalId};
use crate::signal::{Signal, SignalKind};
use serde::{Deserialize, Serialize};
use sigflow_common::LogicVec;

/// All signals of a design.
///
/// Structure only: which process drives a signal and which processes are
/// sensitive to it. It is built once during elaboration and never changes
/// while a simulation runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalGraph {
    signals: Arena<SignalId, Signal>,
}

impl SignalGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a signal with no drivers or observers.
    pub fn declare(
        &mut self,
        name: String,
        width: u32,
        kind: SignalKind,
        init: LogicVec,
        owner: InstanceId,
    ) -> SignalId {
        let id = self.signals.next_id();
        self.signals.alloc(Signal {
            id,
            name,
            width,
            kind,
            init,
            owner,
            drivers: Vec::new(),
            observers: Vec::new(),
        })
    }

    /// Registers `driver` as a driver of `signal`. Registering twice is a no-op.
    pub fn connect(&mut self, driver: ProcessId, signal: SignalId) {
        let drivers = &mut self.signals[signal].drivers;
        if !drivers.contains(&driver) {
            drivers.push(driver);
        }
    }

    /// Registers `process` as sensitive to `signal`. Registering twice is a no-op.
    pub fn observe(&mut self, process: ProcessId, signal: SignalId) {
        let observers = &mut self.signals[signal].observers;
        if !observers.contains(&process) {
            observers.push(process);
        }
    }

    /// Drops every driver and observer registration.
    pub(crate) fn clear_relations(&mut self) {
        for signal in self.signals.values_mut() {
            signal.drivers.clear();
            signal.observers.clear();
        }
    }

    /// Returns the signal.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this graph.
    pub fn get(&self, id: SignalId) -> &Signal {
        &self.signals[id]
    }

    /// Returns the signal, or `None` for a foreign id.
    pub fn try_get(&self, id: SignalId) -> Option<&Signal> {
        self.signals.try_get(id)
    }

    /// True if `id` was issued by this graph.
    pub fn contains(&self, id: SignalId) -> bool {
        self.signals.contains(id)
    }

    /// Width of a signal.
    pub fn width(&self, id: SignalId) -> u32 {
        self.signals[id].width
    }

    /// Iterates signals in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }

    /// Number of signals.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// True if the graph has no signals.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}
