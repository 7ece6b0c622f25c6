//! Runtime signal values with two-phase update.
//!
//! Each signal has a current value, visible to every read, and an optional
//! pending value written during the active phase. [`SignalStore::commit`]
//! moves all pending values into place at once, so no read ever observes a
//! write from the same delta cycle.

use sigflow_common::{InternalError, LogicVec};
use sigflow_ir::{Design, ProcessId, SignalId};

use crate::error::SimError;

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    value: LogicVec,
    pending: Option<LogicVec>,
    drivers: Vec<ProcessId>,
}

/// A signal whose value changed in an update phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// The signal.
    pub signal: SignalId,
    /// Settled value before the update.
    pub previous: LogicVec,
}

/// Current and pending values of every signal in a design.
#[derive(Debug, Clone)]
pub struct SignalStore {
    slots: Vec<Slot>,
    /// Signals with a pending value, in first-write order.
    dirty: Vec<SignalId>,
}

impl SignalStore {
    /// Creates a store holding every signal's initial value.
    pub fn new(design: &Design) -> Self {
        let slots = design
            .signals()
            .map(|s| Slot {
                name: s.name.clone(),
                value: s.init.clone(),
                pending: None,
                drivers: s.drivers.clone(),
            })
            .collect();
        Self {
            slots,
            dirty: Vec::new(),
        }
    }

    fn slot(&self, signal: SignalId) -> Result<&Slot, InternalError> {
        self.slots
            .get(signal.as_raw() as usize)
            .ok_or_else(|| InternalError::new(format!("no value slot for signal {signal}")))
    }

    fn slot_mut(&mut self, signal: SignalId) -> Result<&mut Slot, InternalError> {
        self.slots
            .get_mut(signal.as_raw() as usize)
            .ok_or_else(|| InternalError::new(format!("no value slot for signal {signal}")))
    }

    /// Current value of `signal`.
    pub fn read(&self, signal: SignalId) -> Result<&LogicVec, InternalError> {
        Ok(&self.slot(signal)?.value)
    }

    /// Hierarchical name of `signal`.
    pub fn name(&self, signal: SignalId) -> Result<&str, InternalError> {
        Ok(&self.slot(signal)?.name)
    }

    /// True if `signal` has at least one registered driver process.
    pub fn is_driven(&self, signal: SignalId) -> Result<bool, InternalError> {
        Ok(!self.slot(signal)?.drivers.is_empty())
    }

    /// Records a pending write of bits `low..low + value.width()` by
    /// `process`. The current value is untouched until [`commit`](Self::commit).
    ///
    /// Fails with [`SimError::DriverViolation`] if `process` is not a
    /// registered driver of `signal`.
    pub fn write(
        &mut self,
        process: ProcessId,
        process_name: &str,
        signal: SignalId,
        low: u32,
        value: &LogicVec,
    ) -> Result<(), SimError> {
        let slot = self.slot(signal)?;
        if !slot.drivers.contains(&process) {
            return Err(SimError::DriverViolation {
                signal: slot.name.clone(),
                driver: process_name.to_string(),
            });
        }
        self.stage(signal, low, value)?;
        Ok(())
    }

    /// Records a pending whole-signal write from outside the design
    /// (testbench stimulus). Callers check driver ownership themselves.
    pub fn stage_external(&mut self, signal: SignalId, value: &LogicVec) -> Result<(), InternalError> {
        self.stage(signal, 0, value)
    }

    fn stage(&mut self, signal: SignalId, low: u32, value: &LogicVec) -> Result<(), InternalError> {
        let slot = self.slot_mut(signal)?;
        // A slot is listed in `dirty` exactly while its pending value is set.
        let first = slot.pending.is_none();
        if first {
            slot.pending = Some(slot.value.clone());
        }
        if let Some(pending) = slot.pending.as_mut() {
            pending.splice(low, value);
        }
        if first {
            self.dirty.push(signal);
        }
        Ok(())
    }

    /// Overwrites the current value directly, bypassing the update phase.
    /// Only valid before the first instant is simulated.
    pub fn initialize(&mut self, signal: SignalId, value: LogicVec) -> Result<(), InternalError> {
        self.slot_mut(signal)?.value = value;
        Ok(())
    }

    /// True if any write is pending.
    pub fn has_pending(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Applies every pending value and returns the signals whose value
    /// actually changed, in ascending id order.
    pub fn commit(&mut self) -> Vec<Change> {
        let mut dirty = std::mem::take(&mut self.dirty);
        dirty.sort();
        let mut changes = Vec::new();
        for signal in dirty {
            let Some(slot) = self.slots.get_mut(signal.as_raw() as usize) else {
                continue;
            };
            let Some(next) = slot.pending.take() else {
                continue;
            };
            if next != slot.value {
                let previous = std::mem::replace(&mut slot.value, next);
                changes.push(Change { signal, previous });
            }
        }
        changes
    }

    /// Drops every pending write.
    pub fn discard_pending(&mut self) {
        for signal in std::mem::take(&mut self.dirty) {
            if let Some(slot) = self.slots.get_mut(signal.as_raw() as usize) {
                slot.pending = None;
            }
        }
    }

    /// Number of signals.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the design has no signals.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
