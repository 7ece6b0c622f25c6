//! Signals: the nets and registers of the design.

use crate::ids::{InstanceId, ProcessId, SignalId};
use serde::{Deserialize, Serialize};
use sigflow_common::LogicVec;
use std::fmt;

/// Hardware kind of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// A net with at most one continuous (combinational) driver.
    Wire,
    /// State held between clock edges, with exactly one clocked driver.
    Register,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalKind::Wire => "wire",
            SignalKind::Register => "register",
        })
    }
}

/// Structural record of one signal.
///
/// Runtime values are not stored here; the simulator keeps current and
/// pending values in its own store indexed by [`SignalId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// Identity.
    pub id: SignalId,
    /// Hierarchical name, e.g. `top.counter.count`.
    pub name: String,
    /// Bit width, at least 1.
    pub width: u32,
    /// Wire or register.
    pub kind: SignalKind,
    /// Value before any process or testbench has written the signal.
    pub init: LogicVec,
    /// Instance that declared the signal.
    pub owner: InstanceId,
    /// Processes registered as drivers, in registration order.
    pub drivers: Vec<ProcessId>,
    /// Processes sensitive to the signal, in scheduling order.
    pub observers: Vec<ProcessId>,
}

impl Signal {
    /// Local name, the last component of the hierarchical name.
    pub fn local_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// True if some process drives this signal.
    pub fn is_driven(&self) -> bool {
        !self.drivers.is_empty()
    }
}

/// Destination of an assignment: a whole signal or a constant bit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalRef {
    /// The whole signal.
    Signal(SignalId),
    /// Bits `high..=low` of a signal.
    Slice {
        /// Target signal.
        signal: SignalId,
        /// Most significant bit, inclusive.
        high: u32,
        /// Least significant bit, inclusive.
        low: u32,
    },
}

impl SignalRef {
    /// The signal being assigned.
    pub fn signal(&self) -> SignalId {
        match *self {
            SignalRef::Signal(id) | SignalRef::Slice { signal: id, .. } => id,
        }
    }

    /// Width of the destination given the full signal width.
    pub fn width(&self, signal_width: u32) -> u32 {
        match *self {
            SignalRef::Signal(_) => signal_width,
            SignalRef::Slice { high, low, .. } => high.saturating_sub(low) + 1,
        }
    }

    /// True if this assignment covers every bit of the signal.
    pub fn is_whole(&self, signal_width: u32) -> bool {
        match *self {
            SignalRef::Signal(_) => true,
            SignalRef::Slice { high, low, .. } => low == 0 && high + 1 >= signal_width,
        }
    }
}

impl From<SignalId> for SignalRef {
    fn from(id: SignalId) -> Self {
        SignalRef::Signal(id)
    }
}
