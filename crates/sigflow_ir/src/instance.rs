//! Module instances and their ports.

use crate::ids::{InstanceId, ProcessId, SignalId};
use serde::{Deserialize, Serialize};

/// Direction of a port, seen from inside the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Driven by the parent; read-only inside the instance.
    Input,
    /// Driven inside the instance.
    Output,
}

/// A named connection to a signal.
///
/// When the parent binds the port, `signal` is the parent's own signal: reads
/// and writes through the port act on that one signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Local port name.
    pub name: String,
    /// Direction.
    pub direction: PortDirection,
    /// Connected signal.
    pub signal: SignalId,
}

/// One node of the instance tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Identity; also the elaboration order.
    pub id: InstanceId,
    /// Local name.
    pub name: String,
    /// Hierarchical path, e.g. `top.counter`.
    pub path: String,
    /// Parent, `None` for the top instance.
    pub parent: Option<InstanceId>,
    /// Ports in declaration order.
    pub ports: Vec<Port>,
    /// Signals owned by this instance, in declaration order.
    pub signals: Vec<SignalId>,
    /// Processes owned by this instance, in declaration order.
    pub processes: Vec<ProcessId>,
    /// Child instances, in elaboration order.
    pub children: Vec<InstanceId>,
}

impl Instance {
    /// Looks up a port by local name.
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// True if `signal` is connected to an input port of this instance.
    pub fn is_input(&self, signal: SignalId) -> bool {
        self.ports
            .iter()
            .any(|p| p.signal == signal && p.direction == PortDirection::Input)
    }
}
