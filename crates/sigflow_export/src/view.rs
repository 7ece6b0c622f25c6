//! The structural netlist view handed to external generators.
//!
//! A [`NetlistView`] is a flat, serializable copy of a checked design:
//! instances with their ports, signals with width and kind, and processes
//! with their sensitivity, read and write sets and bodies. Relations that
//! the design derives (drivers, observers, child lists) are left out and
//! rebuilt on import.

use serde::{Deserialize, Serialize};
use sigflow_check::CheckedDesign;
use sigflow_common::{ContentHash, LogicVec};
use sigflow_ir::{
    Arena, Design, Instance, InstanceId, Port, Process, ProcessClass, ProcessId, Sensitivity,
    SignalGraph, SignalId, SignalKind, Statement,
};

use crate::error::ExportError;

/// One instance of the design tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceView {
    /// Instance id, equal to its position in [`NetlistView::instances`].
    pub id: InstanceId,
    /// Local name.
    pub name: String,
    /// Dotted hierarchical path.
    pub path: String,
    /// Enclosing instance; `None` only for the top.
    pub parent: Option<InstanceId>,
    /// Ports in declaration order.
    pub ports: Vec<Port>,
}

/// One signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalView {
    /// Signal id, equal to its position in [`NetlistView::signals`].
    pub id: SignalId,
    /// Hierarchical name.
    pub name: String,
    /// Width in bits.
    pub width: u32,
    /// Wire or register.
    pub kind: SignalKind,
    /// Value at time zero.
    pub init: LogicVec,
    /// Instance that declared the signal.
    pub owner: InstanceId,
}

/// One process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessView {
    /// Process id, equal to its position in [`NetlistView::processes`].
    pub id: ProcessId,
    /// Hierarchical name.
    pub name: String,
    /// Owning instance.
    pub instance: InstanceId,
    /// Declaration index within the owning instance.
    pub index: u32,
    /// Coarse classification, always `sensitivity.class()`.
    pub class: ProcessClass,
    /// Full sensitivity, including clock edge and reset.
    pub sensitivity: Sensitivity,
    /// Signals the process drives.
    pub writes: Vec<SignalId>,
    /// Signals the body reads.
    pub reads: Vec<SignalId>,
    /// Process body.
    pub body: Statement,
}

/// Structural snapshot of a checked design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetlistView {
    /// Name of the top instance.
    pub top: String,
    /// Instances in elaboration order, top first.
    pub instances: Vec<InstanceView>,
    /// Signals in id order.
    pub signals: Vec<SignalView>,
    /// Processes in id order.
    pub processes: Vec<ProcessView>,
}

impl NetlistView {
    /// Exports a design the checker accepted.
    pub fn from_checked(checked: &CheckedDesign) -> Self {
        let view = Self::from_design(checked.design());
        log::debug!(
            "exported `{}`: {} instances, {} signals, {} processes",
            view.top,
            view.instances.len(),
            view.signals.len(),
            view.processes.len()
        );
        view
    }

    fn from_design(design: &Design) -> Self {
        let instances = design
            .instances()
            .map(|inst| InstanceView {
                id: inst.id,
                name: inst.name.clone(),
                path: inst.path.clone(),
                parent: inst.parent,
                ports: inst.ports.clone(),
            })
            .collect();
        let signals = design
            .signals()
            .map(|s| SignalView {
                id: s.id,
                name: s.name.clone(),
                width: s.width,
                kind: s.kind,
                init: s.init.clone(),
                owner: s.owner,
            })
            .collect();
        let processes = design
            .processes()
            .map(|p| ProcessView {
                id: p.id,
                name: p.name.clone(),
                instance: p.instance,
                index: p.index,
                class: p.sensitivity.class(),
                sensitivity: p.sensitivity.clone(),
                writes: p.writes.clone(),
                reads: p.reads.clone(),
                body: p.body.clone(),
            })
            .collect();
        Self {
            top: design.top().name.clone(),
            instances,
            signals,
            processes,
        }
    }

    /// Rebuilds a [`Design`] from the view.
    ///
    /// The result is not checked; pass it through the checker before
    /// simulating it.
    pub fn into_design(&self) -> Result<Design, ExportError> {
        self.validate()?;

        let mut graph = SignalGraph::new();
        for s in &self.signals {
            graph.declare(s.name.clone(), s.width, s.kind, s.init.clone(), s.owner);
        }

        let mut processes = Arena::new();
        for p in &self.processes {
            processes.alloc(Process {
                id: p.id,
                name: p.name.clone(),
                instance: p.instance,
                index: p.index,
                body: p.body.clone(),
                sensitivity: p.sensitivity.clone(),
                writes: p.writes.clone(),
                reads: p.reads.clone(),
            });
        }

        let mut instances = Arena::new();
        for inst in &self.instances {
            instances.alloc(Instance {
                id: inst.id,
                name: inst.name.clone(),
                path: inst.path.clone(),
                parent: inst.parent,
                ports: inst.ports.clone(),
                signals: self
                    .signals
                    .iter()
                    .filter(|s| s.owner == inst.id)
                    .map(|s| s.id)
                    .collect(),
                processes: self
                    .processes
                    .iter()
                    .filter(|p| p.instance == inst.id)
                    .map(|p| p.id)
                    .collect(),
                children: self
                    .instances
                    .iter()
                    .filter(|c| c.parent == Some(inst.id))
                    .map(|c| c.id)
                    .collect(),
            });
        }

        Ok(Design::assemble(graph, processes, instances)?)
    }

    fn validate(&self) -> Result<(), ExportError> {
        let malformed = |reason: String| Err(ExportError::MalformedView { reason });

        for (i, inst) in self.instances.iter().enumerate() {
            if inst.id != InstanceId::from_raw(i as u32) {
                return malformed(format!("instance `{}` is out of order", inst.path));
            }
            // Pre-order: a parent is always allocated before its children.
            if let Some(parent) = inst.parent {
                if parent.as_raw() as usize >= i {
                    return malformed(format!(
                        "instance `{}` precedes its parent {parent}",
                        inst.path
                    ));
                }
            }
        }
        match self.instances.first() {
            Some(top) if top.name == self.top => {}
            _ => return malformed(format!("top instance `{}` is not first", self.top)),
        }

        let instance_count = self.instances.len();
        for (i, s) in self.signals.iter().enumerate() {
            if s.id != SignalId::from_raw(i as u32) {
                return malformed(format!("signal `{}` is out of order", s.name));
            }
            if s.owner.as_raw() as usize >= instance_count {
                return malformed(format!("signal `{}` has unknown owner {}", s.name, s.owner));
            }
            if s.init.width() != s.width {
                return malformed(format!(
                    "signal `{}` is {} bits wide but its initial value has {}",
                    s.name,
                    s.width,
                    s.init.width()
                ));
            }
        }

        for (i, p) in self.processes.iter().enumerate() {
            if p.id != ProcessId::from_raw(i as u32) {
                return malformed(format!("process `{}` is out of order", p.name));
            }
            if p.instance.as_raw() as usize >= instance_count {
                return malformed(format!(
                    "process `{}` has unknown instance {}",
                    p.name, p.instance
                ));
            }
            if p.class != p.sensitivity.class() {
                return malformed(format!(
                    "process `{}` is classified {} but its sensitivity is {}",
                    p.name,
                    p.class,
                    p.sensitivity.class()
                ));
            }
        }
        Ok(())
    }

    /// Structural content hash over the binary encoding of the view.
    ///
    /// Two views with equal fingerprints describe the same design.
    pub fn fingerprint(&self) -> Result<ContentHash, ExportError> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(
            |e| ExportError::Serialization {
                reason: e.to_string(),
            },
        )?;
        Ok(ContentHash::from_bytes(&bytes))
    }

    /// Looks up a signal by hierarchical name.
    pub fn find_signal(&self, name: &str) -> Option<&SignalView> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Looks up a process by hierarchical name.
    pub fn find_process(&self, name: &str) -> Option<&ProcessView> {
        self.processes.iter().find(|p| p.name == name)
    }

    /// The process that drives `signal`, if any.
    pub fn driver_of(&self, signal: SignalId) -> Option<&ProcessView> {
        self.processes.iter().find(|p| p.writes.contains(&signal))
    }

    /// Processes a generator must emit as hardware, in id order. Periodic
    /// stimulus is left out.
    pub fn synthesizable(&self) -> impl Iterator<Item = &ProcessView> {
        self.processes
            .iter()
            .filter(|p| p.class != ProcessClass::Periodic)
    }
}
