//! Explicit elaboration context.
//!
//! A design is described by calling methods on an [`ElabContext`], a value
//! scoped to one instance. Child instances get their own context, passed to
//! the closure given to [`ElabContext::instance`]; nothing is registered
//! through global state, so elaboration is reentrant.
//!
//! ```
//! use sigflow_ir::{elaborate, Clocking, Expr, BinaryOp, Statement};
//!
//! let design = elaborate("top", |top| {
//!     let clk = top.clock("clk", 5)?;
//!     let q = top.register("q", 4)?;
//!     top.instance("inc", &[("clk", clk), ("q", q)], |c| {
//!         let clk = c.input("clk", 1)?;
//!         let q = c.output_register("q", 4)?;
//!         let next = Expr::binary(BinaryOp::Add, q.into(), Expr::constant(1, 4));
//!         c.clocked("tick", Clocking::rising(clk), &[q], Statement::assign(q, next))?;
//!         Ok(())
//!     })
//! })
//! .unwrap();
//! assert_eq!(design.find_signal("top.inc.q"), design.find_signal("top.q"));
//! ```

use crate::arena::Arena;
use crate::design::Design;
use crate::error::ElabError;
use crate::expr::Expr;
use crate::graph::SignalGraph;
use crate::ids::{InstanceId, ProcessId, SignalId};
use crate::instance::{Instance, Port, PortDirection};
use crate::process::{Clocking, Process, Sensitivity};
use crate::signal::SignalKind;
use crate::stmt::Statement;
use sigflow_common::LogicVec;
use std::collections::HashSet;

/// Owns a design under construction.
pub struct Elaborator {
    graph: SignalGraph,
    processes: Arena<ProcessId, Process>,
    instances: Arena<InstanceId, Instance>,
    /// Hierarchical names of signals, ports and instances.
    names: HashSet<String>,
    process_names: HashSet<String>,
}

impl Elaborator {
    /// Starts a design whose top instance is called `top`.
    pub fn new(top: &str) -> Self {
        let mut instances = Arena::new();
        let id = instances.next_id();
        instances.alloc(Instance {
            id,
            name: top.to_string(),
            path: top.to_string(),
            parent: None,
            ports: Vec::new(),
            signals: Vec::new(),
            processes: Vec::new(),
            children: Vec::new(),
        });
        Self {
            graph: SignalGraph::new(),
            processes: Arena::new(),
            instances,
            names: HashSet::from([top.to_string()]),
            process_names: HashSet::new(),
        }
    }

    /// Context for the top instance.
    pub fn top(&mut self) -> ElabContext<'_> {
        ElabContext {
            elab: self,
            instance: InstanceId::from_raw(0),
            bindings: Vec::new(),
        }
    }

    /// Completes elaboration.
    pub fn finish(self) -> Result<Design, ElabError> {
        let design = Design::assemble(self.graph, self.processes, self.instances)?;
        log::debug!(
            "elaborated '{}': {} signals, {} processes, {} instances",
            design.top().path,
            design.signal_count(),
            design.process_count(),
            design.instances().count()
        );
        Ok(design)
    }

    fn check_signal(&self, id: SignalId, context: impl FnOnce() -> String) -> Result<(), ElabError> {
        if self.graph.contains(id) {
            Ok(())
        } else {
            Err(ElabError::UnknownSignal {
                context: context(),
                id,
            })
        }
    }
}

/// Elaborates a design by running `build` against the top instance.
pub fn elaborate(
    top: &str,
    build: impl FnOnce(&mut ElabContext<'_>) -> Result<(), ElabError>,
) -> Result<Design, ElabError> {
    let mut elab = Elaborator::new(top);
    build(&mut elab.top())?;
    elab.finish()
}

struct Binding {
    port: String,
    signal: SignalId,
    used: bool,
}

/// Elaboration scope for one instance.
pub struct ElabContext<'a> {
    elab: &'a mut Elaborator,
    instance: InstanceId,
    bindings: Vec<Binding>,
}

impl ElabContext<'_> {
    /// The instance this context builds.
    pub fn id(&self) -> InstanceId {
        self.instance
    }

    /// Hierarchical path of the instance.
    pub fn path(&self) -> &str {
        &self.elab.instances[self.instance].path
    }

    /// Declares an all-zero wire.
    pub fn wire(&mut self, name: &str, width: u32) -> Result<SignalId, ElabError> {
        self.signal(name, SignalKind::Wire, LogicVec::new(width))
    }

    /// Declares an all-zero register.
    pub fn register(&mut self, name: &str, width: u32) -> Result<SignalId, ElabError> {
        self.signal(name, SignalKind::Register, LogicVec::new(width))
    }

    /// Declares a signal whose width is that of `init`.
    pub fn signal(
        &mut self,
        name: &str,
        kind: SignalKind,
        init: LogicVec,
    ) -> Result<SignalId, ElabError> {
        let path = self.claim(name)?;
        if init.width() == 0 {
            return Err(ElabError::ZeroWidth { name: path });
        }
        Ok(self.declare(path, init.width(), kind, init))
    }

    /// Declares an input port. If the parent bound a signal to `name`, that
    /// signal is returned; otherwise a fresh wire is declared.
    pub fn input(&mut self, name: &str, width: u32) -> Result<SignalId, ElabError> {
        self.port(name, width, PortDirection::Input, SignalKind::Wire)
    }

    /// Declares an output port backed by a wire when unbound.
    pub fn output(&mut self, name: &str, width: u32) -> Result<SignalId, ElabError> {
        self.port(name, width, PortDirection::Output, SignalKind::Wire)
    }

    /// Declares an output port backed by a register when unbound.
    pub fn output_register(&mut self, name: &str, width: u32) -> Result<SignalId, ElabError> {
        self.port(name, width, PortDirection::Output, SignalKind::Register)
    }

    /// Declares a free-running clock: a one-bit wire starting at 0 and a
    /// periodic process `<name>_gen` that inverts it every `half_period`
    /// ticks from time 0, giving rising edges at 0, 2*half_period, ...
    pub fn clock(&mut self, name: &str, half_period: u64) -> Result<SignalId, ElabError> {
        let clk = self.wire(name, 1)?;
        self.periodic(
            &format!("{name}_gen"),
            half_period,
            0,
            &[clk],
            Statement::assign(clk, Expr::not(clk.into())),
        )?;
        Ok(clk)
    }

    /// Declares a combinational process driving `writes`.
    pub fn combinational(
        &mut self,
        name: &str,
        writes: &[SignalId],
        body: Statement,
    ) -> Result<ProcessId, ElabError> {
        self.process(name, Sensitivity::Combinational, writes, body)
    }

    /// Declares a clocked process driving `writes`.
    pub fn clocked(
        &mut self,
        name: &str,
        clocking: Clocking,
        writes: &[SignalId],
        body: Statement,
    ) -> Result<ProcessId, ElabError> {
        self.process(name, Sensitivity::Clocked(clocking), writes, body)
    }

    /// Declares a process evaluated at `offset` and every `period` ticks after.
    pub fn periodic(
        &mut self,
        name: &str,
        period: u64,
        offset: u64,
        writes: &[SignalId],
        body: Statement,
    ) -> Result<ProcessId, ElabError> {
        self.process(name, Sensitivity::Periodic { period, offset }, writes, body)
    }

    /// Elaborates a child instance. `bindings` connect child port names to
    /// signals visible here; every binding must be claimed by a port
    /// declaration inside `build`.
    pub fn instance<T>(
        &mut self,
        name: &str,
        bindings: &[(&str, SignalId)],
        build: impl FnOnce(&mut ElabContext<'_>) -> Result<T, ElabError>,
    ) -> Result<T, ElabError> {
        let path = self.claim(name)?;
        for (port, signal) in bindings {
            self.elab
                .check_signal(*signal, || format!("binding '{path}.{port}'"))?;
        }
        let id = self.elab.instances.next_id();
        self.elab.instances.alloc(Instance {
            id,
            name: name.to_string(),
            path: path.clone(),
            parent: Some(self.instance),
            ports: Vec::new(),
            signals: Vec::new(),
            processes: Vec::new(),
            children: Vec::new(),
        });
        self.elab.instances[self.instance].children.push(id);

        let mut child = ElabContext {
            elab: &mut *self.elab,
            instance: id,
            bindings: bindings
                .iter()
                .map(|(port, signal)| Binding {
                    port: port.to_string(),
                    signal: *signal,
                    used: false,
                })
                .collect(),
        };
        let out = build(&mut child)?;
        if let Some(unused) = child.bindings.iter().find(|b| !b.used) {
            return Err(ElabError::UnknownPort {
                instance: path,
                port: unused.port.clone(),
            });
        }
        Ok(out)
    }

    fn claim(&mut self, name: &str) -> Result<String, ElabError> {
        let scope = self.path().to_string();
        let path = format!("{scope}.{name}");
        if name.is_empty() || name.contains('.') || !self.elab.names.insert(path.clone()) {
            return Err(ElabError::DuplicateName {
                scope,
                name: name.to_string(),
            });
        }
        Ok(path)
    }

    fn declare(&mut self, path: String, width: u32, kind: SignalKind, init: LogicVec) -> SignalId {
        let id = self.elab.graph.declare(path, width, kind, init, self.instance);
        self.elab.instances[self.instance].signals.push(id);
        id
    }

    fn port(
        &mut self,
        name: &str,
        width: u32,
        direction: PortDirection,
        kind: SignalKind,
    ) -> Result<SignalId, ElabError> {
        let path = self.claim(name)?;
        if width == 0 {
            return Err(ElabError::ZeroWidth { name: path });
        }
        let bound = self.bindings.iter_mut().find(|b| b.port == name);
        let signal = match bound {
            Some(binding) => {
                binding.used = true;
                let found = self.elab.graph.width(binding.signal);
                if found != width {
                    return Err(ElabError::PortWidthMismatch {
                        port: path,
                        expected: width,
                        found,
                    });
                }
                binding.signal
            }
            None => self.declare(path, width, kind, LogicVec::new(width)),
        };
        self.elab.instances[self.instance].ports.push(Port {
            name: name.to_string(),
            direction,
            signal,
        });
        Ok(signal)
    }

    fn process(
        &mut self,
        name: &str,
        sensitivity: Sensitivity,
        writes: &[SignalId],
        body: Statement,
    ) -> Result<ProcessId, ElabError> {
        let path = format!("{}.{name}", self.path());
        if name.is_empty() || !self.elab.process_names.insert(path.clone()) {
            return Err(ElabError::DuplicateName {
                scope: self.path().to_string(),
                name: name.to_string(),
            });
        }
        for &w in writes {
            self.elab
                .check_signal(w, || format!("write set of process '{path}'"))?;
        }
        match &sensitivity {
            Sensitivity::Periodic { period: 0, .. } => {
                return Err(ElabError::ZeroPeriod { process: path });
            }
            Sensitivity::Clocked(clocking) => self.check_clocking(&path, clocking, writes)?,
            _ => {}
        }

        let mut writes = writes.to_vec();
        writes.sort();
        writes.dedup();
        let mut reads = Vec::new();
        body.collect_reads(&mut reads);
        for &r in &reads {
            self.elab
                .check_signal(r, || format!("body of process '{path}'"))?;
        }
        reads.sort();
        reads.dedup();

        let inst = &self.elab.instances[self.instance];
        let index = inst.processes.len() as u32;
        let id = self.elab.processes.next_id();
        self.elab.processes.alloc(Process {
            id,
            name: path,
            instance: self.instance,
            index,
            body,
            sensitivity,
            writes,
            reads,
        });
        self.elab.instances[self.instance].processes.push(id);
        Ok(id)
    }

    fn check_clocking(
        &self,
        path: &str,
        clocking: &Clocking,
        writes: &[SignalId],
    ) -> Result<(), ElabError> {
        self.elab
            .check_signal(clocking.clock, || format!("clock of process '{path}'"))?;
        let Some(reset) = &clocking.reset else {
            return Ok(());
        };
        self.elab
            .check_signal(reset.signal, || format!("reset of process '{path}'"))?;
        for (register, value) in &reset.values {
            self.elab
                .check_signal(*register, || format!("reset values of process '{path}'"))?;
            let signal = self.elab.graph.get(*register);
            let reason = if !writes.contains(register) {
                Some("the process does not drive this signal".to_string())
            } else if value.width() != signal.width {
                Some(format!(
                    "value is {} bits wide, signal is {}",
                    value.width(),
                    signal.width
                ))
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(ElabError::ResetValue {
                    process: path.to_string(),
                    signal: signal.name.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Reset;

    #[test]
    fn ports_share_the_parent_signal() {
        let design = elaborate("top", |top| {
            let d = top.wire("d", 8)?;
            top.instance("u0", &[("din", d)], |c| {
                let din = c.input("din", 8)?;
                assert_eq!(din, d);
                let local = c.output("dout", 8)?;
                assert_ne!(local, d);
                Ok(())
            })
        })
        .unwrap();
        let d = design.find_signal("top.d").unwrap();
        assert_eq!(design.find_signal("top.u0.din"), Some(d));
        let u0 = design.instance(crate::ids::InstanceId::from_raw(1));
        assert_eq!(u0.path, "top.u0");
        assert!(u0.is_input(d));
        // The unbound output is owned by the child.
        let dout = design.find_signal("top.u0.dout").unwrap();
        assert_eq!(design.signal(dout).owner, u0.id);
        assert_eq!(u0.signals, vec![dout]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = elaborate("top", |top| {
            top.wire("a", 1)?;
            top.register("a", 2)?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, ElabError::DuplicateName { ref name, .. } if name == "a"));
    }

    #[test]
    fn port_width_mismatch_is_an_elaboration_error() {
        let err = elaborate("top", |top| {
            let d = top.wire("d", 4)?;
            top.instance("u0", &[("din", d)], |c| c.input("din", 8).map(|_| ()))
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ElabError::PortWidthMismatch { expected: 8, found: 4, .. }
        ));
    }

    #[test]
    fn unclaimed_binding_is_an_error() {
        let err = elaborate("top", |top| {
            let d = top.wire("d", 1)?;
            top.instance("u0", &[("typo", d)], |_| Ok(()))
        })
        .unwrap_err();
        assert!(matches!(err, ElabError::UnknownPort { ref port, .. } if port == "typo"));
    }

    #[test]
    fn zero_width_is_rejected() {
        let err = elaborate("top", |top| top.wire("w", 0).map(|_| ())).unwrap_err();
        assert!(matches!(err, ElabError::ZeroWidth { .. }));
    }

    #[test]
    fn reset_values_must_match_driven_registers() {
        let err = elaborate("top", |top| {
            let clk = top.wire("clk", 1)?;
            let rst = top.wire("rst", 1)?;
            let q = top.register("q", 4)?;
            let reset = Reset::synchronous(rst, vec![(q, LogicVec::new(3))]);
            top.clocked(
                "ff",
                Clocking::rising(clk).with_reset(reset),
                &[q],
                Statement::Hold(q),
            )?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, ElabError::ResetValue { ref reason, .. } if reason.contains("3 bits")));
    }

    #[test]
    fn foreign_signal_ids_are_rejected() {
        let err = elaborate("top", |top| {
            let q = top.wire("q", 1)?;
            top.combinational(
                "p",
                &[q],
                Statement::assign(q, SignalId::from_raw(77)),
            )?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, ElabError::UnknownSignal { .. }));
    }

    #[test]
    fn clock_helper_declares_generator() {
        let design = elaborate("top", |top| top.clock("clk", 5).map(|_| ())).unwrap();
        let gen = design.find_process("top.clk_gen").unwrap();
        let clk = design.find_signal("top.clk").unwrap();
        assert_eq!(
            design.process(gen).sensitivity,
            Sensitivity::Periodic { period: 5, offset: 0 }
        );
        assert_eq!(design.signal(clk).drivers, vec![gen]);
        assert_eq!(design.process(gen).reads, vec![clk]);
    }

    #[test]
    fn zero_period_is_rejected() {
        let err = elaborate("top", |top| {
            top.periodic("stim", 0, 0, &[], Statement::Nop)?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, ElabError::ZeroPeriod { .. }));
    }

    #[test]
    fn oversized_repeat_is_rejected() {
        let err = elaborate("top", |top| {
            let a = top.wire("a", 8)?;
            let y = top.wire("y", 8)?;
            let huge = Expr::Repeat {
                expr: Box::new(a.into()),
                count: u32::MAX,
            };
            top.combinational("wide", &[y], Statement::assign(y, Expr::slice(huge, 7, 0)))?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ElabError::OversizedRepeat { ref process, count: u32::MAX, .. } if process == "top.wide"
        ));

        // Just under the limit is fine.
        let ok = elaborate("top", |top| {
            let a = top.wire("a", 1)?;
            let y = top.wire("y", 1)?;
            let rep = Expr::Repeat {
                expr: Box::new(a.into()),
                count: crate::expr::MAX_REPEAT_WIDTH,
            };
            top.combinational("wide", &[y], Statement::assign(y, Expr::slice(rep, 0, 0)))?;
            Ok(())
        });
        assert!(ok.is_ok());
    }

    #[test]
    fn elaborator_can_be_driven_step_by_step() {
        let mut elab = Elaborator::new("chip");
        {
            let mut top = elab.top();
            assert_eq!(top.path(), "chip");
            top.wire("a", 1).unwrap();
        }
        let design = elab.finish().unwrap();
        assert!(design.find_signal("chip.a").is_some());
    }
}
