//! The elaborated design: signal graph, processes and instance tree.

use crate::arena::Arena;
use crate::error::ElabError;
use crate::expr::{Expr, MAX_REPEAT_WIDTH};
use crate::graph::SignalGraph;
use crate::ids::{InstanceId, ProcessId, SignalId};
use crate::instance::Instance;
use crate::process::{Process, Sensitivity};
use crate::signal::Signal;
use std::collections::HashMap;

/// An immutable, fully elaborated design.
///
/// Drivers and observers of every signal are derived from the processes when
/// the design is assembled, so they always agree with the process write sets
/// and sensitivities.
#[derive(Debug, Clone)]
pub struct Design {
    graph: SignalGraph,
    processes: Arena<ProcessId, Process>,
    instances: Arena<InstanceId, Instance>,
    schedule: Vec<ProcessId>,
    signal_names: HashMap<String, SignalId>,
    process_names: HashMap<String, ProcessId>,
}

impl Design {
    /// Assembles a design from its parts, rebuilding driver and observer
    /// relations and name indexes.
    ///
    /// Instance `i0` must be the only instance without a parent, and every
    /// signal id referenced by a process or port must exist in `graph`.
    pub fn assemble(
        mut graph: SignalGraph,
        processes: Arena<ProcessId, Process>,
        instances: Arena<InstanceId, Instance>,
    ) -> Result<Self, ElabError> {
        validate_tree(&instances)?;
        for process in processes.values() {
            validate_process(&graph, process)?;
        }
        for inst in instances.values() {
            for port in &inst.ports {
                if !graph.contains(port.signal) {
                    return Err(ElabError::UnknownSignal {
                        context: format!("port '{}.{}'", inst.path, port.name),
                        id: port.signal,
                    });
                }
            }
        }

        let mut schedule: Vec<ProcessId> = processes.iter().map(|(id, _)| id).collect();
        schedule.sort_by_key(|id| processes[*id].rank());

        graph.clear_relations();
        for &pid in &schedule {
            let process = &processes[pid];
            for &w in &process.writes {
                graph.connect(pid, w);
            }
            for t in process.triggers() {
                graph.observe(pid, t);
            }
        }

        let mut signal_names: HashMap<String, SignalId> =
            graph.iter().map(|s| (s.name.clone(), s.id)).collect();
        for inst in instances.values() {
            for port in &inst.ports {
                signal_names
                    .entry(format!("{}.{}", inst.path, port.name))
                    .or_insert(port.signal);
            }
        }
        let process_names = processes.iter().map(|(id, p)| (p.name.clone(), id)).collect();

        Ok(Self {
            graph,
            processes,
            instances,
            schedule,
            signal_names,
            process_names,
        })
    }

    /// The signal graph.
    pub fn graph(&self) -> &SignalGraph {
        &self.graph
    }

    /// Returns a signal.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this design.
    pub fn signal(&self, id: SignalId) -> &Signal {
        self.graph.get(id)
    }

    /// Returns a process.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this design.
    pub fn process(&self, id: ProcessId) -> &Process {
        &self.processes[id]
    }

    /// Returns an instance.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this design.
    pub fn instance(&self, id: InstanceId) -> &Instance {
        &self.instances[id]
    }

    /// The top instance.
    pub fn top(&self) -> &Instance {
        &self.instances[InstanceId::from_raw(0)]
    }

    /// Signals in declaration order.
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.graph.iter()
    }

    /// Processes in declaration order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    /// Instances in elaboration order.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }

    /// Processes sorted by [`Process::rank`], the order in which processes
    /// triggered in the same delta cycle are evaluated.
    pub fn schedule_order(&self) -> &[ProcessId] {
        &self.schedule
    }

    /// Resolves a hierarchical signal or port path such as `top.u0.q`.
    pub fn find_signal(&self, path: &str) -> Option<SignalId> {
        self.signal_names.get(path).copied()
    }

    /// Resolves a hierarchical process name.
    pub fn find_process(&self, path: &str) -> Option<ProcessId> {
        self.process_names.get(path).copied()
    }

    /// Number of signals.
    pub fn signal_count(&self) -> usize {
        self.graph.len()
    }

    /// Number of processes.
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// The raw process arena, for exporters that rebuild designs.
    pub fn process_arena(&self) -> &Arena<ProcessId, Process> {
        &self.processes
    }

    /// The raw instance arena, for exporters that rebuild designs.
    pub fn instance_arena(&self) -> &Arena<InstanceId, Instance> {
        &self.instances
    }
}

fn validate_tree(instances: &Arena<InstanceId, Instance>) -> Result<(), ElabError> {
    let malformed = |reason: String| Err(ElabError::MalformedTree { reason });
    if instances.is_empty() {
        return malformed("no top instance".to_string());
    }
    for (id, inst) in instances.iter() {
        if inst.id != id {
            return malformed(format!("instance '{}' stored under {id}", inst.path));
        }
        match inst.parent {
            None if id.as_raw() != 0 => {
                return malformed(format!("instance '{}' has no parent", inst.path));
            }
            Some(_) if id.as_raw() == 0 => {
                return malformed(format!("top instance '{}' has a parent", inst.path));
            }
            Some(parent) if parent >= id => {
                return malformed(format!(
                    "instance '{}' was elaborated before its parent",
                    inst.path
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_process(graph: &SignalGraph, process: &Process) -> Result<(), ElabError> {
    let mut ids = process.writes.clone();
    ids.extend_from_slice(&process.reads);
    process.body.collect_holds(&mut ids);
    let mut targets = Vec::new();
    process.body.collect_targets(&mut targets);
    ids.extend(targets.iter().map(|t| t.signal()));
    if let Sensitivity::Clocked(c) = &process.sensitivity {
        ids.push(c.clock);
        if let Some(r) = &c.reset {
            ids.push(r.signal);
            ids.extend(r.values.iter().map(|(id, _)| *id));
        }
    }
    if let Some(id) = ids.into_iter().find(|id| !graph.contains(*id)) {
        return Err(ElabError::UnknownSignal {
            context: format!("process '{}'", process.name),
            id,
        });
    }
    if let Sensitivity::Periodic { period: 0, .. } = process.sensitivity {
        return Err(ElabError::ZeroPeriod {
            process: process.name.clone(),
        });
    }

    let width = |id: SignalId| graph.try_get(id).map_or(0, |s| s.width);
    let mut oversized = None;
    process.body.visit_exprs(&mut |expr| {
        expr.visit(&mut |node| {
            if let Expr::Repeat { count, .. } = node {
                if oversized.is_none() && node.width(&width) > MAX_REPEAT_WIDTH {
                    oversized = Some(*count);
                }
            }
        })
    });
    match oversized {
        Some(count) => Err(ElabError::OversizedRepeat {
            process: process.name.clone(),
            count,
            limit: MAX_REPEAT_WIDTH,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use crate::elaborate::elaborate;
    use crate::expr::Expr;
    use crate::process::Clocking;
    use crate::stmt::Statement;

    #[test]
    fn schedule_follows_instance_then_declaration_order() {
        let design = elaborate("top", |top| {
            let a = top.wire("a", 1)?;
            let b = top.wire("b", 1)?;
            top.combinational("first", &[a], Statement::assign(a, Expr::bit(true)))?;
            top.instance("child", &[], |c| {
                let x = c.wire("x", 1)?;
                c.combinational("inner", &[x], Statement::assign(x, Expr::bit(false)))?;
                Ok(())
            })?;
            top.combinational("second", &[b], Statement::assign(b, a))?;
            Ok(())
        })
        .unwrap();
        let names: Vec<&str> = design
            .schedule_order()
            .iter()
            .map(|id| design.process(*id).name.as_str())
            .collect();
        assert_eq!(names, vec!["top.first", "top.second", "top.child.inner"]);
    }

    #[test]
    fn drivers_and_observers_are_derived() {
        let design = elaborate("top", |top| {
            let clk = top.input("clk", 1)?;
            let d = top.input("d", 1)?;
            let q = top.register("q", 1)?;
            let y = top.wire("y", 1)?;
            top.clocked("ff", Clocking::rising(clk), &[q], Statement::assign(q, d))?;
            top.combinational("inv", &[y], Statement::assign(y, Expr::not(q.into())))?;
            Ok(())
        })
        .unwrap();
        let clk = design.find_signal("top.clk").unwrap();
        let d = design.find_signal("top.d").unwrap();
        let q = design.find_signal("top.q").unwrap();
        let ff = design.find_process("top.ff").unwrap();
        let inv = design.find_process("top.inv").unwrap();
        assert_eq!(design.signal(q).drivers, vec![ff]);
        assert_eq!(design.signal(clk).observers, vec![ff]);
        // A clocked process is not sensitive to its data inputs.
        assert!(design.signal(d).observers.is_empty());
        assert_eq!(design.signal(q).observers, vec![inv]);
        assert_eq!(design.top().path, "top");
    }
}
