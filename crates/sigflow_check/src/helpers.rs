//! Analyses shared by several rules.

use petgraph::graph::{DiGraph, NodeIndex};
use sigflow_ir::{Design, ProcessClass, ProcessId, SignalId, SignalRef, Statement};
use std::collections::HashMap;

/// Bits of `signal` (of `width` bits) that `stmt` assigns or holds on every
/// path through it. Index `i` is bit `i`.
///
/// Sequential statements accumulate coverage; a branch covers only what all
/// of its alternatives cover, and a missing `else` or `default` covers
/// nothing.
pub fn assigned_bits(stmt: &Statement, signal: SignalId, width: u32) -> Vec<bool> {
    let none = || vec![false; width as usize];
    match stmt {
        Statement::Assign { target, .. } if target.signal() == signal => {
            let mut bits = none();
            match *target {
                SignalRef::Signal(_) => bits.iter_mut().for_each(|b| *b = true),
                SignalRef::Slice { high, low, .. } => {
                    for bit in low..=high.min(width.saturating_sub(1)) {
                        bits[bit as usize] = true;
                    }
                }
            }
            bits
        }
        Statement::Hold(id) if *id == signal => vec![true; width as usize],
        Statement::Block(stmts) => {
            let mut bits = none();
            for s in stmts {
                union(&mut bits, &assigned_bits(s, signal, width));
            }
            bits
        }
        Statement::If {
            then_body,
            else_body: Some(else_body),
            ..
        } => {
            let mut bits = assigned_bits(then_body, signal, width);
            intersect(&mut bits, &assigned_bits(else_body, signal, width));
            bits
        }
        Statement::Case {
            arms,
            default: Some(default),
            ..
        } => {
            let mut bits = assigned_bits(default, signal, width);
            for arm in arms {
                intersect(&mut bits, &assigned_bits(&arm.body, signal, width));
            }
            bits
        }
        _ => none(),
    }
}

fn union(acc: &mut [bool], other: &[bool]) {
    acc.iter_mut().zip(other).for_each(|(a, b)| *a |= *b);
}

fn intersect(acc: &mut [bool], other: &[bool]) {
    acc.iter_mut().zip(other).for_each(|(a, b)| *a &= *b);
}

/// Dependency graph of the combinational processes: an edge `p -> q`
/// labelled `s` means `p` drives `s` and `q` reads it. Nodes are added in
/// scheduling order.
pub fn combinational_graph(design: &Design) -> DiGraph<ProcessId, SignalId> {
    let mut graph = DiGraph::new();
    let mut nodes: HashMap<ProcessId, NodeIndex> = HashMap::new();
    for &pid in design.schedule_order() {
        if design.process(pid).sensitivity.class() == ProcessClass::Combinational {
            nodes.insert(pid, graph.add_node(pid));
        }
    }
    for &pid in design.schedule_order() {
        let Some(&from) = nodes.get(&pid) else {
            continue;
        };
        for &signal in &design.process(pid).writes {
            for reader in &design.signal(signal).observers {
                if let Some(&to) = nodes.get(reader) {
                    graph.add_edge(from, to, signal);
                }
            }
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigflow_ir::{elaborate, Expr};

    fn sig(i: u32) -> SignalId {
        SignalId::from_raw(i)
    }

    #[test]
    fn if_without_else_covers_nothing() {
        let body = Statement::when(sig(0), Statement::assign(sig(1), Expr::constant(1, 2)));
        assert_eq!(assigned_bits(&body, sig(1), 2), vec![false, false]);
    }

    #[test]
    fn slices_accumulate_across_a_block() {
        let body = Statement::block([
            Statement::assign_slice(sig(1), 1, 0, Expr::constant(0, 2)),
            Statement::assign_slice(sig(1), 3, 2, Expr::constant(0, 2)),
        ]);
        assert_eq!(assigned_bits(&body, sig(1), 4), vec![true; 4]);
    }

    #[test]
    fn hold_counts_as_coverage_on_its_path() {
        let body = Statement::if_else(
            sig(0),
            Statement::assign(sig(1), Expr::bit(true)),
            Statement::Hold(sig(1)),
        );
        assert_eq!(assigned_bits(&body, sig(1), 1), vec![true]);
        assert_eq!(assigned_bits(&body, sig(2), 1), vec![false]);
    }

    #[test]
    fn case_needs_default_and_every_arm() {
        let arm = |v: u64, body| sigflow_ir::CaseArm {
            patterns: vec![Expr::constant(v, 1)],
            body,
        };
        let full = Statement::Case {
            subject: sig(0).into(),
            arms: vec![arm(0, Statement::assign(sig(1), Expr::bit(false)))],
            default: Some(Box::new(Statement::assign(sig(1), Expr::bit(true)))),
        };
        assert_eq!(assigned_bits(&full, sig(1), 1), vec![true]);
        let partial = Statement::Case {
            subject: sig(0).into(),
            arms: vec![arm(0, Statement::Nop)],
            default: Some(Box::new(Statement::assign(sig(1), Expr::bit(true)))),
        };
        assert_eq!(assigned_bits(&partial, sig(1), 1), vec![false]);
    }

    #[test]
    fn graph_links_writers_to_combinational_readers() {
        let design = elaborate("top", |top| {
            let clk = top.input("clk", 1)?;
            let a = top.wire("a", 1)?;
            let b = top.wire("b", 1)?;
            let q = top.register("q", 1)?;
            top.combinational("p", &[a], Statement::assign(a, q))?;
            top.combinational("r", &[b], Statement::assign(b, a))?;
            top.clocked(
                "ff",
                sigflow_ir::Clocking::rising(clk),
                &[q],
                Statement::assign(q, b),
            )?;
            Ok(())
        })
        .unwrap();
        let graph = combinational_graph(&design);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }
}
