//! End-to-end simulation scenarios: elaborate, check, then drive a design
//! through the testbench API and assert on settled values and traces.

use sigflow_common::LogicVec;
use sigflow_config::{CheckConfig, KernelConfig};
use sigflow_ir::{
    elaborate, BinaryOp, Clocking, Design, Edge, Expr, Reset, Statement,
};
use sigflow_sim::{RunState, Testbench, TraceLog};

/// A counter that flips `toggle` every `period` rising edges of a clock
/// with period 10, with a synchronous active-high reset.
fn toggle_counter(period: u64) -> Design {
    elaborate("top", |top| {
        let clk = top.clock("clk", 5)?;
        let rst = top.input("rst", 1)?;
        let toggle = top.output_register("toggle", 1)?;
        top.instance(
            "counter",
            &[("clk", clk), ("rst", rst), ("toggle", toggle)],
            |c| {
                let clk = c.input("clk", 1)?;
                let rst = c.input("rst", 1)?;
                let toggle = c.output_register("toggle", 1)?;
                let count = c.register("count", 4)?;
                let reset = Reset::synchronous(
                    rst,
                    vec![(count, LogicVec::new(4)), (toggle, LogicVec::new(1))],
                );
                c.clocked(
                    "tick",
                    Clocking::rising(clk).with_reset(reset),
                    &[count, toggle],
                    Statement::if_else(
                        Expr::binary(BinaryOp::Eq, count.into(), Expr::constant(period - 1, 4)),
                        Statement::block([
                            Statement::assign(toggle, Expr::not(toggle.into())),
                            Statement::assign(count, Expr::constant(0, 4)),
                        ]),
                        Statement::block([
                            Statement::assign(
                                count,
                                Expr::binary(BinaryOp::Add, count.into(), Expr::constant(1, 4)),
                            ),
                            Statement::Hold(toggle),
                        ]),
                    ),
                )?;
                Ok(())
            },
        )
    })
    .unwrap()
}

fn bench(design: Design) -> Testbench {
    Testbench::from_design(design, &KernelConfig::default()).unwrap()
}

#[test]
fn toggle_counter_flips_at_60_and_110() {
    let mut tb = bench(toggle_counter(5));
    tb.set_u64("top.rst", 1).unwrap();
    tb.advance(10).unwrap();
    tb.set_u64("top.rst", 0).unwrap();

    for t in 10..=110 {
        assert_eq!(tb.now(), t);
        let expected = u64::from((60..110).contains(&t));
        assert_eq!(tb.get_u64("top.toggle").unwrap(), expected, "toggle at t={t}");
        assert_eq!(tb.advance(1).unwrap(), RunState::Running);
    }
    assert_eq!(tb.get_u64("top.counter.count").unwrap(), 0);
}

#[test]
fn port_writes_land_in_the_parent_signal() {
    let tb = bench(toggle_counter(5));
    assert_eq!(
        tb.signal("top.toggle").unwrap(),
        tb.signal("top.counter.toggle").unwrap()
    );
    assert_eq!(tb.signal("top.clk").unwrap(), tb.signal("top.counter.clk").unwrap());
}

#[test]
fn synchronous_reset_applies_at_the_next_edge() {
    let mut tb = bench(toggle_counter(5));
    tb.set_u64("top.rst", 1).unwrap();
    tb.advance(10).unwrap();
    tb.set_u64("top.rst", 0).unwrap();
    tb.advance(22).unwrap();
    // Edges at 20 and 30 counted.
    assert_eq!(tb.get_u64("top.counter.count").unwrap(), 2);

    tb.set_u64("top.rst", 1).unwrap();
    // Sampled only at the edge, not when asserted.
    assert_eq!(tb.get_u64("top.counter.count").unwrap(), 2);
    let edge = tb.wait_for_edge("top.clk", Edge::Rising).unwrap();
    assert_eq!(edge, 40);
    assert_eq!(tb.get_u64("top.counter.count").unwrap(), 0);
    assert_eq!(tb.get_u64("top.toggle").unwrap(), 0);

    // Held in reset for a whole period: still the reset value.
    tb.advance(10).unwrap();
    assert_eq!(tb.get_u64("top.counter.count").unwrap(), 0);
    tb.set_u64("top.rst", 0).unwrap();
    tb.advance(10).unwrap();
    assert_eq!(tb.get_u64("top.counter.count").unwrap(), 1);
}

#[test]
fn reset_overrides_any_prior_value() {
    for prior in [1u64, 3, 4] {
        let mut tb = bench(toggle_counter(5));
        tb.set_u64("top.rst", 1).unwrap();
        tb.advance(10).unwrap();
        tb.set_u64("top.rst", 0).unwrap();
        tb.advance(prior * 10 + 1).unwrap();
        assert_eq!(tb.get_u64("top.counter.count").unwrap(), prior);
        tb.set_u64("top.rst", 1).unwrap();
        tb.wait_for_edge("top.clk", Edge::Rising).unwrap();
        assert_eq!(tb.get_u64("top.counter.count").unwrap(), 0, "from {prior}");
    }
}

#[test]
fn asynchronous_reset_held_from_time_zero() {
    let design = elaborate("top", |top| {
        let clk = top.input("clk", 1)?;
        let rst = top.input("rst", 1)?;
        let q = top.output_register("q", 4)?;
        top.clocked(
            "ff",
            Clocking::rising(clk)
                .with_reset(Reset::asynchronous(rst, vec![(q, LogicVec::from_u64(0b1010, 4))])),
            &[q],
            Statement::assign(q, Expr::binary(BinaryOp::Add, q.into(), Expr::constant(1, 4))),
        )?;
        Ok(())
    })
    .unwrap();
    let mut tb = bench(design);
    tb.set_u64("top.rst", 1).unwrap();
    tb.advance(0).unwrap();
    // No clock edge has happened yet.
    assert_eq!(tb.get_u64("top.q").unwrap(), 0b1010);

    tb.set_u64("top.clk", 1).unwrap();
    assert_eq!(tb.get_u64("top.q").unwrap(), 0b1010);
    tb.set_u64("top.rst", 0).unwrap();
    tb.set_u64("top.clk", 0).unwrap();
    assert_eq!(tb.get_u64("top.q").unwrap(), 0b1010);
    tb.set_u64("top.clk", 1).unwrap();
    assert_eq!(tb.get_u64("top.q").unwrap(), 0b1011);
}

#[test]
fn settled_values_only_change_at_events() {
    let log = TraceLog::new();
    let mut tb = bench(toggle_counter(3)).with_sink(log.clone()).unwrap();
    tb.set_u64("top.rst", 1).unwrap();
    tb.advance(10).unwrap();
    tb.set_u64("top.rst", 0).unwrap();

    let mut last = tb.get("top.counter.count").unwrap();
    for _ in 0..100 {
        tb.advance(1).unwrap();
        let now = tb.now();
        let count = tb.get("top.counter.count").unwrap();
        if now % 10 != 0 {
            assert_eq!(count, last, "count moved between edges at t={now}");
        }
        last = count;
    }

    let count = tb.signal("top.counter.count").unwrap();
    let rst = tb.signal("top.rst").unwrap();
    for record in log.records() {
        if record.signal == rst {
            continue;
        }
        assert_eq!(record.time % 5, 0, "change off the clock grid: {record:?}");
        if record.signal == count {
            assert_eq!(record.time % 10, 0);
        }
    }
    // One record per settled change: consecutive records of a signal differ.
    for window in log.changes_of(count).windows(2) {
        assert_ne!(window[0].1, window[1].1);
    }
}

#[test]
fn processes_run_in_elaboration_then_declaration_order() {
    let design = elaborate("top", |top| {
        let clk = top.clock("clk", 5)?;
        let say = |name: &str| Statement::Display {
            format: name.to_string(),
            args: Vec::new(),
        };
        top.clocked("zeta", Clocking::rising(clk), &[], say("zeta"))?;
        top.instance("child", &[("clk", clk)], |c| {
            let clk = c.input("clk", 1)?;
            c.clocked("alpha", Clocking::rising(clk), &[], say("alpha"))?;
            Ok(())
        })?;
        top.clocked("mid", Clocking::rising(clk), &[], say("mid"))?;
        Ok(())
    })
    .unwrap();
    let mut tb = bench(design);
    tb.advance(10).unwrap();
    assert_eq!(
        tb.display_log(),
        ["zeta", "mid", "alpha", "zeta", "mid", "alpha"]
    );
}

#[test]
fn finish_statement_stops_the_run() {
    let design = elaborate("top", |top| {
        let clk = top.clock("clk", 5)?;
        let n = top.register("n", 8)?;
        top.clocked(
            "count",
            Clocking::rising(clk),
            &[n],
            Statement::block([
                Statement::assign(n, Expr::binary(BinaryOp::Add, n.into(), Expr::constant(1, 8))),
                Statement::when(
                    Expr::binary(BinaryOp::Eq, n.into(), Expr::constant(3, 8)),
                    Statement::Finish,
                ),
            ]),
        )?;
        Ok(())
    })
    .unwrap();
    let mut tb = bench(design);
    assert_eq!(tb.advance(1_000).unwrap(), RunState::Stopped);
    // Edges at 0, 10, 20, 30; the last one sees n == 3.
    assert_eq!(tb.now(), 30);
    assert_eq!(tb.get_u64("top.n").unwrap(), 4);
}

#[test]
fn signed_accumulator_sign_extends_and_shifts_arithmetically() {
    let design = elaborate("top", |top| {
        let clk = top.clock("clk", 5)?;
        let step = top.input("step", 4)?;
        let acc = top.register("acc", 8)?;
        let neg = top.output("neg", 1)?;
        let half = top.output("half", 8)?;
        top.clocked(
            "accumulate",
            Clocking::rising(clk),
            &[acc],
            Statement::assign(
                acc,
                Expr::binary(BinaryOp::Add, Expr::signed(acc.into()), Expr::signed(step.into())),
            ),
        )?;
        top.combinational(
            "sign",
            &[neg],
            Statement::assign(
                neg,
                Expr::binary(BinaryOp::Lt, Expr::signed(acc.into()), Expr::signed_constant(0, 8)),
            ),
        )?;
        top.combinational(
            "halve",
            &[half],
            Statement::assign(
                half,
                Expr::binary(BinaryOp::Shr, Expr::signed(acc.into()), Expr::constant(1, 1)),
            ),
        )?;
        Ok(())
    })
    .unwrap();
    let mut tb = bench(design);
    // -3 as a 4-bit value.
    tb.set_u64("top.step", 0b1101).unwrap();
    tb.advance(20).unwrap();
    // Edges at 0, 10 and 20: -9.
    assert_eq!(tb.get_u64("top.acc").unwrap(), 0xf7);
    assert_eq!(tb.get_u64("top.neg").unwrap(), 1);
    assert_eq!(tb.get_u64("top.half").unwrap(), 0xfb);
}

#[test]
fn any_edge_process_runs_on_both_transitions_when_allowed() {
    let design = || {
        elaborate("top", |top| {
            let clk = top.clock("clk", 5)?;
            let n = top.register("n", 8)?;
            let both = Clocking {
                edge: Edge::Any,
                ..Clocking::rising(clk)
            };
            top.clocked(
                "count",
                both,
                &[n],
                Statement::assign(n, Expr::binary(BinaryOp::Add, n.into(), Expr::constant(1, 8))),
            )?;
            Ok(())
        })
        .unwrap()
    };
    let strict = Testbench::from_design(design(), &KernelConfig::default());
    assert!(strict.err().unwrap().to_string().contains("[E105]"));

    let config = KernelConfig {
        check: CheckConfig {
            allow: vec!["dual-edge-clock".into()],
            ..Default::default()
        },
        ..Default::default()
    };
    let mut tb = Testbench::from_design(design(), &config).unwrap();
    tb.advance(20).unwrap();
    // Transitions at 0, 5, 10, 15 and 20.
    assert_eq!(tb.get_u64("top.n").unwrap(), 5);
}
