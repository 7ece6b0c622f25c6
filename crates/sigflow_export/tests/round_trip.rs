//! Export a hierarchical design, store it, load it back and compare.

use sigflow_check::check;
use sigflow_common::LogicVec;
use sigflow_config::KernelConfig;
use sigflow_export::{from_json, read_netlist, to_json, write_netlist, NetlistView};
use sigflow_ir::{
    elaborate, BinaryOp, Clocking, Design, Edge, Expr, ProcessClass, Reset, Sensitivity,
    SignalKind, Statement,
};
use sigflow_sim::Testbench;

/// Two-stage design: a counter instance with an async reset feeding a
/// combinational parity instance.
fn design() -> Design {
    elaborate("top", |top| {
        let clk = top.clock("clk", 5)?;
        let rst = top.input("rst", 1)?;
        let count = top.wire("count", 4)?;
        let parity = top.output("parity", 1)?;
        top.instance("ctr", &[("clk", clk), ("rst", rst), ("q", count)], |c| {
            let clk = c.input("clk", 1)?;
            let rst = c.input("rst", 1)?;
            let q = c.output("q", 4)?;
            let state = c.register("state", 4)?;
            let reset = Reset::asynchronous(rst, vec![(state, LogicVec::new(4))]);
            c.clocked(
                "step",
                Clocking::falling(clk).with_reset(reset),
                &[state],
                Statement::assign(
                    state,
                    Expr::binary(BinaryOp::Add, state.into(), Expr::constant(1, 4)),
                ),
            )?;
            c.combinational("drive", &[q], Statement::assign(q, state))?;
            Ok(())
        })?;
        top.instance("par", &[("d", count), ("p", parity)], |c| {
            let d = c.input("d", 4)?;
            let p = c.output("p", 1)?;
            let bit = |i: u32| Expr::slice(d.into(), i, i);
            c.combinational(
                "xor",
                &[p],
                Statement::assign(
                    p,
                    Expr::binary(
                        BinaryOp::Xor,
                        Expr::binary(BinaryOp::Xor, bit(0), bit(1)),
                        Expr::binary(BinaryOp::Xor, bit(2), bit(3)),
                    ),
                ),
            )?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap()
}

#[test]
fn view_keeps_kinds_widths_and_classes() {
    let view = NetlistView::from_checked(&check(design()).unwrap());
    let paths: Vec<_> = view.instances.iter().map(|i| i.path.as_str()).collect();
    assert_eq!(paths, ["top", "top.ctr", "top.par"]);

    let state = view.find_signal("top.ctr.state").unwrap();
    assert_eq!((state.width, state.kind), (4, SignalKind::Register));
    let count = view.find_signal("top.count").unwrap();
    assert_eq!((count.width, count.kind), (4, SignalKind::Wire));
    assert_eq!(view.driver_of(count.id).unwrap().name, "top.ctr.drive");

    let step = view.find_process("top.ctr.step").unwrap();
    assert_eq!(step.class, ProcessClass::Clocked);
    let Sensitivity::Clocked(clocking) = &step.sensitivity else {
        panic!("step is not clocked");
    };
    assert_eq!(clocking.edge, Edge::Falling);
    assert!(clocking.reset.is_some());
    assert_eq!(step.writes, [state.id]);
}

#[test]
fn binary_file_round_trip_is_structurally_identical() {
    let view = NetlistView::from_checked(&check(design()).unwrap());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("top.sgn");
    write_netlist(&path, &view).unwrap();

    let loaded = read_netlist(&path).unwrap();
    assert_eq!(loaded, view);

    let reimported = check(loaded.into_design().unwrap()).unwrap();
    let again = NetlistView::from_checked(&reimported);
    assert_eq!(again, view);
    assert_eq!(again.fingerprint().unwrap(), view.fingerprint().unwrap());
}

#[test]
fn json_round_trip_is_structurally_identical() {
    let view = NetlistView::from_checked(&check(design()).unwrap());
    let json = to_json(&view).unwrap();
    let reimported = from_json(&json).unwrap().into_design().unwrap();
    assert_eq!(NetlistView::from_checked(&check(reimported).unwrap()), view);
}

#[test]
fn reimported_design_simulates_identically() {
    let view = NetlistView::from_checked(&check(design()).unwrap());
    let copy = view.into_design().unwrap();

    let config = KernelConfig::default();
    let mut original = Testbench::from_design(design(), &config).unwrap();
    let mut reloaded = Testbench::from_design(copy, &config).unwrap();
    for tb in [&mut original, &mut reloaded] {
        tb.set_u64("top.rst", 1).unwrap();
        tb.advance(10).unwrap();
        tb.set_u64("top.rst", 0).unwrap();
    }
    for _ in 0..20 {
        original.advance(5).unwrap();
        reloaded.advance(5).unwrap();
        assert_eq!(
            original.get("top.count").unwrap(),
            reloaded.get("top.count").unwrap()
        );
        assert_eq!(
            original.get("top.parity").unwrap(),
            reloaded.get("top.parity").unwrap()
        );
    }
    assert_ne!(original.get_u64("top.count").unwrap(), 0);
}
