//! Trace output.
//!
//! The kernel reports every settled value change to each attached
//! [`TraceSink`]. [`VcdRecorder`] writes a Value Change Dump, [`TraceLog`]
//! keeps the records in memory and [`read_vcd`] loads a dump back for
//! inspection.

pub mod log;
pub mod replay;
pub mod vcd;

use std::fs::File;
use std::io::BufWriter;

use flate2::write::GzEncoder;
use flate2::Compression;
use sigflow_common::LogicVec;
use sigflow_config::TraceConfig;
use sigflow_ir::{Design, InstanceId, SignalId};

use crate::error::SimError;

pub use self::log::{TraceLog, TraceRecord};
pub use replay::{read_vcd, VcdTrace};
pub use vcd::VcdRecorder;

/// Receives the ordered stream of settled value changes.
///
/// Calls arrive as: the scope and signal declarations, then
/// `record_change` in non-decreasing time order, then `finalize` exactly
/// once, also when the run aborts.
pub trait TraceSink {
    /// Opens a scope (one instance level).
    fn begin_scope(&mut self, name: &str) -> Result<(), SimError>;

    /// Declares a signal in the current scope.
    fn register_signal(&mut self, id: SignalId, name: &str, width: u32) -> Result<(), SimError>;

    /// Closes the current scope.
    fn end_scope(&mut self) -> Result<(), SimError>;

    /// Records the settled value of `id` at `time` (in ticks).
    fn record_change(&mut self, time: u64, id: SignalId, value: &LogicVec) -> Result<(), SimError>;

    /// Flushes any buffered output.
    fn finalize(&mut self) -> Result<(), SimError>;
}

/// Declares the instance tree of `design` on `sink`, one scope per instance.
pub fn declare_design(sink: &mut dyn TraceSink, design: &Design) -> Result<(), SimError> {
    declare_instance(sink, design, design.top().id)
}

fn declare_instance(
    sink: &mut dyn TraceSink,
    design: &Design,
    id: InstanceId,
) -> Result<(), SimError> {
    let inst = design.instance(id);
    sink.begin_scope(&inst.name)?;
    for &sid in &inst.signals {
        let signal = design.signal(sid);
        sink.register_signal(sid, signal.local_name(), signal.width)?;
    }
    for &child in &inst.children {
        declare_instance(sink, design, child)?;
    }
    sink.end_scope()
}

/// Opens the file sink described by `config`, if any. With `compress` the
/// dump is gzip-compressed.
pub fn open_trace(config: &TraceConfig) -> Result<Option<Box<dyn TraceSink>>, SimError> {
    let Some(path) = &config.path else {
        return Ok(None);
    };
    let file = BufWriter::new(File::create(path)?);
    ::log::info!("writing trace to {path}");
    let sink: Box<dyn TraceSink> = if config.compress {
        Box::new(VcdRecorder::new(
            GzEncoder::new(file, Compression::default()),
            config.timescale,
        ))
    } else {
        Box::new(VcdRecorder::new(file, config.timescale))
    };
    Ok(Some(sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigflow_ir::{elaborate, Statement};

    #[test]
    fn declares_one_scope_per_instance() {
        let design = elaborate("top", |top| {
            let a = top.wire("a", 1)?;
            top.instance("child", &[("i", a)], |c| {
                let i = c.input("i", 1)?;
                let o = c.wire("o", 1)?;
                c.combinational("buf", &[o], Statement::assign(o, i))?;
                Ok(())
            })
        })
        .unwrap();
        let log = TraceLog::new();
        let mut sink = log.clone();
        declare_design(&mut sink, &design).unwrap();
        assert_eq!(log.scopes(), vec!["top".to_string(), "top.child".to_string()]);
        assert_eq!(log.signal_name(design.find_signal("top.child.o").unwrap()).as_deref(), Some("top.child.o"));
    }

    #[test]
    fn no_path_means_no_sink() {
        assert!(open_trace(&TraceConfig::default()).unwrap().is_none());
    }
}
