//! In-memory trace sink.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use sigflow_common::LogicVec;
use sigflow_ir::SignalId;

use super::TraceSink;
use crate::error::SimError;

/// One settled value change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    /// Instant, in ticks.
    pub time: u64,
    /// The signal.
    pub signal: SignalId,
    /// Settled value.
    pub value: LogicVec,
}

#[derive(Debug, Default)]
struct Inner {
    path: Vec<String>,
    scopes: Vec<String>,
    names: HashMap<SignalId, String>,
    records: Vec<TraceRecord>,
    finalized: bool,
}

/// Records trace output in memory.
///
/// Clones share the same buffer, so a clone can be handed to the kernel and
/// the original inspected after the run.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    inner: Rc<RefCell<Inner>>,
}

impl TraceLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, in emission order.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.inner.borrow().records.clone()
    }

    /// `(time, value)` changes of one signal.
    pub fn changes_of(&self, signal: SignalId) -> Vec<(u64, LogicVec)> {
        self.inner
            .borrow()
            .records
            .iter()
            .filter(|r| r.signal == signal)
            .map(|r| (r.time, r.value.clone()))
            .collect()
    }

    /// Last recorded value of `signal` at or before `time`.
    pub fn value_at(&self, signal: SignalId, time: u64) -> Option<LogicVec> {
        self.inner
            .borrow()
            .records
            .iter()
            .rev()
            .find(|r| r.signal == signal && r.time <= time)
            .map(|r| r.value.clone())
    }

    /// Full paths of the declared scopes, in declaration order.
    pub fn scopes(&self) -> Vec<String> {
        self.inner.borrow().scopes.clone()
    }

    /// Hierarchical name under which `signal` was declared.
    pub fn signal_name(&self, signal: SignalId) -> Option<String> {
        self.inner.borrow().names.get(&signal).cloned()
    }

    /// True once the kernel has finalized the trace.
    pub fn is_finalized(&self) -> bool {
        self.inner.borrow().finalized
    }
}

impl TraceSink for TraceLog {
    fn begin_scope(&mut self, name: &str) -> Result<(), SimError> {
        let mut inner = self.inner.borrow_mut();
        inner.path.push(name.to_string());
        let full = inner.path.join(".");
        inner.scopes.push(full);
        Ok(())
    }

    fn register_signal(&mut self, id: SignalId, name: &str, _width: u32) -> Result<(), SimError> {
        let mut inner = self.inner.borrow_mut();
        let mut full = inner.path.join(".");
        if !full.is_empty() {
            full.push('.');
        }
        full.push_str(name);
        inner.names.insert(id, full);
        Ok(())
    }

    fn end_scope(&mut self) -> Result<(), SimError> {
        self.inner.borrow_mut().path.pop();
        Ok(())
    }

    fn record_change(&mut self, time: u64, id: SignalId, value: &LogicVec) -> Result<(), SimError> {
        self.inner.borrow_mut().records.push(TraceRecord {
            time,
            signal: id,
            value: value.clone(),
        });
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SimError> {
        self.inner.borrow_mut().finalized = true;
        Ok(())
    }
}
