//! Delta-cycle simulation kernel.
//!
//! [`Kernel`] owns the runtime state of a checked design: the signal store,
//! the future event queue and the periodic wakeups. Each simulated instant
//! is settled by repeated active/update iterations:
//!
//! 1. every triggered process runs once, in rank order, writing only to
//!    pending slots;
//! 2. all pending values are committed at once;
//! 3. processes sensitive to a committed change are triggered for the next
//!    delta cycle at the same instant.
//!
//! The instant is settled when an update phase changes nothing. A
//! [`Finish`](sigflow_ir::Statement::Finish) takes effect at the end of the
//! iteration that executed it.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};

use sigflow_check::CheckedDesign;
use sigflow_common::LogicVec;
use sigflow_config::SimConfig;
use sigflow_ir::{Design, Edge, ProcessId, ResetKind, Sensitivity, SignalId};

use crate::domain::{detect_edge, ClockedAction, DomainMap};
use crate::error::SimError;
use crate::evaluator::{exec_statement, Effects, EvalContext, PendingWrite};
use crate::time::SimTime;
use crate::trace::{declare_design, TraceSink};
use crate::value::{Change, SignalStore};

/// Externally scheduled stimulus.
#[derive(Debug, Clone)]
struct SimEvent {
    time: u64,
    /// Insertion order; breaks ties between events at the same time.
    seq: u64,
    signal: SignalId,
    value: LogicVec,
}

impl PartialEq for SimEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimEvent {}

impl PartialOrd for SimEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.time, self.seq).cmp(&(other.time, other.seq))
    }
}

#[derive(Debug, Clone)]
struct PeriodicSlot {
    process: ProcessId,
    next: u64,
    period: u64,
}

/// A process triggered for the next active phase.
#[derive(Debug, Clone, Copy)]
struct Activation {
    process: ProcessId,
    /// The process's active clock edge fired.
    edge: bool,
}

/// Triggered processes keyed by rank, so iteration is the evaluation order.
type ActiveSet = BTreeMap<(u32, u32), Activation>;

/// A committed change together with the value it changed to.
#[derive(Debug, Clone)]
struct SettledChange {
    signal: SignalId,
    previous: LogicVec,
    current: LogicVec,
}

/// Runtime state of one simulation run.
pub struct Kernel {
    design: Design,
    store: SignalStore,
    domains: DomainMap,
    events: BinaryHeap<Reverse<SimEvent>>,
    next_seq: u64,
    periodic: Vec<PeriodicSlot>,
    now: SimTime,
    max_deltas: u32,
    sinks: Vec<Box<dyn TraceSink>>,
    /// Last value handed to the sinks, per signal.
    traced: Vec<LogicVec>,
    /// Changes committed during the current instant, in commit order.
    instant: Vec<SettledChange>,
    display: Vec<String>,
    started: bool,
    finish_requested: bool,
    finalized: bool,
}

impl Kernel {
    /// Creates a kernel for a design accepted by the checker.
    pub fn new(checked: CheckedDesign, config: &SimConfig) -> Self {
        let design = checked.into_design();
        let store = SignalStore::new(&design);
        let domains = DomainMap::classify(&design);
        let periodic = design
            .schedule_order()
            .iter()
            .filter_map(|&pid| match design.process(pid).sensitivity {
                Sensitivity::Periodic { period, offset } => Some(PeriodicSlot {
                    process: pid,
                    next: offset,
                    period,
                }),
                _ => None,
            })
            .collect();
        let traced = design.signals().map(|s| s.init.clone()).collect();
        Self {
            design,
            store,
            domains,
            events: BinaryHeap::new(),
            next_seq: 0,
            periodic,
            now: SimTime::zero(),
            max_deltas: config.max_deltas,
            sinks: Vec::new(),
            traced,
            instant: Vec::new(),
            display: Vec::new(),
            started: false,
            finish_requested: false,
            finalized: false,
        }
    }

    /// The simulated design.
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// Current instant and delta cycle.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// True once time zero has been simulated.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// True after a `Finish` statement executed.
    pub fn finish_requested(&self) -> bool {
        self.finish_requested
    }

    /// Lines produced by `Display` statements, in execution order.
    pub fn display_log(&self) -> &[String] {
        &self.display
    }

    /// Current settled value of `signal`.
    pub fn read(&self, signal: SignalId) -> Result<&LogicVec, SimError> {
        Ok(self.store.read(signal)?)
    }

    /// True if some process drives `signal`.
    pub fn is_driven(&self, signal: SignalId) -> Result<bool, SimError> {
        Ok(self.store.is_driven(signal)?)
    }

    /// Attaches a trace sink. The design hierarchy is declared on it right
    /// away; a sink attached after time zero first receives every current
    /// value.
    pub fn add_sink(&mut self, mut sink: Box<dyn TraceSink>) -> Result<(), SimError> {
        declare_design(sink.as_mut(), &self.design)?;
        if self.started {
            for signal in self.design.signals() {
                sink.record_change(self.now.ticks, signal.id, self.store.read(signal.id)?)?;
            }
        }
        self.sinks.push(sink);
        Ok(())
    }

    /// Sets the value `signal` starts from. Only valid before time zero.
    pub fn initialize(&mut self, signal: SignalId, value: LogicVec) -> Result<(), SimError> {
        if let Some(slot) = self.traced.get_mut(signal.as_raw() as usize) {
            *slot = value.clone();
        }
        self.store.initialize(signal, value)?;
        Ok(())
    }

    /// Queues `value` for `signal` at instant `time`.
    pub fn schedule(&mut self, signal: SignalId, value: LogicVec, time: u64) {
        self.events.push(Reverse(SimEvent {
            time,
            seq: self.next_seq,
            signal,
            value,
        }));
        self.next_seq += 1;
    }

    /// Earliest instant with scheduled activity, if any.
    pub fn next_time(&self) -> Option<u64> {
        let event = self.events.peek().map(|Reverse(e)| e.time);
        let periodic = self.periodic.iter().map(|p| p.next).min();
        match (event, periodic) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Simulates time zero: every combinational process, periodic processes
    /// with offset zero, asynchronously reset processes whose reset is
    /// asserted, and stimulus queued for time zero. Then dumps every signal
    /// to the trace.
    pub fn start(&mut self) -> Result<(), SimError> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        log::info!(
            "simulating `{}`: {} signal(s), {} process(es)",
            self.design.top().name,
            self.design.signal_count(),
            self.design.process_count()
        );

        self.apply_events(0)?;
        let mut active = ActiveSet::new();
        for &pid in self.design.schedule_order() {
            let process = self.design.process(pid);
            let initial = match &process.sensitivity {
                Sensitivity::Combinational => true,
                Sensitivity::Clocked(c) => match &c.reset {
                    Some(r) if r.kind == ResetKind::Asynchronous => {
                        self.domains.decide(pid, false, Some(self.store.read(r.signal)?))
                            == ClockedAction::Reset
                    }
                    _ => false,
                },
                Sensitivity::Periodic { .. } => false,
            };
            if initial {
                active.insert(process.rank(), Activation { process: pid, edge: false });
            }
        }
        self.wake_periodic(0, &mut active);
        self.settle(active)?;

        for signal in self.design.signals() {
            let value = self.store.read(signal.id)?;
            for sink in &mut self.sinks {
                sink.record_change(0, signal.id, value)?;
            }
        }
        for (slot, signal) in self.traced.iter_mut().zip(self.design.signals()) {
            *slot = self.store.read(signal.id)?.clone();
        }
        Ok(())
    }

    /// Moves to instant `time` (later than now) and settles it.
    pub fn step(&mut self, time: u64) -> Result<(), SimError> {
        self.now = self.now.advance_to(time);
        self.instant.clear();
        log::debug!("t={time}");
        self.apply_events(time)?;
        let mut active = ActiveSet::new();
        self.wake_periodic(time, &mut active);
        self.settle(active)?;
        self.emit_trace()
    }

    /// Moves the clock to `time` without simulating anything.
    pub fn idle_until(&mut self, time: u64) {
        if time > self.now.ticks {
            self.now = self.now.advance_to(time);
            self.instant.clear();
        }
    }

    /// Applies a testbench write at the current instant and settles it.
    ///
    /// Each write starts a fresh settle, so the delta count restarts at 0.
    pub fn apply_external(&mut self, signal: SignalId, value: &LogicVec) -> Result<(), SimError> {
        self.now = SimTime::from_ticks(self.now.ticks);
        self.store.stage_external(signal, value)?;
        self.settle(ActiveSet::new())?;
        self.emit_trace()
    }

    /// True if the `edge` of `signal` occurred at the current instant.
    pub fn saw_edge(&self, signal: SignalId, edge: Edge) -> bool {
        self.instant
            .iter()
            .any(|c| c.signal == signal && detect_edge(&c.previous, &c.current, edge))
    }

    /// True if `signal` changed value in any delta of the current instant,
    /// even if it settled back to where it started.
    pub fn saw_change(&self, signal: SignalId) -> bool {
        self.instant.iter().any(|c| c.signal == signal)
    }

    /// Flushes every trace sink. Later calls do nothing.
    pub fn finalize(&mut self) -> Result<(), SimError> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        for sink in &mut self.sinks {
            sink.finalize()?;
        }
        Ok(())
    }

    fn apply_events(&mut self, time: u64) -> Result<(), SimError> {
        while self.events.peek().is_some_and(|Reverse(e)| e.time <= time) {
            if let Some(Reverse(event)) = self.events.pop() {
                self.store.stage_external(event.signal, &event.value)?;
            }
        }
        Ok(())
    }

    fn wake_periodic(&mut self, time: u64, active: &mut ActiveSet) {
        for slot in &mut self.periodic {
            if slot.next == time {
                let rank = self.design.process(slot.process).rank();
                active.insert(rank, Activation { process: slot.process, edge: false });
                slot.next = time.saturating_add(slot.period);
            }
        }
    }

    /// Runs active/update iterations until nothing changes.
    fn settle(&mut self, mut active: ActiveSet) -> Result<(), SimError> {
        loop {
            for activation in active.values() {
                if let Err(err) = self.evaluate(*activation) {
                    // Writes staged earlier in this delta never commit.
                    self.store.discard_pending();
                    return Err(err);
                }
            }
            let changes = self.store.commit();
            if changes.is_empty() {
                return Ok(());
            }
            if self.now.delta >= self.max_deltas {
                log::warn!(
                    "delta-cycle watchdog tripped at t={} after {} cycles",
                    self.now.ticks,
                    self.now.delta
                );
                return Err(SimError::SimulationTimeout {
                    time: self.now.ticks,
                    deltas: self.now.delta,
                });
            }
            self.now = self.now.next_delta();
            log::trace!("delta {}: {} change(s)", self.now, changes.len());
            active = self.reactivate(changes)?;
            if self.finish_requested || active.is_empty() {
                return Ok(());
            }
        }
    }

    fn evaluate(&mut self, activation: Activation) -> Result<(), SimError> {
        let process = self.design.process(activation.process);
        log::trace!("evaluating {}", process.name);
        let ctx = EvalContext {
            store: &self.store,
            time: self.now.ticks,
        };
        let mut effects = Effects::default();
        match &process.sensitivity {
            Sensitivity::Clocked(clocking) => {
                let reset_value = match &clocking.reset {
                    Some(r) => Some(self.store.read(r.signal)?),
                    None => None,
                };
                match self.domains.decide(process.id, activation.edge, reset_value) {
                    ClockedAction::Reset => {
                        let reset = clocking.reset.iter().flat_map(|r| r.values.iter());
                        for (register, value) in reset {
                            effects.writes.push(PendingWrite {
                                signal: *register,
                                low: 0,
                                value: value.clone(),
                            });
                        }
                    }
                    ClockedAction::Evaluate => exec_statement(&ctx, &process.body, &mut effects)?,
                    ClockedAction::Hold => {}
                }
            }
            _ => exec_statement(&ctx, &process.body, &mut effects)?,
        }

        for write in &effects.writes {
            self.store
                .write(process.id, &process.name, write.signal, write.low, &write.value)?;
        }
        for line in effects.display {
            log::info!("[{}] {line}", process.name);
            self.display.push(line);
        }
        if effects.finish {
            log::info!("{} requested finish at t={}", process.name, self.now.ticks);
            self.finish_requested = true;
        }
        Ok(())
    }

    /// Builds the next active set from committed changes.
    fn reactivate(&mut self, changes: Vec<Change>) -> Result<ActiveSet, SimError> {
        let mut next = ActiveSet::new();
        for change in changes {
            let current = self.store.read(change.signal)?.clone();
            for &pid in &self.design.signal(change.signal).observers {
                let process = self.design.process(pid);
                let edge = match &process.sensitivity {
                    Sensitivity::Combinational => false,
                    Sensitivity::Clocked(c) => {
                        let edge = c.clock == change.signal
                            && detect_edge(&change.previous, &current, c.edge);
                        let reset = c.reset.as_ref().is_some_and(|r| {
                            r.kind == ResetKind::Asynchronous && r.signal == change.signal
                        });
                        if !edge && !reset {
                            continue;
                        }
                        edge
                    }
                    Sensitivity::Periodic { .. } => continue,
                };
                next.entry(process.rank())
                    .or_insert(Activation { process: pid, edge: false })
                    .edge |= edge;
            }
            self.instant.push(SettledChange {
                signal: change.signal,
                previous: change.previous,
                current,
            });
        }
        Ok(next)
    }

    /// Sends the settled value of every signal that changed this instant.
    fn emit_trace(&mut self) -> Result<(), SimError> {
        if self.sinks.is_empty() {
            return Ok(());
        }
        let mut changed: Vec<SignalId> = self.instant.iter().map(|c| c.signal).collect();
        changed.sort();
        changed.dedup();
        for signal in changed {
            let value = self.store.read(signal)?;
            let Some(last) = self.traced.get_mut(signal.as_raw() as usize) else {
                continue;
            };
            if last == value {
                continue;
            }
            for sink in &mut self.sinks {
                sink.record_change(self.now.ticks, signal, value)?;
            }
            *last = value.clone();
        }
        Ok(())
    }
}
