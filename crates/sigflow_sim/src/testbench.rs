//! Testbench driver.
//!
//! A [`Testbench`] drives a [`Kernel`] from test code: it sets inputs,
//! advances simulated time and reads back settled values. Signals are named
//! by hierarchical path (`top.counter.count`), port paths included.
//!
//! Any runtime error aborts the run: the trace sinks are flushed so the
//! records emitted so far stay readable, and further driving fails with
//! [`SimError::Ended`].

use sigflow_check::{CheckedDesign, Checker};
use sigflow_common::LogicVec;
use sigflow_config::KernelConfig;
use sigflow_ir::{Design, Edge, SignalId};

use crate::error::SimError;
use crate::kernel::Kernel;
use crate::trace::{open_trace, TraceSink};

/// Where a run stands after a call that advances time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// More activity is scheduled.
    Running,
    /// Nothing is scheduled; only new stimulus can wake the design.
    Idle,
    /// The configured time limit was reached.
    TimeLimit,
    /// The run was stopped by `stop()` or a `Finish` statement.
    Stopped,
    /// The run was aborted by an error.
    Failed,
}

impl RunState {
    fn is_over(self) -> bool {
        matches!(self, RunState::Stopped | RunState::Failed)
    }
}

/// Drives a simulation run.
pub struct Testbench {
    kernel: Kernel,
    state: RunState,
    time_limit: Option<u64>,
}

impl Testbench {
    /// Creates a testbench for a checked design. When `config.trace.path` is
    /// set, a VCD file is written there.
    pub fn new(design: CheckedDesign, config: &KernelConfig) -> Result<Self, SimError> {
        let mut kernel = Kernel::new(design, &config.sim);
        if let Some(sink) = open_trace(&config.trace)? {
            kernel.add_sink(sink)?;
        }
        Ok(Self {
            kernel,
            state: RunState::Running,
            time_limit: config.sim.time_limit,
        })
    }

    /// Checks `design` under `config.check`, then creates a testbench.
    pub fn from_design(design: Design, config: &KernelConfig) -> Result<Self, SimError> {
        let checked = Checker::new(&config.check).check(design)?;
        Self::new(checked, config)
    }

    /// Attaches another trace sink.
    pub fn with_sink(mut self, sink: impl TraceSink + 'static) -> Result<Self, SimError> {
        self.kernel.add_sink(Box::new(sink))?;
        Ok(self)
    }

    /// The underlying kernel.
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Current instant.
    pub fn now(&self) -> u64 {
        self.kernel.now().ticks
    }

    /// State of the run.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Lines produced by `Display` statements so far.
    pub fn display_log(&self) -> &[String] {
        self.kernel.display_log()
    }

    /// Resolves a hierarchical signal name.
    pub fn signal(&self, path: &str) -> Result<SignalId, SimError> {
        self.kernel
            .design()
            .find_signal(path)
            .ok_or_else(|| SimError::UnknownSignal(path.to_string()))
    }

    fn ensure_live(&self) -> Result<(), SimError> {
        if self.state.is_over() {
            return Err(SimError::Ended { time: self.now() });
        }
        Ok(())
    }

    /// Validates a testbench write: the signal must be undriven and the
    /// value the signal's width.
    fn stimulus_target(&self, path: &str, value: &LogicVec) -> Result<SignalId, SimError> {
        let id = self.signal(path)?;
        let signal = self.kernel.design().signal(id);
        if self.kernel.is_driven(id)? {
            return Err(SimError::DriverViolation {
                signal: signal.name.clone(),
                driver: "testbench".to_string(),
            });
        }
        if value.width() != signal.width {
            return Err(SimError::WidthMismatch {
                signal: signal.name.clone(),
                expected: signal.width,
                found: value.width(),
            });
        }
        Ok(id)
    }

    /// Flushes the trace and marks the run failed, returning `err`.
    fn abort(&mut self, err: SimError) -> SimError {
        log::error!("run aborted at t={}: {err}", self.now());
        self.state = RunState::Failed;
        if let Err(flush) = self.kernel.finalize() {
            log::warn!("trace flush after abort failed: {flush}");
        }
        err
    }

    fn guard<T>(&mut self, result: Result<T, SimError>) -> Result<T, SimError> {
        result.map_err(|e| self.abort(e))
    }

    fn start(&mut self) -> Result<(), SimError> {
        if self.kernel.is_started() {
            return Ok(());
        }
        let result = self.kernel.start();
        self.guard(result)?;
        self.after_iteration()
    }

    /// Turns a `Finish` into a stop.
    fn after_iteration(&mut self) -> Result<(), SimError> {
        if self.kernel.finish_requested() && !self.state.is_over() {
            self.stop()?;
        }
        Ok(())
    }

    /// Drives `path` to `value`. Before the run starts this sets the initial
    /// value; afterwards the write is applied at the current instant and
    /// settled before returning.
    pub fn set(&mut self, path: &str, value: LogicVec) -> Result<(), SimError> {
        self.ensure_live()?;
        let id = self.stimulus_target(path, &value)?;
        if !self.kernel.is_started() {
            return self.kernel.initialize(id, value);
        }
        let result = self.kernel.apply_external(id, &value);
        self.guard(result)?;
        self.after_iteration()
    }

    /// [`set`](Self::set) from an unsigned number.
    pub fn set_u64(&mut self, path: &str, value: u64) -> Result<(), SimError> {
        let width = self.kernel.design().signal(self.signal(path)?).width;
        self.set(path, LogicVec::from_u64(value, width))
    }

    /// Current settled value of `path`.
    pub fn get(&self, path: &str) -> Result<LogicVec, SimError> {
        self.kernel.read(self.signal(path)?).cloned()
    }

    /// Current value of `path` as a number; fails if any bit is unknown.
    pub fn get_u64(&self, path: &str) -> Result<u64, SimError> {
        let value = self.get(path)?;
        value.to_u64().ok_or_else(|| SimError::NotNumeric {
            signal: path.to_string(),
            value,
        })
    }

    /// Queues `value` for `path` at instant `at`. After the run has started
    /// `at` must lie in the future.
    pub fn schedule(&mut self, path: &str, value: LogicVec, at: u64) -> Result<(), SimError> {
        self.ensure_live()?;
        let id = self.stimulus_target(path, &value)?;
        let now = self.now();
        if self.kernel.is_started() && at <= now {
            return Err(SimError::EventInPast { at, now });
        }
        self.kernel.schedule(id, value, at);
        Ok(())
    }

    /// Simulates every instant up to and including `now + duration`, then
    /// moves the clock there.
    pub fn advance(&mut self, duration: u64) -> Result<RunState, SimError> {
        self.run_until(self.now().saturating_add(duration))
    }

    /// Simulates every instant up to and including `time`.
    pub fn run_until(&mut self, time: u64) -> Result<RunState, SimError> {
        if self.state.is_over() {
            return Ok(self.state);
        }
        self.start()?;
        let end = match self.time_limit {
            Some(limit) if limit < time => limit,
            _ => time,
        };
        loop {
            if self.state.is_over() {
                return Ok(self.state);
            }
            match self.kernel.next_time() {
                Some(t) if t <= end => {
                    let result = self.kernel.step(t);
                    self.guard(result)?;
                    self.after_iteration()?;
                }
                next => {
                    self.kernel.idle_until(end);
                    self.state = if end < time {
                        log::info!("time limit reached at t={end}");
                        RunState::TimeLimit
                    } else if next.is_none() {
                        RunState::Idle
                    } else {
                        RunState::Running
                    };
                    return Ok(self.state);
                }
            }
        }
    }

    /// Advances instant by instant until `edge` occurs on `path` and returns
    /// its time. An edge at the current instant that was already simulated
    /// does not count.
    pub fn wait_for_edge(&mut self, path: &str, edge: Edge) -> Result<u64, SimError> {
        let id = self.signal(path)?;
        self.wait_until(path, &format!("{edge} edge"), |k| k.saw_edge(id, edge))
    }

    /// Advances instant by instant until `path` changes value and returns
    /// the time. Any width counts, and so does a change that settles back
    /// within the instant.
    pub fn wait_for_change(&mut self, path: &str) -> Result<u64, SimError> {
        let id = self.signal(path)?;
        self.wait_until(path, "change", |k| k.saw_change(id))
    }

    fn wait_until(
        &mut self,
        path: &str,
        event: &str,
        seen: impl Fn(&Kernel) -> bool,
    ) -> Result<u64, SimError> {
        self.ensure_live()?;
        if !self.kernel.is_started() {
            self.start()?;
            if seen(&self.kernel) {
                return Ok(0);
            }
        }
        loop {
            self.ensure_live()?;
            let Some(t) = self.kernel.next_time() else {
                self.state = RunState::Idle;
                return Err(SimError::Idle {
                    signal: path.to_string(),
                    event: event.to_string(),
                    time: self.now(),
                });
            };
            if let Some(limit) = self.time_limit.filter(|l| t > *l) {
                self.kernel.idle_until(limit);
                self.state = RunState::TimeLimit;
                return Err(SimError::TimeLimit { limit });
            }
            let result = self.kernel.step(t);
            self.guard(result)?;
            let hit = seen(&self.kernel);
            self.after_iteration()?;
            if hit {
                return Ok(t);
            }
        }
    }

    /// Fails the run with an [`SimError::AssertionFailure`] unless `condition`
    /// holds. The trace written so far is kept.
    pub fn check(&mut self, condition: bool, message: &str) -> Result<(), SimError> {
        if condition {
            return Ok(());
        }
        let err = SimError::AssertionFailure {
            time: self.now(),
            message: message.to_string(),
        };
        Err(self.abort(err))
    }

    /// Ends the run and flushes the trace.
    pub fn stop(&mut self) -> Result<(), SimError> {
        if self.state.is_over() {
            return Ok(());
        }
        log::info!("run stopped at t={}", self.now());
        self.state = RunState::Stopped;
        self.kernel.finalize()
    }

    /// Flushes the trace and consumes the testbench.
    pub fn close(mut self) -> Result<(), SimError> {
        self.kernel.finalize()
    }
}
