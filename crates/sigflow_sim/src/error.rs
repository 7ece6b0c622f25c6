//! Simulation error types.
//!
//! Every failure during kernel construction, scheduling or testbench driving
//! is a variant of [`SimError`]. Times are in kernel ticks.

use std::io;

use sigflow_check::CheckFailure;
use sigflow_common::InternalError;

/// Errors that can occur during simulation setup or execution.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The design was rejected by the checker.
    #[error(transparent)]
    Check(#[from] CheckFailure),

    /// A value was written by something that is not the signal's registered
    /// driver.
    #[error("{driver} wrote `{signal}` but is not its registered driver")]
    DriverViolation {
        /// Hierarchical signal name.
        signal: String,
        /// Offending process name, or `testbench`.
        driver: String,
    },

    /// More than the configured number of changing update phases at one
    /// instant, i.e. the design never settles.
    #[error("no stable state at t={time} after {deltas} delta cycles")]
    SimulationTimeout {
        /// Instant at which the watchdog tripped.
        time: u64,
        /// Delta cycles executed at that instant.
        deltas: u32,
    },

    /// A process `Assert` or a testbench `check` failed.
    #[error("assertion failed at t={time}: {message}")]
    AssertionFailure {
        /// Instant of the failure.
        time: u64,
        /// Assertion message.
        message: String,
    },

    /// A testbench value does not match the signal width.
    #[error("value for `{signal}` is {found} bits wide, signal is {expected}")]
    WidthMismatch {
        /// Hierarchical signal name.
        signal: String,
        /// Signal width.
        expected: u32,
        /// Value width.
        found: u32,
    },

    /// No signal with this hierarchical name exists.
    #[error("unknown signal `{0}`")]
    UnknownSignal(String),

    /// A signal holds `X`/`Z` bits (or is wider than 64 bits) where a number
    /// was requested.
    #[error("`{signal}` has no numeric value ({value:?})")]
    NotNumeric {
        /// Hierarchical signal name.
        signal: String,
        /// The current value.
        value: sigflow_common::LogicVec,
    },

    /// A stimulus event was scheduled at or before the current instant.
    #[error("cannot schedule an event at t={at}, the current time is {now}")]
    EventInPast {
        /// Requested time.
        at: u64,
        /// Current time.
        now: u64,
    },

    /// A testbench wait ran out of scheduled activity.
    #[error("waited for {event} of `{signal}` but nothing is scheduled after t={time}")]
    Idle {
        /// Awaited signal.
        signal: String,
        /// Awaited event, e.g. `rising edge` or `change`.
        event: String,
        /// Time when activity ran out.
        time: u64,
    },

    /// A testbench wait would have crossed the configured time limit.
    #[error("time limit of {limit} reached")]
    TimeLimit {
        /// The configured limit.
        limit: u64,
    },

    /// The run has already ended and cannot be driven further.
    #[error("the simulation has ended at t={time}")]
    Ended {
        /// Time at which it ended.
        time: u64,
    },

    /// An I/O error occurred while writing or reading a trace.
    #[error("trace I/O error: {0}")]
    TraceIo(#[from] io::Error),

    /// A trace file could not be parsed.
    #[error("trace parse error at line {line}: {message}")]
    TraceParse {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        message: String,
    },

    /// A kernel invariant was broken.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
