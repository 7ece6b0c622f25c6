//! Delta-cycle simulation kernel for checked sigflow designs.
//!
//! This crate executes a [`CheckedDesign`](sigflow_check::CheckedDesign)
//! with 4-state values and deterministic RTL semantics: processes write to
//! pending slots, all pending values are committed at once, and processes
//! sensitive to a committed change run again in the next delta cycle at the
//! same instant. Clocked processes wake on their clock edge or on a change
//! of their asynchronous reset.
//!
//! Within a delta cycle, triggered processes run in rank order: instances
//! in elaboration order, then processes in declaration order within the
//! instance. Because reads only ever see committed values, this order never
//! changes simulation results; it fixes the order of `Display` output and of
//! the first error reported.
//!
//! # Usage
//!
//! ```ignore
//! use sigflow_config::KernelConfig;
//! use sigflow_sim::{RunState, Testbench};
//!
//! let mut tb = Testbench::from_design(design, &KernelConfig::default())?;
//! tb.set_u64("top.rst", 1)?;
//! tb.advance(10)?;
//! tb.set_u64("top.rst", 0)?;
//! assert_eq!(tb.advance(100)?, RunState::Running);
//! println!("count = {}", tb.get_u64("top.count")?);
//! ```
//!
//! # Modules
//!
//! - `error`: simulation error types
//! - `time`: integer ticks with delta cycles
//! - `value`: current and pending signal values
//! - `domain`: clock domains, reset disciplines and edge detection
//! - `evaluator`: expression evaluation and statement execution
//! - `kernel`: event queue and delta-cycle loop
//! - `testbench`: the driver API used by tests
//! - `trace`: VCD output, in-memory traces and VCD replay

#![warn(missing_docs)]

pub mod domain;
pub mod error;
pub mod evaluator;
pub mod kernel;
pub mod testbench;
pub mod time;
pub mod trace;
pub mod value;

pub use domain::{ClockDomain, ClockedAction, DomainMap, ResetDiscipline};
pub use error::SimError;
pub use kernel::Kernel;
pub use testbench::{RunState, Testbench};
pub use time::SimTime;
pub use trace::{read_vcd, TraceLog, TraceRecord, TraceSink, VcdRecorder, VcdTrace};
pub use value::SignalStore;
