//! Data model of an elaborated RTL design.
//!
//! A design is a tree of [`Instance`]s owning [`Signal`]s (wires and
//! registers) and [`Process`]es. Each process has a [`Statement`] body and an
//! explicit [`Sensitivity`]: combinational, clocked with an optional reset,
//! or periodic stimulus. Designs are built through an [`ElabContext`] and
//! frozen into a [`Design`], whose [`SignalGraph`] records the driver and
//! observer relations the checker and the scheduler work from.

#![warn(missing_docs)]

pub mod arena;
pub mod design;
pub mod elaborate;
pub mod error;
pub mod expr;
pub mod graph;
pub mod ids;
pub mod instance;
pub mod process;
pub mod signal;
pub mod stmt;

pub use arena::{Arena, ArenaId};
pub use design::Design;
pub use elaborate::{elaborate, ElabContext, Elaborator};
pub use error::ElabError;
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use graph::SignalGraph;
pub use ids::{InstanceId, ProcessId, SignalId};
pub use instance::{Instance, Port, PortDirection};
pub use process::{Clocking, Edge, Process, ProcessClass, Reset, ResetKind, Sensitivity};
pub use signal::{Signal, SignalKind, SignalRef};
pub use stmt::{CaseArm, Statement};
