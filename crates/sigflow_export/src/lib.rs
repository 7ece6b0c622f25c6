//! Structural export of checked sigflow designs.
//!
//! [`NetlistView::from_checked`] flattens a
//! [`CheckedDesign`](sigflow_check::CheckedDesign) into instances, signals
//! and processes with their sensitivity classification and write sets, which
//! is everything a downstream tool needs to emit an equivalent HDL module.
//! Views can be stored as JSON or in a checksummed binary format, and
//! re-imported with [`NetlistView::into_design`].

#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod generator;
pub mod view;

pub use codec::{decode, encode, from_json, read_netlist, to_json, write_netlist};
pub use error::ExportError;
pub use generator::{JsonGenerator, NetlistGenerator};
pub use view::{InstanceView, NetlistView, ProcessView, SignalView};
