//! Shared foundational types for the sigflow RTL kernel.
//!
//! This crate provides the four-state logic scalar, the packed logic vector
//! that carries every signal value, content hashing used to fingerprint
//! exported netlists, and the internal error type for kernel invariant
//! violations.

#![warn(missing_docs)]

pub mod hash;
pub mod logic;
pub mod logic_vec;
pub mod result;

pub use hash::ContentHash;
pub use logic::Logic;
pub use logic_vec::LogicVec;
pub use result::{InternalError, SigResult};
