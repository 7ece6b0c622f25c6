//! Structured findings about an elaborated design.
//!
//! The synthesizability checker reports every finding as a [`Diagnostic`]
//! carrying a severity, a stable code (`E101`, `W101`, ...) and the design
//! objects it concerns. A [`DiagnosticSink`] accumulates them and a
//! [`TerminalRenderer`] turns them into rustc-style text.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod label;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use label::{Label, LabelStyle, Subject};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
