//! Synthesizability checker for elaborated designs.
//!
//! The checker decides whether a [`Design`] may be simulated. Fatal findings
//! (multiple drivers, combinational loops, width mismatches, driver
//! violations, dual-edge clocking) reject the design; warnings are reported and let it through.
//!
//! # Rules
//!
//! | Code | Name                 | Default  |
//! |------|----------------------|----------|
//! | E101 | `multiple-drivers`   | error    |
//! | E102 | `combinational-loop` | error    |
//! | E103 | `width-mismatch`     | error    |
//! | E104 | `driver-violation`   | error    |
//! | E105 | `dual-edge-clock`    | error    |
//! | W101 | `latch-inference`    | warning  |
//! | W102 | `missing-reset`      | warning  |
//! | W103 | `kind-mismatch`      | warning  |
//!
//! The `[check]` section of `sigflow.toml` can promote a rule to an error
//! (`deny`) or suppress it (`allow`), by name or by code. Passing the checker
//! yields a [`CheckedDesign`], the only thing the simulator accepts.

#![warn(missing_docs)]

mod engine;
mod finding;
mod helpers;
mod outcome;
mod rules;

pub use engine::Checker;
pub use finding::{Finding, ViolationReason};
pub use helpers::{assigned_bits, combinational_graph};
pub use outcome::{CheckFailure, CheckedDesign};
pub use rules::{
    register_builtin_rules, CombinationalLoop, DriverViolation, DualEdgeClock, KindMismatch,
    LatchInference, MissingReset, MultipleDrivers, WidthMismatch,
};

use sigflow_config::WidthPolicy;
use sigflow_diagnostics::{DiagnosticCode, Severity};
use sigflow_ir::Design;

/// What a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    /// The design under check.
    pub design: &'a Design,
    /// How assignment widths are reconciled.
    pub width_policy: WidthPolicy,
}

/// A single structural rule.
///
/// Rules are pure: they inspect the design and return findings. The
/// [`Checker`] decides their final severity.
pub trait CheckRule: Send + Sync {
    /// Diagnostic code (e.g. E101).
    fn code(&self) -> DiagnosticCode;

    /// Short kebab-case name (e.g. "multiple-drivers").
    fn name(&self) -> &str;

    /// Human-readable description of what the rule checks.
    fn description(&self) -> &str;

    /// Severity of findings unless configuration overrides it.
    fn default_severity(&self) -> Severity;

    /// Inspects the design and returns every finding, in a deterministic order.
    fn check(&self, cx: &CheckContext<'_>) -> Vec<Finding>;
}

/// Checks `design` with the default rule set and configuration.
pub fn check(design: Design) -> Result<CheckedDesign, CheckFailure> {
    Checker::with_defaults().check(design)
}
