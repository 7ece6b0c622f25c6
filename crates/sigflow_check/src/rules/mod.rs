//! All built-in check rules.
//!
//! Error rules (E101-E105) reject a design by default; warning rules
//! (W101-W103) only report.

mod e101;
mod e102;
mod e103;
mod e104;
mod e105;
mod w101;
mod w102;
mod w103;

pub use e101::MultipleDrivers;
pub use e102::CombinationalLoop;
pub use e103::WidthMismatch;
pub use e104::DriverViolation;
pub use e105::DualEdgeClock;
pub use w101::LatchInference;
pub use w102::MissingReset;
pub use w103::KindMismatch;

use crate::Checker;

/// Registers the eight built-in rules with the checker, errors first.
pub fn register_builtin_rules(checker: &mut Checker) {
    checker.register(Box::new(MultipleDrivers));
    checker.register(Box::new(CombinationalLoop));
    checker.register(Box::new(WidthMismatch));
    checker.register(Box::new(DriverViolation));
    checker.register(Box::new(DualEdgeClock));
    checker.register(Box::new(LatchInference));
    checker.register(Box::new(MissingReset));
    checker.register(Box::new(KindMismatch));
}
