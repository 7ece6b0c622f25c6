//! Simulation time: integer ticks plus a delta-cycle index.
//!
//! The kernel is unit-less; a tick is whatever the trace timescale says it
//! is. Within one tick, delta cycles order the zero-delay propagation steps.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A simulation time point with delta-cycle tracking.
///
/// Ordered first by tick, then by delta index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimTime {
    /// Simulated instant in ticks.
    pub ticks: u64,
    /// Delta cycle index within the instant.
    pub delta: u32,
}

impl SimTime {
    /// Time zero, delta zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// An instant at delta zero.
    pub fn from_ticks(ticks: u64) -> Self {
        Self { ticks, delta: 0 }
    }

    /// The next delta cycle at the same instant.
    pub fn next_delta(&self) -> Self {
        Self {
            ticks: self.ticks,
            delta: self.delta + 1,
        }
    }

    /// Moves to a later instant, resetting the delta counter.
    pub fn advance_to(&self, ticks: u64) -> Self {
        debug_assert!(
            ticks >= self.ticks,
            "cannot advance backwards: {} -> {}",
            self.ticks,
            ticks
        );
        Self { ticks, delta: 0 }
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ticks
            .cmp(&other.ticks)
            .then(self.delta.cmp(&other.delta))
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ticks)?;
        if self.delta > 0 {
            write!(f, "+d{}", self.delta)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_ticks_then_delta() {
        let a = SimTime::from_ticks(5);
        let b = a.next_delta();
        let c = SimTime::from_ticks(6);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(b.advance_to(6), c);
    }

    #[test]
    fn display() {
        assert_eq!(SimTime::zero().to_string(), "0");
        assert_eq!(SimTime::from_ticks(40).next_delta().next_delta().to_string(), "40+d2");
    }
}
