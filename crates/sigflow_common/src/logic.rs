//! Four-state logic scalar with table-driven IEEE 1164 operators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// One bit of a signal value.
///
/// `X` is an unknown or uninitialized value; `Z` is an undriven (high-impedance)
/// bit. Both propagate as `X` through every logic operator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Logic {
    /// Driven low.
    Zero = 0,
    /// Driven high.
    One = 1,
    /// Unknown.
    X = 2,
    /// High impedance.
    Z = 3,
}

use Logic::{One, Zero, X, Z};

// Rows and columns are indexed by the `repr(u8)` discriminant: 0, 1, X, Z.
const AND: [[Logic; 4]; 4] = [
    [Zero, Zero, Zero, Zero],
    [Zero, One, X, X],
    [Zero, X, X, X],
    [Zero, X, X, X],
];

const OR: [[Logic; 4]; 4] = [
    [Zero, One, X, X],
    [One, One, One, One],
    [X, One, X, X],
    [X, One, X, X],
];

const XOR: [[Logic; 4]; 4] = [
    [Zero, One, X, X],
    [One, Zero, X, X],
    [X, X, X, X],
    [X, X, X, X],
];

impl Logic {
    /// Parses a single value character: `0`, `1`, `x`/`X`, `z`/`Z`.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Zero),
            '1' => Some(One),
            'x' | 'X' => Some(X),
            'z' | 'Z' => Some(Z),
            _ => None,
        }
    }

    /// Lowercase character used in value-change dumps.
    pub fn to_vcd_char(self) -> char {
        match self {
            Zero => '0',
            One => '1',
            X => 'x',
            Z => 'z',
        }
    }

    /// `One` for `true`, `Zero` for `false`.
    pub fn from_bool(value: bool) -> Self {
        if value {
            One
        } else {
            Zero
        }
    }

    /// Returns true for `Zero` and `One`.
    pub fn is_known(self) -> bool {
        matches!(self, Zero | One)
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Zero => '0',
            One => '1',
            X => 'X',
            Z => 'Z',
        };
        write!(f, "{c}")
    }
}

impl BitAnd for Logic {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        AND[self as usize][rhs as usize]
    }
}

impl BitOr for Logic {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        OR[self as usize][rhs as usize]
    }
}

impl BitXor for Logic {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        XOR[self as usize][rhs as usize]
    }
}

impl Not for Logic {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Zero => One,
            One => Zero,
            X | Z => X,
        }
    }
}
