//! Packed vectors of four-state bits carrying every signal value.

use crate::logic::Logic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// A fixed-width vector of [`Logic`] bits.
///
/// Bit 0 is the least significant bit. Each bit occupies two bits of a
/// `u64` word, 32 bits per word.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicVec {
    width: u32,
    words: Vec<u64>,
}

const BITS_PER_WORD: u32 = 32;

impl LogicVec {
    /// Creates an all-zero vector of the given width.
    pub fn new(width: u32) -> Self {
        Self {
            width,
            words: vec![0; width.div_ceil(BITS_PER_WORD) as usize],
        }
    }

    /// Creates a vector with every bit set to `value`.
    pub fn filled(width: u32, value: Logic) -> Self {
        let mut v = Self::new(width);
        for i in 0..width {
            v.set(i, value);
        }
        v
    }

    /// Creates an all-`X` vector, the value of every signal before it is driven.
    pub fn all_x(width: u32) -> Self {
        Self::filled(width, Logic::X)
    }

    /// Creates a single-bit vector.
    pub fn from_bool(value: bool) -> Self {
        Self::filled(1, Logic::from_bool(value))
    }

    /// Creates a vector holding the low `width` bits of `value`.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let mut v = Self::new(width);
        for i in 0..width.min(64) {
            if (value >> i) & 1 == 1 {
                v.set(i, Logic::One);
            }
        }
        v
    }

    /// Parses a binary string, most significant bit first (`"10xz"`).
    pub fn from_binary_str(s: &str) -> Option<Self> {
        let mut v = Self::new(s.chars().count() as u32);
        for (i, c) in s.chars().rev().enumerate() {
            v.set(i as u32, Logic::from_char(c)?);
        }
        Some(v)
    }

    /// Number of bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        assert!(index < self.width, "bit {index} out of range for width {}", self.width);
        let word = self.words[(index / BITS_PER_WORD) as usize];
        match (word >> ((index % BITS_PER_WORD) * 2)) & 0b11 {
            0 => Logic::Zero,
            1 => Logic::One,
            2 => Logic::X,
            _ => Logic::Z,
        }
    }

    /// Sets bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: Logic) {
        assert!(index < self.width, "bit {index} out of range for width {}", self.width);
        let word = &mut self.words[(index / BITS_PER_WORD) as usize];
        let shift = (index % BITS_PER_WORD) * 2;
        *word = (*word & !(0b11 << shift)) | ((value as u64) << shift);
    }

    /// Least significant bit, or `X` for a zero-width vector.
    pub fn lsb(&self) -> Logic {
        if self.width == 0 {
            Logic::X
        } else {
            self.get(0)
        }
    }

    /// Iterates bits from least to most significant.
    pub fn bits(&self) -> impl Iterator<Item = Logic> + '_ {
        (0..self.width).map(|i| self.get(i))
    }

    /// Returns the unsigned value, or `None` if any bit is `X`/`Z` or the
    /// vector is wider than 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.width > 64 {
            return None;
        }
        let mut out = 0u64;
        for (i, bit) in self.bits().enumerate() {
            match bit {
                Logic::Zero => {}
                Logic::One => out |= 1 << i,
                Logic::X | Logic::Z => return None,
            }
        }
        Some(out)
    }

    /// Returns the two's complement value, or `None` if any bit is `X`/`Z`
    /// or the vector is wider than 64 bits.
    pub fn to_i64(&self) -> Option<i64> {
        let raw = self.to_u64()?;
        if self.width == 0 || self.width == 64 {
            return Some(raw as i64);
        }
        let shift = 64 - self.width;
        Some(((raw << shift) as i64) >> shift)
    }

    /// True if any bit is `X` or `Z`.
    pub fn has_unknown(&self) -> bool {
        self.bits().any(|b| !b.is_known())
    }

    /// True if every bit is `Zero`.
    pub fn is_all_zero(&self) -> bool {
        self.bits().all(|b| b == Logic::Zero)
    }

    /// Copy of this vector at `width` bits, zero-filling new high bits and
    /// dropping bits above `width`.
    pub fn resized(&self, width: u32) -> Self {
        let mut out = Self::new(width);
        for i in 0..width.min(self.width) {
            out.set(i, self.get(i));
        }
        out
    }

    /// Copy of this vector at `width` bits, copying the most significant bit
    /// into new high bits. Narrowing truncates like [`resized`](Self::resized).
    pub fn sign_extended(&self, width: u32) -> Self {
        let mut out = self.resized(width);
        if self.width > 0 {
            let sign = self.get(self.width - 1);
            for i in self.width..width {
                out.set(i, sign);
            }
        }
        out
    }

    /// Extracts `width` bits starting at bit `low`. Bits past the end read as `X`.
    pub fn slice(&self, low: u32, width: u32) -> Self {
        let mut out = Self::new(width);
        for i in 0..width {
            let src = low + i;
            out.set(i, if src < self.width { self.get(src) } else { Logic::X });
        }
        out
    }

    /// Overwrites bits starting at `low` with `part`. Bits past the end are dropped.
    pub fn splice(&mut self, low: u32, part: &LogicVec) {
        for i in 0..part.width {
            let dst = low + i;
            if dst < self.width {
                self.set(dst, part.get(i));
            }
        }
    }

    /// Concatenates `parts`, the first element ending up in the most
    /// significant position.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a LogicVec>) -> Self {
        let parts: Vec<&LogicVec> = parts.into_iter().collect();
        let mut out = Self::new(parts.iter().map(|p| p.width).sum());
        let mut low = 0;
        for part in parts.iter().rev() {
            out.splice(low, part);
            low += part.width;
        }
        out
    }
}

impl fmt::Display for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width).rev() {
            write!(f, "{}", self.get(i))?;
        }
        Ok(())
    }
}

impl fmt::Debug for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'b{self}", self.width)
    }
}

fn zip_bits(a: &LogicVec, b: &LogicVec, op: impl Fn(Logic, Logic) -> Logic) -> LogicVec {
    let width = a.width.max(b.width);
    let (a, b) = (a.resized(width), b.resized(width));
    let mut out = LogicVec::new(width);
    for i in 0..width {
        out.set(i, op(a.get(i), b.get(i)));
    }
    out
}

/// Bitwise AND; the narrower operand is zero-extended.
impl BitAnd for &LogicVec {
    type Output = LogicVec;

    fn bitand(self, rhs: Self) -> LogicVec {
        zip_bits(self, rhs, |a, b| a & b)
    }
}

/// Bitwise OR; the narrower operand is zero-extended.
impl BitOr for &LogicVec {
    type Output = LogicVec;

    fn bitor(self, rhs: Self) -> LogicVec {
        zip_bits(self, rhs, |a, b| a | b)
    }
}

/// Bitwise XOR; the narrower operand is zero-extended.
impl BitXor for &LogicVec {
    type Output = LogicVec;

    fn bitxor(self, rhs: Self) -> LogicVec {
        zip_bits(self, rhs, |a, b| a ^ b)
    }
}

impl Not for &LogicVec {
    type Output = LogicVec;

    fn not(self) -> LogicVec {
        let mut out = LogicVec::new(self.width);
        for i in 0..self.width {
            out.set(i, !self.get(i));
        }
        out
    }
}
