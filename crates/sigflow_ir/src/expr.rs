//! Expressions evaluated inside process bodies.

use crate::ids::SignalId;
use serde::{Deserialize, Serialize};
use sigflow_common::LogicVec;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Bitwise NOT (`~`).
    Not,
    /// Two's complement negation (`-`).
    Neg,
    /// AND reduction (`&`), one bit.
    RedAnd,
    /// OR reduction (`|`), one bit.
    RedOr,
    /// XOR reduction (`^`), one bit.
    RedXor,
    /// Logical NOT (`!`), one bit.
    LogicNot,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition, wrapping at the result width.
    Add,
    /// Subtraction, wrapping at the result width.
    Sub,
    /// Multiplication, wrapping at the result width.
    Mul,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Logical shift left by an unsigned amount.
    Shl,
    /// Shift right by an unsigned amount; arithmetic when the left operand
    /// is signed.
    Shr,
    /// Equality, one bit.
    Eq,
    /// Inequality, one bit.
    Ne,
    /// Less-than, one bit. Signed only when both operands are signed.
    Lt,
    /// Less-or-equal, one bit.
    Le,
    /// Greater-than, one bit.
    Gt,
    /// Greater-or-equal, one bit.
    Ge,
    /// Logical AND, one bit.
    LogicAnd,
    /// Logical OR, one bit.
    LogicOr,
}

impl BinaryOp {
    /// True for operators whose result is a single bit.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::LogicAnd
                | BinaryOp::LogicOr
        )
    }
}

/// Widest value a [`Expr::Repeat`] may produce.
pub const MAX_REPEAT_WIDTH: u32 = 1 << 20;

/// A side-effect-free expression over current signal values.
///
/// Values are unsigned unless wrapped in [`Expr::Signed`]. Signedness
/// follows the usual HDL rule: an operation is signed only when every
/// operand it extends is signed, and a signed result is sign-extended when
/// it is widened, including on assignment to a wider target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// Current value of a signal.
    Signal(SignalId),
    /// A constant.
    Literal(LogicVec),
    /// A unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `condition ? true_val : false_val`.
    Ternary {
        /// One-bit condition (the LSB is tested).
        condition: Box<Expr>,
        /// Value when the condition is 1.
        true_val: Box<Expr>,
        /// Value when the condition is 0.
        false_val: Box<Expr>,
    },
    /// Concatenation, first element most significant.
    Concat(Vec<Expr>),
    /// `count` copies of `expr` concatenated.
    Repeat {
        /// Repeated value.
        expr: Box<Expr>,
        /// Number of copies.
        count: u32,
    },
    /// A single constant-index bit.
    Index {
        /// Indexed value.
        expr: Box<Expr>,
        /// Bit position.
        index: u32,
    },
    /// Constant bit range `high..=low`.
    Slice {
        /// Sliced value.
        expr: Box<Expr>,
        /// Most significant bit, inclusive.
        high: u32,
        /// Least significant bit, inclusive.
        low: u32,
    },
    /// The same bits read as a two's complement number.
    Signed(Box<Expr>),
}

impl Expr {
    /// Reads a signal.
    pub fn signal(id: SignalId) -> Self {
        Expr::Signal(id)
    }

    /// An unsigned constant of the given width.
    pub fn constant(value: u64, width: u32) -> Self {
        Expr::Literal(LogicVec::from_u64(value, width))
    }

    /// A two's complement constant of the given width, marked signed.
    pub fn signed_constant(value: i64, width: u32) -> Self {
        Self::signed(Expr::Literal(LogicVec::from_u64(value as u64, width)))
    }

    /// Reads `expr` as a two's complement number.
    pub fn signed(expr: Expr) -> Self {
        Expr::Signed(Box::new(expr))
    }

    /// A one-bit constant.
    pub fn bit(value: bool) -> Self {
        Expr::Literal(LogicVec::from_bool(value))
    }

    /// Applies a unary operator.
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Applies a binary operator.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Bitwise NOT.
    pub fn not(operand: Expr) -> Self {
        Self::unary(UnaryOp::Not, operand)
    }

    /// Conditional select.
    pub fn ternary(condition: Expr, true_val: Expr, false_val: Expr) -> Self {
        Expr::Ternary {
            condition: Box::new(condition),
            true_val: Box::new(true_val),
            false_val: Box::new(false_val),
        }
    }

    /// Constant slice `high..=low`.
    pub fn slice(expr: Expr, high: u32, low: u32) -> Self {
        Expr::Slice {
            expr: Box::new(expr),
            high,
            low,
        }
    }

    /// True if the value is interpreted as two's complement.
    pub fn is_signed(&self) -> bool {
        match self {
            Expr::Signed(_) => true,
            Expr::Unary { op, operand } => {
                matches!(op, UnaryOp::Not | UnaryOp::Neg) && operand.is_signed()
            }
            Expr::Binary { op, lhs, rhs } => match op {
                op if op.is_boolean() => false,
                BinaryOp::Shl | BinaryOp::Shr => lhs.is_signed(),
                _ => lhs.is_signed() && rhs.is_signed(),
            },
            Expr::Ternary {
                true_val,
                false_val,
                ..
            } => true_val.is_signed() && false_val.is_signed(),
            _ => false,
        }
    }

    /// Result width, given the width of each referenced signal. Saturates
    /// at `u32::MAX`.
    pub fn width(&self, signal_width: &impl Fn(SignalId) -> u32) -> u32 {
        match self {
            Expr::Signal(id) => signal_width(*id),
            Expr::Literal(v) => v.width(),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not | UnaryOp::Neg => operand.width(signal_width),
                UnaryOp::RedAnd | UnaryOp::RedOr | UnaryOp::RedXor | UnaryOp::LogicNot => 1,
            },
            Expr::Binary { op, lhs, rhs } => match op {
                op if op.is_boolean() => 1,
                BinaryOp::Shl | BinaryOp::Shr => lhs.width(signal_width),
                _ => lhs.width(signal_width).max(rhs.width(signal_width)),
            },
            Expr::Ternary {
                true_val,
                false_val,
                ..
            } => true_val.width(signal_width).max(false_val.width(signal_width)),
            Expr::Concat(parts) => parts
                .iter()
                .fold(0u32, |acc, p| acc.saturating_add(p.width(signal_width))),
            Expr::Repeat { expr, count } => expr.width(signal_width).saturating_mul(*count),
            Expr::Index { .. } => 1,
            Expr::Slice { high, low, .. } => high.saturating_sub(*low).saturating_add(1),
            Expr::Signed(expr) => expr.width(signal_width),
        }
    }

    /// Calls `f` on this expression and every subexpression, pre-order.
    pub fn visit(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Signal(_) | Expr::Literal(_) => {}
            Expr::Unary { operand, .. } => operand.visit(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.visit(f);
                rhs.visit(f);
            }
            Expr::Ternary {
                condition,
                true_val,
                false_val,
            } => {
                condition.visit(f);
                true_val.visit(f);
                false_val.visit(f);
            }
            Expr::Concat(parts) => parts.iter().for_each(|p| p.visit(f)),
            Expr::Repeat { expr, .. }
            | Expr::Index { expr, .. }
            | Expr::Slice { expr, .. }
            | Expr::Signed(expr) => expr.visit(f),
        }
    }

    /// Appends every signal read by this expression to `out`.
    pub fn collect_reads(&self, out: &mut Vec<SignalId>) {
        match self {
            Expr::Signal(id) => out.push(*id),
            Expr::Literal(_) => {}
            Expr::Unary { operand, .. } => operand.collect_reads(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_reads(out);
                rhs.collect_reads(out);
            }
            Expr::Ternary {
                condition,
                true_val,
                false_val,
            } => {
                condition.collect_reads(out);
                true_val.collect_reads(out);
                false_val.collect_reads(out);
            }
            Expr::Concat(parts) => parts.iter().for_each(|p| p.collect_reads(out)),
            Expr::Repeat { expr, .. }
            | Expr::Index { expr, .. }
            | Expr::Slice { expr, .. }
            | Expr::Signed(expr) => expr.collect_reads(out),
        }
    }
}

impl From<SignalId> for Expr {
    fn from(id: SignalId) -> Self {
        Expr::Signal(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widths(id: SignalId) -> u32 {
        id.as_raw() + 1
    }

    #[test]
    fn width_of_arithmetic_is_widest_operand() {
        let e = Expr::binary(
            BinaryOp::Add,
            Expr::signal(SignalId::from_raw(3)),
            Expr::constant(1, 1),
        );
        assert_eq!(e.width(&widths), 4);
    }

    #[test]
    fn width_of_comparisons_and_reductions_is_one() {
        let a = Expr::signal(SignalId::from_raw(7));
        assert_eq!(Expr::binary(BinaryOp::Eq, a.clone(), a.clone()).width(&widths), 1);
        assert_eq!(Expr::unary(UnaryOp::RedXor, a).width(&widths), 1);
    }

    #[test]
    fn width_of_structural_forms() {
        let a = Expr::signal(SignalId::from_raw(3));
        let concat = Expr::Concat(vec![a.clone(), Expr::bit(true)]);
        assert_eq!(concat.width(&widths), 5);
        let rep = Expr::Repeat {
            expr: Box::new(a.clone()),
            count: 3,
        };
        assert_eq!(rep.width(&widths), 12);
        assert_eq!(Expr::slice(a.clone(), 2, 1).width(&widths), 2);
        let shl = Expr::binary(BinaryOp::Shl, a, Expr::constant(1, 8));
        assert_eq!(shl.width(&widths), 4);
    }

    #[test]
    fn huge_repeat_width_saturates() {
        let rep = Expr::Repeat {
            expr: Box::new(Expr::signal(SignalId::from_raw(15))),
            count: u32::MAX / 4,
        };
        assert_eq!(rep.width(&widths), u32::MAX);
        let concat = Expr::Concat(vec![rep.clone(), rep]);
        assert_eq!(concat.width(&widths), u32::MAX);
    }

    #[test]
    fn signedness_needs_every_extended_operand_signed() {
        let a = Expr::signal(SignalId::from_raw(3));
        let sa = Expr::signed(a.clone());
        assert!(sa.is_signed());
        assert!(!a.is_signed());
        assert!(Expr::binary(BinaryOp::Sub, sa.clone(), Expr::signed_constant(-1, 4)).is_signed());
        assert!(!Expr::binary(BinaryOp::Add, sa.clone(), a.clone()).is_signed());
        assert!(Expr::binary(BinaryOp::Shr, sa.clone(), a.clone()).is_signed());
        assert!(!Expr::binary(BinaryOp::Lt, sa.clone(), sa.clone()).is_signed());
        assert!(Expr::unary(UnaryOp::Neg, sa.clone()).is_signed());
        assert!(!Expr::Concat(vec![sa.clone()]).is_signed());
        assert_eq!(sa.width(&widths), 4);
    }

    #[test]
    fn visit_reaches_nested_expressions() {
        let a = Expr::signal(SignalId::from_raw(0));
        let e = Expr::signed(Expr::Repeat {
            expr: Box::new(Expr::slice(a, 1, 0)),
            count: 2,
        });
        let mut repeats = 0;
        let mut total = 0;
        e.visit(&mut |node| {
            total += 1;
            if matches!(node, Expr::Repeat { .. }) {
                repeats += 1;
            }
        });
        assert_eq!((repeats, total), (1, 4));
    }

    #[test]
    fn collect_reads_walks_all_operands() {
        let (a, b, c) = (
            SignalId::from_raw(0),
            SignalId::from_raw(1),
            SignalId::from_raw(2),
        );
        let e = Expr::ternary(
            a.into(),
            Expr::not(b.into()),
            Expr::Concat(vec![c.into(), Expr::bit(false)]),
        );
        let mut reads = Vec::new();
        e.collect_reads(&mut reads);
        assert_eq!(reads, vec![a, b, c]);
    }
}
