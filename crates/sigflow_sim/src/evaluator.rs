//! Expression evaluator and statement executor.
//!
//! [`eval_expr`] evaluates an [`Expr`] tree against the current signal
//! values. [`exec_statement`] walks a process body and collects its writes
//! into an [`Effects`] record; nothing is applied to the store here, the
//! kernel stages the writes after the body returns.
//!
//! Arithmetic goes through `u64`, so operands wider than 64 bits or with any
//! `X`/`Z` bit produce an all-`X` result. Signed operands are sign-extended
//! to the operation width first; see [`Expr::is_signed`].

use sigflow_common::{Logic, LogicVec};
use sigflow_ir::{BinaryOp, Expr, SignalId, SignalRef, Statement, UnaryOp};

use crate::error::SimError;
use crate::value::SignalStore;

/// A deferred write collected while executing a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    /// The signal written.
    pub signal: SignalId,
    /// First bit written.
    pub low: u32,
    /// Value, already sized to the destination.
    pub value: LogicVec,
}

/// Everything a body did in one evaluation.
#[derive(Debug, Clone, Default)]
pub struct Effects {
    /// Writes in execution order; later writes to the same bits win.
    pub writes: Vec<PendingWrite>,
    /// Formatted `Display` lines.
    pub display: Vec<String>,
    /// Set by a `Finish` statement.
    pub finish: bool,
}

/// Read-only view used during evaluation.
pub struct EvalContext<'a> {
    /// Current values.
    pub store: &'a SignalStore,
    /// Current instant, for assertion messages.
    pub time: u64,
}

impl EvalContext<'_> {
    fn read(&self, signal: SignalId) -> Result<&LogicVec, SimError> {
        Ok(self.store.read(signal)?)
    }

    fn width(&self, signal: SignalId) -> Result<u32, SimError> {
        Ok(self.read(signal)?.width())
    }
}

/// Returns `true` if the least significant bit is `One`.
pub fn logic_is_true(lv: &LogicVec) -> bool {
    lv.lsb() == Logic::One
}

/// Evaluates an expression.
pub fn eval_expr(ctx: &EvalContext<'_>, expr: &Expr) -> Result<LogicVec, SimError> {
    match expr {
        Expr::Literal(lv) => Ok(lv.clone()),

        Expr::Signal(id) => ctx.read(*id).cloned(),

        Expr::Unary { op, operand } => {
            let val = eval_expr(ctx, operand)?;
            Ok(eval_unary(*op, &val))
        }

        Expr::Binary { op, lhs, rhs } => {
            let l = eval_expr(ctx, lhs)?;
            let r = eval_expr(ctx, rhs)?;
            if *op == BinaryOp::Shr && lhs.is_signed() {
                return Ok(arith_shift_right(&l, &r));
            }
            Ok(eval_binary(*op, &l, &r, lhs.is_signed() && rhs.is_signed()))
        }

        Expr::Ternary {
            condition,
            true_val,
            false_val,
        } => {
            let cond = eval_expr(ctx, condition)?;
            let signed = true_val.is_signed() && false_val.is_signed();
            let t = eval_expr(ctx, true_val)?;
            let f = eval_expr(ctx, false_val)?;
            let width = t.width().max(f.width());
            let (t, f) = (extend(&t, width, signed), extend(&f, width, signed));
            Ok(match cond.lsb() {
                Logic::One => t,
                Logic::Zero => f,
                // Unknown select: bits where both sides agree survive.
                Logic::X | Logic::Z => {
                    let mut out = LogicVec::all_x(width);
                    for i in 0..width {
                        if t.get(i) == f.get(i) && t.get(i).is_known() {
                            out.set(i, t.get(i));
                        }
                    }
                    out
                }
            })
        }

        Expr::Concat(parts) => {
            let evaluated = parts
                .iter()
                .map(|p| eval_expr(ctx, p))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(LogicVec::concat(&evaluated))
        }

        Expr::Repeat { expr, count } => {
            let val = eval_expr(ctx, expr)?;
            // Elaboration caps the result at MAX_REPEAT_WIDTH bits.
            let copies = vec![val; *count as usize];
            Ok(LogicVec::concat(&copies))
        }

        Expr::Index { expr, index } => {
            let val = eval_expr(ctx, expr)?;
            Ok(val.slice(*index, 1))
        }

        Expr::Slice { expr, high, low } => {
            let val = eval_expr(ctx, expr)?;
            Ok(val.slice(*low, high.saturating_sub(*low) + 1))
        }

        Expr::Signed(expr) => eval_expr(ctx, expr),
    }
}

/// Widens or truncates `val` to `width`, sign-extending when `signed`.
fn extend(val: &LogicVec, width: u32, signed: bool) -> LogicVec {
    if signed {
        val.sign_extended(width)
    } else {
        val.resized(width)
    }
}

fn single(bit: Logic) -> LogicVec {
    LogicVec::filled(1, bit)
}

fn eval_unary(op: UnaryOp, val: &LogicVec) -> LogicVec {
    match op {
        UnaryOp::Not => !val,
        UnaryOp::Neg => match val.to_u64() {
            Some(v) => LogicVec::from_u64(v.wrapping_neg(), val.width()),
            None => LogicVec::all_x(val.width()),
        },
        UnaryOp::RedAnd => single(val.bits().fold(Logic::One, |acc, b| acc & b)),
        UnaryOp::RedOr => single(val.bits().fold(Logic::Zero, |acc, b| acc | b)),
        UnaryOp::RedXor => single(val.bits().fold(Logic::Zero, |acc, b| acc ^ b)),
        UnaryOp::LogicNot => !&truth(val),
    }
}

/// Collapses a vector to one bit: 1 if any bit is 1, 0 if all are 0, X otherwise.
fn truth(val: &LogicVec) -> LogicVec {
    single(val.bits().fold(Logic::Zero, |acc, b| acc | b))
}

fn eval_binary(op: BinaryOp, lhs: &LogicVec, rhs: &LogicVec, signed: bool) -> LogicVec {
    let widened;
    let (lhs, rhs) = if signed && !matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
        let width = lhs.width().max(rhs.width());
        widened = (lhs.sign_extended(width), rhs.sign_extended(width));
        (&widened.0, &widened.1)
    } else {
        (lhs, rhs)
    };
    match op {
        BinaryOp::And => lhs & rhs,
        BinaryOp::Or => lhs | rhs,
        BinaryOp::Xor => lhs ^ rhs,

        BinaryOp::Add => arith_op(lhs, rhs, u64::wrapping_add),
        BinaryOp::Sub => arith_op(lhs, rhs, u64::wrapping_sub),
        BinaryOp::Mul => arith_op(lhs, rhs, u64::wrapping_mul),

        BinaryOp::Shl => shift_op(lhs, rhs, |a, b| a.checked_shl(b).unwrap_or(0)),
        BinaryOp::Shr => shift_op(lhs, rhs, |a, b| a.checked_shr(b).unwrap_or(0)),

        BinaryOp::Eq => cmp_op(lhs, rhs, |a, b| a == b),
        BinaryOp::Ne => cmp_op(lhs, rhs, |a, b| a != b),
        BinaryOp::Lt if signed => signed_cmp_op(lhs, rhs, |a, b| a < b),
        BinaryOp::Le if signed => signed_cmp_op(lhs, rhs, |a, b| a <= b),
        BinaryOp::Gt if signed => signed_cmp_op(lhs, rhs, |a, b| a > b),
        BinaryOp::Ge if signed => signed_cmp_op(lhs, rhs, |a, b| a >= b),
        BinaryOp::Lt => cmp_op(lhs, rhs, |a, b| a < b),
        BinaryOp::Le => cmp_op(lhs, rhs, |a, b| a <= b),
        BinaryOp::Gt => cmp_op(lhs, rhs, |a, b| a > b),
        BinaryOp::Ge => cmp_op(lhs, rhs, |a, b| a >= b),

        BinaryOp::LogicAnd => &truth(lhs) & &truth(rhs),
        BinaryOp::LogicOr => &truth(lhs) | &truth(rhs),
    }
}

fn arith_op(lhs: &LogicVec, rhs: &LogicVec, op: impl Fn(u64, u64) -> u64) -> LogicVec {
    let width = lhs.width().max(rhs.width());
    match (lhs.to_u64(), rhs.to_u64()) {
        (Some(a), Some(b)) => LogicVec::from_u64(op(a, b), width),
        _ => LogicVec::all_x(width),
    }
}

fn shift_op(lhs: &LogicVec, rhs: &LogicVec, op: impl Fn(u64, u32) -> u64) -> LogicVec {
    match (lhs.to_u64(), rhs.to_u64()) {
        (Some(a), Some(b)) => {
            LogicVec::from_u64(op(a, u32::try_from(b).unwrap_or(u32::MAX)), lhs.width())
        }
        _ => LogicVec::all_x(lhs.width()),
    }
}

/// Shift right filling with the sign bit of `lhs`.
fn arith_shift_right(lhs: &LogicVec, rhs: &LogicVec) -> LogicVec {
    match (lhs.to_i64(), rhs.to_u64()) {
        (Some(a), Some(b)) => LogicVec::from_u64((a >> b.min(63)) as u64, lhs.width()),
        _ => LogicVec::all_x(lhs.width()),
    }
}

fn signed_cmp_op(lhs: &LogicVec, rhs: &LogicVec, op: impl Fn(i64, i64) -> bool) -> LogicVec {
    match (lhs.to_i64(), rhs.to_i64()) {
        (Some(a), Some(b)) => LogicVec::from_bool(op(a, b)),
        _ => LogicVec::all_x(1),
    }
}

fn cmp_op(lhs: &LogicVec, rhs: &LogicVec, op: impl Fn(u64, u64) -> bool) -> LogicVec {
    match (lhs.to_u64(), rhs.to_u64()) {
        (Some(a), Some(b)) => LogicVec::from_bool(op(a, b)),
        _ => LogicVec::all_x(1),
    }
}

/// Case match: known values compare numerically after zero extension; any
/// unknown bit on either side never matches.
fn values_equal(a: &LogicVec, b: &LogicVec) -> bool {
    if a.has_unknown() || b.has_unknown() {
        return false;
    }
    let width = a.width().max(b.width());
    a.resized(width) == b.resized(width)
}

/// Executes a statement, appending its writes and output to `effects`.
///
/// A failing `Assert` aborts with [`SimError::AssertionFailure`].
pub fn exec_statement(
    ctx: &EvalContext<'_>,
    stmt: &Statement,
    effects: &mut Effects,
) -> Result<(), SimError> {
    match stmt {
        Statement::Assign { target, value } => {
            let val = eval_expr(ctx, value)?;
            let signal = target.signal();
            let full = ctx.width(signal)?;
            let (low, width) = match *target {
                SignalRef::Signal(_) => (0, full),
                SignalRef::Slice { high, low, .. } => (low, high.saturating_sub(low) + 1),
            };
            effects.writes.push(PendingWrite {
                signal,
                low,
                value: extend(&val, width, value.is_signed()),
            });
            Ok(())
        }

        Statement::If {
            condition,
            then_body,
            else_body,
        } => {
            let cond = eval_expr(ctx, condition)?;
            if logic_is_true(&cond) {
                exec_statement(ctx, then_body, effects)
            } else if let Some(else_body) = else_body {
                exec_statement(ctx, else_body, effects)
            } else {
                Ok(())
            }
        }

        Statement::Case {
            subject,
            arms,
            default,
        } => {
            let subj = eval_expr(ctx, subject)?;
            for arm in arms {
                for pat in &arm.patterns {
                    if values_equal(&subj, &eval_expr(ctx, pat)?) {
                        return exec_statement(ctx, &arm.body, effects);
                    }
                }
            }
            match default {
                Some(d) => exec_statement(ctx, d, effects),
                None => Ok(()),
            }
        }

        Statement::Block(stmts) => {
            for s in stmts {
                exec_statement(ctx, s, effects)?;
            }
            Ok(())
        }

        Statement::Assert { condition, message } => {
            if logic_is_true(&eval_expr(ctx, condition)?) {
                Ok(())
            } else {
                Err(SimError::AssertionFailure {
                    time: ctx.time,
                    message: message.clone(),
                })
            }
        }

        Statement::Display { format, args } => {
            let values = args
                .iter()
                .map(|a| eval_expr(ctx, a))
                .collect::<Result<Vec<_>, _>>()?;
            effects.display.push(format_display(format, &values));
            Ok(())
        }

        Statement::Finish => {
            effects.finish = true;
            Ok(())
        }

        Statement::Hold(_) | Statement::Nop => Ok(()),
    }
}

/// Formats a `Display` line. `{}` prints a value in decimal, `{:b}` in
/// binary and `{:x}` in hex; values with unknown bits always print in
/// binary. `{{` and `}}` escape braces.
pub fn format_display(format: &str, args: &[LogicVec]) -> String {
    let mut out = String::new();
    let mut args = args.iter();
    let mut rest = format;
    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        if let Some(tail) = rest.strip_prefix("{{") {
            out.push('{');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("}}") {
            out.push('}');
            rest = tail;
        } else if let Some(end) = rest.find('}').filter(|_| rest.starts_with('{')) {
            let spec = &rest[1..end];
            match args.next() {
                Some(v) => out.push_str(&format_value(v, spec)),
                None => out.push_str(&rest[..=end]),
            }
            rest = &rest[end + 1..];
        } else {
            out.push_str(&rest[..1]);
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

fn format_value(v: &LogicVec, spec: &str) -> String {
    match (spec, v.to_u64()) {
        (":x", Some(n)) => format!("{n:x}"),
        (":b", _) | (_, None) => v.to_string(),
        (_, Some(n)) => n.to_string(),
    }
}
