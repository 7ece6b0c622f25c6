//! Statements forming process bodies.
//!
//! A body is a pure function from current signal values to pending writes:
//! assignments never take effect until the scheduler's update phase, so the
//! order of statements only matters for repeated assignments to the same
//! target, where the last one wins.

use crate::expr::Expr;
use crate::ids::SignalId;
use crate::signal::SignalRef;
use serde::{Deserialize, Serialize};

/// One arm of a [`Statement::Case`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseArm {
    /// Values compared against the subject; any match selects the arm.
    pub patterns: Vec<Expr>,
    /// Arm body.
    pub body: Statement,
}

/// A behavioral statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    /// Schedules `value` for `target`.
    Assign {
        /// Whole signal or constant slice.
        target: SignalRef,
        /// Assigned value.
        value: Expr,
    },
    /// Two-way branch on the LSB of `condition`.
    If {
        /// Condition.
        condition: Expr,
        /// Taken when the condition is 1.
        then_body: Box<Statement>,
        /// Taken otherwise.
        else_body: Option<Box<Statement>>,
    },
    /// Multi-way branch; the first matching arm runs.
    Case {
        /// Compared value.
        subject: Expr,
        /// Arms in priority order.
        arms: Vec<CaseArm>,
        /// Runs when no arm matches.
        default: Option<Box<Statement>>,
    },
    /// Statements in order.
    Block(Vec<Statement>),
    /// Keeps the signal at its current value on this path.
    Hold(SignalId),
    /// Aborts the run when `condition` is not 1.
    Assert {
        /// Checked condition.
        condition: Expr,
        /// Reported on failure.
        message: String,
    },
    /// Emits a formatted line; each `{}` is replaced by the next argument.
    Display {
        /// Format string.
        format: String,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// Requests the end of the run after the current iteration.
    Finish,
    /// Does nothing.
    Nop,
}

impl Statement {
    /// Assigns `value` to the whole of `target`.
    pub fn assign(target: SignalId, value: impl Into<Expr>) -> Self {
        Statement::Assign {
            target: SignalRef::Signal(target),
            value: value.into(),
        }
    }

    /// Assigns `value` to bits `high..=low` of `target`.
    pub fn assign_slice(target: SignalId, high: u32, low: u32, value: impl Into<Expr>) -> Self {
        Statement::Assign {
            target: SignalRef::Slice {
                signal: target,
                high,
                low,
            },
            value: value.into(),
        }
    }

    /// `if condition { then_body }`.
    pub fn when(condition: impl Into<Expr>, then_body: Statement) -> Self {
        Statement::If {
            condition: condition.into(),
            then_body: Box::new(then_body),
            else_body: None,
        }
    }

    /// `if condition { then_body } else { else_body }`.
    pub fn if_else(condition: impl Into<Expr>, then_body: Statement, else_body: Statement) -> Self {
        Statement::If {
            condition: condition.into(),
            then_body: Box::new(then_body),
            else_body: Some(Box::new(else_body)),
        }
    }

    /// A sequence of statements.
    pub fn block(stmts: impl IntoIterator<Item = Statement>) -> Self {
        Statement::Block(stmts.into_iter().collect())
    }

    /// Appends every signal the statement reads to `out`, including
    /// conditions, case subjects and patterns.
    pub fn collect_reads(&self, out: &mut Vec<SignalId>) {
        match self {
            Statement::Assign { value, .. } => value.collect_reads(out),
            Statement::If {
                condition,
                then_body,
                else_body,
            } => {
                condition.collect_reads(out);
                then_body.collect_reads(out);
                if let Some(e) = else_body {
                    e.collect_reads(out);
                }
            }
            Statement::Case {
                subject,
                arms,
                default,
            } => {
                subject.collect_reads(out);
                for arm in arms {
                    arm.patterns.iter().for_each(|p| p.collect_reads(out));
                    arm.body.collect_reads(out);
                }
                if let Some(d) = default {
                    d.collect_reads(out);
                }
            }
            Statement::Block(stmts) => stmts.iter().for_each(|s| s.collect_reads(out)),
            Statement::Assert { condition, .. } => condition.collect_reads(out),
            Statement::Display { args, .. } => args.iter().for_each(|a| a.collect_reads(out)),
            Statement::Hold(_) | Statement::Finish | Statement::Nop => {}
        }
    }

    /// Appends every assignment target to `out`.
    pub fn collect_targets(&self, out: &mut Vec<SignalRef>) {
        self.visit(&mut |stmt| {
            if let Statement::Assign { target, .. } = stmt {
                out.push(*target);
            }
        });
    }

    /// Appends every signal named by a [`Statement::Hold`] to `out`.
    pub fn collect_holds(&self, out: &mut Vec<SignalId>) {
        self.visit(&mut |stmt| {
            if let Statement::Hold(id) = stmt {
                out.push(*id);
            }
        });
    }

    /// Calls `f` on every top-level expression the statement or its nested
    /// statements evaluate.
    pub fn visit_exprs(&self, f: &mut impl FnMut(&Expr)) {
        self.visit(&mut |stmt| match stmt {
            Statement::Assign { value, .. } => f(value),
            Statement::If { condition, .. } | Statement::Assert { condition, .. } => f(condition),
            Statement::Case { subject, arms, .. } => {
                f(subject);
                for arm in arms {
                    arm.patterns.iter().for_each(|p| f(p));
                }
            }
            Statement::Display { args, .. } => args.iter().for_each(|a| f(a)),
            _ => {}
        });
    }

    /// Calls `f` on this statement and every nested statement, pre-order.
    pub fn visit(&self, f: &mut impl FnMut(&Statement)) {
        f(self);
        match self {
            Statement::If {
                then_body,
                else_body,
                ..
            } => {
                then_body.visit(f);
                if let Some(e) = else_body {
                    e.visit(f);
                }
            }
            Statement::Case { arms, default, .. } => {
                arms.iter().for_each(|arm| arm.body.visit(f));
                if let Some(d) = default {
                    d.visit(f);
                }
            }
            Statement::Block(stmts) => stmts.iter().for_each(|s| s.visit(f)),
            _ => {}
        }
    }
}
