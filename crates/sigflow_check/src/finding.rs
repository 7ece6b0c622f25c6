//! Typed checker findings.

use sigflow_diagnostics::{Diagnostic, DiagnosticCode, Label, Severity, Subject};
use sigflow_ir::{Design, ProcessId, SignalId, SignalKind};
use std::fmt;

/// Why a process may not write a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationReason {
    /// The body assigns or holds a signal outside the declared write set.
    Undeclared,
    /// The signal is an input port of the process's own instance.
    InputPort,
}

/// One structural finding about a design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// A signal with more than one registered driver.
    MultipleDrivers {
        /// The signal.
        signal: SignalId,
        /// All of its drivers, in registration order.
        processes: Vec<ProcessId>,
    },
    /// Combinational processes that feed each other with no register between.
    CombinationalLoop {
        /// Processes in the cycle, in scheduling order.
        processes: Vec<ProcessId>,
        /// Signals carried around the cycle, sorted by id.
        signals: Vec<SignalId>,
    },
    /// An assignment whose source width the width policy does not accept.
    WidthMismatch {
        /// Assigning process.
        process: ProcessId,
        /// Assigned signal.
        target: SignalId,
        /// Destination width.
        expected: u32,
        /// Source width.
        found: u32,
    },
    /// A process writing a signal it may not drive.
    DriverViolation {
        /// Offending process.
        process: ProcessId,
        /// Signal written.
        signal: SignalId,
        /// Which rule is broken.
        reason: ViolationReason,
    },
    /// Some path through the body neither assigns nor holds a written signal.
    LatchInference {
        /// Process.
        process: ProcessId,
        /// Signal left undefined on some path.
        signal: SignalId,
    },
    /// A reset leaves a driven register without a reset value.
    MissingReset {
        /// Clocked process.
        process: ProcessId,
        /// Register without reset value.
        signal: SignalId,
    },
    /// A clocked process triggered by both edges of its clock.
    DualEdgeClock {
        /// Clocked process.
        process: ProcessId,
        /// Its clock.
        clock: SignalId,
    },
    /// The declared signal kind disagrees with how it is driven.
    KindMismatch {
        /// Signal.
        signal: SignalId,
        /// Declared kind.
        kind: SignalKind,
        /// Driver, `None` for an undriven register.
        process: Option<ProcessId>,
    },
}

impl Finding {
    /// Processes involved, for ordering and reporting.
    pub fn processes(&self) -> Vec<ProcessId> {
        match self {
            Finding::MultipleDrivers { processes, .. }
            | Finding::CombinationalLoop { processes, .. } => processes.clone(),
            Finding::WidthMismatch { process, .. }
            | Finding::DriverViolation { process, .. }
            | Finding::LatchInference { process, .. }
            | Finding::MissingReset { process, .. }
            | Finding::DualEdgeClock { process, .. } => vec![*process],
            Finding::KindMismatch { process, .. } => process.iter().copied().collect(),
        }
    }

    /// Primary signal, if the finding is about one.
    pub fn signal(&self) -> Option<SignalId> {
        match self {
            Finding::MultipleDrivers { signal, .. }
            | Finding::DriverViolation { signal, .. }
            | Finding::LatchInference { signal, .. }
            | Finding::MissingReset { signal, .. }
            | Finding::KindMismatch { signal, .. } => Some(*signal),
            Finding::WidthMismatch { target, .. } => Some(*target),
            Finding::DualEdgeClock { clock, .. } => Some(*clock),
            Finding::CombinationalLoop { signals, .. } => signals.first().copied(),
        }
    }

    /// One-line description using hierarchical names from `design`.
    pub fn message(&self, design: &Design) -> String {
        let sig = |id: &SignalId| design.signal(*id).name.as_str();
        let proc = |id: &ProcessId| design.process(*id).name.as_str();
        match self {
            Finding::MultipleDrivers { signal, processes } => format!(
                "signal `{}` is driven by {} processes: {}",
                sig(signal),
                processes.len(),
                processes.iter().map(proc).collect::<Vec<_>>().join(", ")
            ),
            Finding::CombinationalLoop { processes, .. } => format!(
                "combinational loop through {}",
                processes.iter().map(proc).collect::<Vec<_>>().join(" -> ")
            ),
            Finding::WidthMismatch {
                process,
                target,
                expected,
                found,
            } => format!(
                "process `{}` assigns a {found}-bit value to {expected}-bit `{}`",
                proc(process),
                sig(target)
            ),
            Finding::DriverViolation {
                process,
                signal,
                reason: ViolationReason::Undeclared,
            } => format!(
                "process `{}` writes `{}` but is not registered as its driver",
                proc(process),
                sig(signal)
            ),
            Finding::DriverViolation {
                process,
                signal,
                reason: ViolationReason::InputPort,
            } => format!(
                "process `{}` drives `{}`, an input port of its own instance",
                proc(process),
                sig(signal)
            ),
            Finding::LatchInference { process, signal } => format!(
                "process `{}` leaves `{}` unassigned on some path",
                proc(process),
                sig(signal)
            ),
            Finding::MissingReset { process, signal } => format!(
                "reset of process `{}` has no value for `{}`",
                proc(process),
                sig(signal)
            ),
            Finding::DualEdgeClock { process, clock } => format!(
                "process `{}` triggers on both edges of `{}`",
                proc(process),
                sig(clock)
            ),
            Finding::KindMismatch {
                signal,
                kind,
                process: Some(p),
            } => format!(
                "{kind} `{}` is driven by {} process `{}`",
                sig(signal),
                design.process(*p).sensitivity.class(),
                proc(p)
            ),
            Finding::KindMismatch {
                signal,
                kind,
                process: None,
            } => format!("{kind} `{}` has no driver", sig(signal)),
        }
    }

    /// Renders the finding as a diagnostic.
    pub fn to_diagnostic(
        &self,
        design: &Design,
        code: DiagnosticCode,
        severity: Severity,
    ) -> Diagnostic {
        let sig = |id: SignalId| Subject::Signal(design.signal(id).name.clone());
        let proc = |id: ProcessId| Subject::Process(design.process(id).name.clone());
        let mut diag = Diagnostic::new(severity, code, self.message(design));
        match self {
            Finding::MultipleDrivers { signal, processes } => {
                diag = diag.with_label(Label::primary(sig(*signal), "driven more than once"));
                for p in processes {
                    diag = diag.with_label(Label::secondary(proc(*p), "drives it"));
                }
                diag = diag
                    .with_note("a register has exactly one driver and a wire at most one")
                    .with_help("merge the assignments into a single process");
            }
            Finding::CombinationalLoop { processes, signals } => {
                for p in processes {
                    diag = diag.with_label(Label::primary(proc(*p), "part of the cycle"));
                }
                for s in signals {
                    diag = diag.with_label(Label::secondary(sig(*s), "carried around the cycle"));
                }
                diag = diag.with_help("break the cycle with a clocked register");
            }
            Finding::WidthMismatch { process, target, .. } => {
                diag = diag
                    .with_label(Label::primary(sig(*target), "assigned here"))
                    .with_label(Label::secondary(proc(*process), "in this process"));
            }
            Finding::DriverViolation { process, signal, .. } => {
                diag = diag
                    .with_label(Label::primary(proc(*process), "writes here"))
                    .with_label(Label::secondary(sig(*signal), "not driven by this process"));
            }
            Finding::LatchInference { process, signal } => {
                diag = diag
                    .with_label(Label::primary(sig(*signal), "may keep a stale value"))
                    .with_label(Label::secondary(proc(*process), "in this process"))
                    .with_help("assign it on every path or hold it explicitly");
            }
            Finding::MissingReset { process, signal } => {
                diag = diag
                    .with_label(Label::primary(sig(*signal), "not reset"))
                    .with_label(Label::secondary(proc(*process), "reset here"));
            }
            Finding::DualEdgeClock { process, clock } => {
                diag = diag
                    .with_label(Label::primary(proc(*process), "clocked on both edges"))
                    .with_label(Label::secondary(sig(*clock), "clock"))
                    .with_help("use a rising or a falling edge");
            }
            Finding::KindMismatch {
                signal, process, ..
            } => {
                diag = diag.with_label(Label::primary(sig(*signal), "declared here"));
                if let Some(p) = process {
                    diag = diag.with_label(Label::secondary(proc(*p), "driver"));
                }
            }
        }
        diag
    }
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViolationReason::Undeclared => "undeclared write",
            ViolationReason::InputPort => "write to own input port",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigflow_diagnostics::Category;
    use sigflow_ir::{elaborate, Expr, Statement};

    #[test]
    fn multiple_driver_message_names_signal_and_processes() {
        let design = elaborate("top", |top| {
            let q = top.wire("q", 1)?;
            top.combinational("a", &[q], Statement::assign(q, Expr::bit(true)))?;
            top.combinational("b", &[q], Statement::assign(q, Expr::bit(false)))?;
            Ok(())
        })
        .unwrap();
        let q = design.find_signal("top.q").unwrap();
        let finding = Finding::MultipleDrivers {
            signal: q,
            processes: design.signal(q).drivers.clone(),
        };
        assert_eq!(
            finding.message(&design),
            "signal `top.q` is driven by 2 processes: top.a, top.b"
        );
        let diag = finding.to_diagnostic(
            &design,
            DiagnosticCode::new(Category::Error, 101),
            Severity::Error,
        );
        assert_eq!(diag.labels.len(), 3);
        assert_eq!(diag.primary_subject(), Some(&Subject::Signal("top.q".into())));
        assert_eq!(finding.processes().len(), 2);
        assert_eq!(finding.signal(), Some(q));
    }
}
