//! Labels pointing a diagnostic at objects of the elaborated design.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The design object a label refers to, by hierarchical name.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Subject {
    /// A signal, e.g. `top.counter.count`.
    Signal(String),
    /// A process, e.g. `top.counter.tick`.
    Process(String),
    /// A module instance, e.g. `top.counter`.
    Instance(String),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Signal(name) => write!(f, "signal `{name}`"),
            Subject::Process(name) => write!(f, "process `{name}`"),
            Subject::Instance(name) => write!(f, "instance `{name}`"),
        }
    }
}

/// Whether a label marks the main object of a finding or supporting context.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LabelStyle {
    /// The object the finding is about.
    Primary,
    /// An object involved in the finding.
    Secondary,
}

/// An annotated design object within a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// The annotated object.
    pub subject: Subject,
    /// Explanation shown next to the object.
    pub message: String,
    /// Primary or secondary.
    pub style: LabelStyle,
}

impl Label {
    /// Creates a primary label.
    pub fn primary(subject: Subject, message: impl Into<String>) -> Self {
        Self {
            subject,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    /// Creates a secondary label.
    pub fn secondary(subject: Subject, message: impl Into<String>) -> Self {
        Self {
            subject,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}
