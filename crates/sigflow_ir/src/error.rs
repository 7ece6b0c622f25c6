//! Elaboration errors.

use crate::ids::SignalId;

/// Errors raised while building a [`Design`](crate::design::Design).
#[derive(Debug, thiserror::Error)]
pub enum ElabError {
    /// Two objects in one scope share a name.
    #[error("duplicate name '{name}' in '{scope}'")]
    DuplicateName {
        /// Hierarchical path of the scope.
        scope: String,
        /// Offending local name.
        name: String,
    },

    /// A signal or port was declared with zero bits.
    #[error("signal '{name}' has zero width")]
    ZeroWidth {
        /// Hierarchical name.
        name: String,
    },

    /// An initial value does not match the declared width.
    #[error("initial value of '{name}' is {found} bits wide, expected {expected}")]
    InitWidth {
        /// Hierarchical name.
        name: String,
        /// Declared width.
        expected: u32,
        /// Width of the given value.
        found: u32,
    },

    /// A port was bound to a parent signal of a different width.
    #[error("port '{port}' is {expected} bits wide but is bound to a {found}-bit signal")]
    PortWidthMismatch {
        /// Hierarchical port name.
        port: String,
        /// Declared port width.
        expected: u32,
        /// Width of the bound signal.
        found: u32,
    },

    /// A binding names a port the instance never declared.
    #[error("instance '{instance}' has no port '{port}'")]
    UnknownPort {
        /// Hierarchical instance path.
        instance: String,
        /// Binding name.
        port: String,
    },

    /// An id does not belong to the design being built.
    #[error("{context} refers to unknown signal {id}")]
    UnknownSignal {
        /// What held the id.
        context: String,
        /// The id.
        id: SignalId,
    },

    /// A reset value is inconsistent with the process it belongs to.
    #[error("reset value for '{signal}' in process '{process}': {reason}")]
    ResetValue {
        /// Hierarchical process name.
        process: String,
        /// Hierarchical signal name.
        signal: String,
        /// What is wrong.
        reason: String,
    },

    /// A periodic process has period zero.
    #[error("periodic process '{process}' has period 0")]
    ZeroPeriod {
        /// Hierarchical process name.
        process: String,
    },

    /// A repetition produces a value wider than [`MAX_REPEAT_WIDTH`] bits.
    ///
    /// [`MAX_REPEAT_WIDTH`]: crate::expr::MAX_REPEAT_WIDTH
    #[error("process '{process}' repeats a value {count} times, wider than {limit} bits")]
    OversizedRepeat {
        /// Hierarchical process name.
        process: String,
        /// Requested number of copies.
        count: u32,
        /// Largest accepted width.
        limit: u32,
    },

    /// Structural data does not describe a design rooted at instance `i0`.
    #[error("malformed instance tree: {reason}")]
    MalformedTree {
        /// What is wrong.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_port_width_mismatch() {
        let err = ElabError::PortWidthMismatch {
            port: "top.u0.d".to_string(),
            expected: 8,
            found: 4,
        };
        assert_eq!(
            err.to_string(),
            "port 'top.u0.d' is 8 bits wide but is bound to a 4-bit signal"
        );
    }

    #[test]
    fn display_unknown_signal() {
        let err = ElabError::UnknownSignal {
            context: "process 'top.p'".to_string(),
            id: SignalId::from_raw(42),
        };
        assert_eq!(err.to_string(), "process 'top.p' refers to unknown signal s42");
    }

    #[test]
    fn display_duplicate_name() {
        let err = ElabError::DuplicateName {
            scope: "top".to_string(),
            name: "q".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate name 'q' in 'top'");
    }
}
