//! Internal error type for kernel invariant violations.

/// Result of an operation that can only fail through a kernel bug.
///
/// User-facing failures (bad designs, failing assertions) have their own
/// error types in the crates that detect them.
pub type SigResult<T> = Result<T, InternalError>;

/// A broken kernel invariant, e.g. an id that does not resolve in its arena.
#[derive(Debug, thiserror::Error)]
#[error("internal kernel error: {message}")]
pub struct InternalError {
    /// What went wrong.
    pub message: String,
}

impl InternalError {
    /// Creates an internal error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("dangling signal id 7");
        assert_eq!(err.to_string(), "internal kernel error: dangling signal id 7");
    }

    #[test]
    fn propagates_with_question_mark() {
        fn inner() -> SigResult<u8> {
            Err(InternalError::new("x"))
        }
        fn outer() -> SigResult<u8> {
            let v = inner()?;
            Ok(v + 1)
        }
        assert_eq!(outer().unwrap_err().message, "x");
    }
}
