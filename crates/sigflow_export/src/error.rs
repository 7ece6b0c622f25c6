//! Error types for netlist export and import.

use std::path::PathBuf;

use sigflow_ir::ElabError;

/// Errors raised while encoding, decoding or re-importing a netlist view.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Reading or writing a netlist file failed.
    #[error("netlist I/O error at {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The binary header is missing, truncated or carries the wrong magic.
    #[error("invalid netlist header: {reason}")]
    InvalidHeader {
        /// What was wrong with the header.
        reason: String,
    },

    /// The binary payload was written by an incompatible format version.
    #[error("netlist format version {found} is not supported (expected {expected})")]
    VersionMismatch {
        /// Version this build reads.
        expected: u32,
        /// Version found in the header.
        found: u32,
    },

    /// The payload does not match the checksum in its header.
    #[error("netlist checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Checksum recorded in the header.
        expected: String,
        /// Checksum of the payload as read.
        actual: String,
    },

    /// Serialization or deserialization failed.
    #[error("netlist serialization error: {reason}")]
    Serialization {
        /// Description of the codec failure.
        reason: String,
    },

    /// The view is internally inconsistent and cannot describe a design.
    #[error("malformed netlist view: {reason}")]
    MalformedView {
        /// The inconsistency found.
        reason: String,
    },

    /// The view was consistent but the design could not be assembled from it.
    #[error(transparent)]
    Import(#[from] ElabError),

    /// A netlist generator failed.
    #[error("netlist generator failed: {reason}")]
    Generator {
        /// Description of the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err = ExportError::Io {
            path: PathBuf::from("out/top.sgn"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("out/top.sgn"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn version_mismatch_display() {
        let err = ExportError::VersionMismatch {
            expected: 1,
            found: 7,
        };
        assert_eq!(
            err.to_string(),
            "netlist format version 7 is not supported (expected 1)"
        );
    }
}
