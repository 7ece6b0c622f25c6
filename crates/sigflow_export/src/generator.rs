//! The contract between the kernel and external netlist emitters.

use std::io::Write;

use crate::codec::to_json;
use crate::error::ExportError;
use crate::view::NetlistView;

/// Consumes a checked, structural view of a design and emits it in some
/// hardware description format.
///
/// Implementations may rely on everything the checker guarantees: single
/// drivers, no combinational loops, consistent widths and signal kinds.
pub trait NetlistGenerator {
    /// Error raised by the emitter.
    type Error: std::error::Error;

    /// Emits `view`.
    fn generate(&mut self, view: &NetlistView) -> Result<(), Self::Error>;
}

/// Writes the view as JSON, for tools outside the Rust ecosystem.
pub struct JsonGenerator<W: Write> {
    writer: W,
}

impl<W: Write> JsonGenerator<W> {
    /// Creates a generator writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> NetlistGenerator for JsonGenerator<W> {
    type Error = ExportError;

    fn generate(&mut self, view: &NetlistView) -> Result<(), ExportError> {
        let json = to_json(view)?;
        self.writer
            .write_all(json.as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|e| ExportError::Generator {
                reason: e.to_string(),
            })
    }
}
