//! Value Change Dump writer.
//!
//! Produces IEEE 1364 VCD text: a header with the timescale and one
//! `$scope` per instance, then `#time` blocks of value changes. Timestamps
//! are kernel ticks; the header's `$timescale` says how long a tick is.

use std::collections::HashMap;
use std::io::Write;

use sigflow_common::{InternalError, LogicVec};
use sigflow_config::Timescale;
use sigflow_ir::SignalId;

use super::TraceSink;
use crate::error::SimError;

/// Writes a VCD stream to `W`.
pub struct VcdRecorder<W: Write> {
    writer: W,
    timescale: Timescale,
    codes: HashMap<SignalId, (String, u32)>,
    next_code: u32,
    header_written: bool,
    current_time: Option<u64>,
}

impl<W: Write> VcdRecorder<W> {
    /// Creates a recorder writing ticks of length `timescale`.
    pub fn new(writer: W, timescale: Timescale) -> Self {
        Self {
            writer,
            timescale,
            codes: HashMap::new(),
            next_code: 0,
            header_written: false,
            current_time: None,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_header(&mut self) -> Result<(), SimError> {
        if self.header_written {
            return Ok(());
        }
        self.header_written = true;
        writeln!(self.writer, "$version")?;
        writeln!(self.writer, "  sigflow {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(self.writer, "$end")?;
        writeln!(self.writer, "$timescale")?;
        writeln!(self.writer, "  {}", self.timescale)?;
        writeln!(self.writer, "$end")?;
        Ok(())
    }

    /// Identifier code for the `index`-th signal: printable ASCII from `!`,
    /// growing to several characters past 94 signals.
    fn id_code(index: u32) -> String {
        let mut out = String::new();
        let mut idx = index;
        loop {
            out.push(char::from(b'!' + (idx % 94) as u8));
            idx /= 94;
            if idx == 0 {
                break;
            }
            idx -= 1;
        }
        out
    }

    fn format_value(value: &LogicVec, width: u32) -> String {
        let bits: String = (0..width)
            .rev()
            .map(|i| value.get(i).to_vcd_char())
            .collect();
        if width == 1 {
            bits
        } else {
            format!("b{bits} ")
        }
    }
}

impl<W: Write> TraceSink for VcdRecorder<W> {
    fn begin_scope(&mut self, name: &str) -> Result<(), SimError> {
        self.write_header()?;
        writeln!(self.writer, "$scope module {name} $end")?;
        Ok(())
    }

    fn register_signal(&mut self, id: SignalId, name: &str, width: u32) -> Result<(), SimError> {
        self.write_header()?;
        let code = Self::id_code(self.next_code);
        self.next_code += 1;
        writeln!(self.writer, "$var wire {width} {code} {name} $end")?;
        self.codes.insert(id, (code, width));
        Ok(())
    }

    fn end_scope(&mut self) -> Result<(), SimError> {
        writeln!(self.writer, "$upscope $end")?;
        Ok(())
    }

    fn record_change(&mut self, time: u64, id: SignalId, value: &LogicVec) -> Result<(), SimError> {
        self.write_header()?;
        if self.current_time != Some(time) {
            if self.current_time.is_none() {
                writeln!(self.writer, "$enddefinitions $end")?;
                writeln!(self.writer, "$dumpvars")?;
            }
            writeln!(self.writer, "#{time}")?;
            self.current_time = Some(time);
        }
        let (code, width) = self
            .codes
            .get(&id)
            .ok_or_else(|| InternalError::new(format!("signal {id} not registered with the trace")))?;
        writeln!(self.writer, "{}{code}", Self::format_value(value, *width))?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SimError> {
        if self.current_time.is_none() {
            self.write_header()?;
            writeln!(self.writer, "$enddefinitions $end")?;
            self.current_time = Some(0);
        }
        self.writer.flush()?;
        Ok(())
    }
}
