//! Value Change Dump reader.
//!
//! Loads a dump written by [`VcdRecorder`](super::VcdRecorder), or any
//! other simulator, back into per-signal histories so a run can be
//! inspected after the fact. VCD is whitespace-separated, so the reader
//! works on tokens and keywords may span lines.

use std::collections::HashMap;
use std::io::BufRead;

use sigflow_common::{Logic, LogicVec};

use crate::error::SimError;

/// A signal declared in a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcdSignal {
    /// Identifier code.
    pub code: String,
    /// Hierarchical name built from the scope stack.
    pub name: String,
    /// Bit width.
    pub width: u32,
}

/// A loaded dump.
#[derive(Debug, Clone, Default)]
pub struct VcdTrace {
    /// The `$timescale` text, e.g. `1ns`.
    pub timescale: Option<String>,
    /// Signals in declaration order.
    pub signals: Vec<VcdSignal>,
    /// `(time, value)` changes per signal, parallel to `signals`.
    pub histories: Vec<Vec<(u64, LogicVec)>>,
}

impl VcdTrace {
    fn index(&self, name: &str) -> Option<usize> {
        self.signals.iter().position(|s| s.name == name)
    }

    /// Change history of the signal called `name`.
    pub fn changes(&self, name: &str) -> Option<&[(u64, LogicVec)]> {
        self.index(name).map(|i| self.histories[i].as_slice())
    }

    /// Value of `name` at `time`: the last change at or before it.
    pub fn value_at(&self, name: &str, time: u64) -> Option<&LogicVec> {
        self.changes(name)?
            .iter()
            .rev()
            .find(|(t, _)| *t <= time)
            .map(|(_, v)| v)
    }

    /// Time of the last timestamp that carried a change.
    pub fn end_time(&self) -> u64 {
        self.histories
            .iter()
            .filter_map(|h| h.last().map(|(t, _)| *t))
            .max()
            .unwrap_or(0)
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> SimError {
    SimError::TraceParse {
        line,
        message: message.into(),
    }
}

/// Collects the tokens of a `$keyword ... $end` body.
fn body<'a, I>(tokens: &mut I, keyword: &str, line: usize) -> Result<Vec<String>, SimError>
where
    I: Iterator<Item = &'a (usize, String)>,
{
    let mut out = Vec::new();
    for (_, tok) in tokens.by_ref() {
        if tok == "$end" {
            return Ok(out);
        }
        out.push(tok.clone());
    }
    Err(parse_error(line, format!("unterminated {keyword}")))
}

fn parse_bits(bits: &str, width: u32, line: usize) -> Result<LogicVec, SimError> {
    let parsed = LogicVec::from_binary_str(bits)
        .filter(|v| v.width() > 0)
        .ok_or_else(|| parse_error(line, format!("invalid value `{bits}`")))?;
    if parsed.width() >= width {
        return Ok(parsed.resized(width));
    }
    // Left-extension: a leading x or z repeats, anything else pads with 0.
    let fill = match parsed.get(parsed.width() - 1) {
        Logic::X => Logic::X,
        Logic::Z => Logic::Z,
        _ => Logic::Zero,
    };
    let mut out = LogicVec::filled(width, fill);
    out.splice(0, &parsed);
    Ok(out)
}

/// Reads a dump.
pub fn read_vcd<R: BufRead>(reader: R) -> Result<VcdTrace, SimError> {
    let mut tokens = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        tokens.extend(line.split_whitespace().map(|t| (n + 1, t.to_string())));
    }

    let mut trace = VcdTrace::default();
    let mut codes: HashMap<String, usize> = HashMap::new();
    let mut scopes: Vec<String> = Vec::new();
    let mut in_definitions = true;
    let mut time = 0u64;

    let mut iter = tokens.iter();
    while let Some((line, tok)) = iter.next() {
        let line = *line;
        match tok.as_str() {
            "$scope" => {
                let parts = body(&mut iter, "$scope", line)?;
                let name = parts
                    .last()
                    .ok_or_else(|| parse_error(line, "$scope without a name"))?;
                scopes.push(name.clone());
            }
            "$upscope" => {
                body(&mut iter, "$upscope", line)?;
                scopes.pop();
            }
            "$var" => {
                let parts = body(&mut iter, "$var", line)?;
                let [_, width, code, name, ..] = parts.as_slice() else {
                    return Err(parse_error(line, format!("invalid $var `{}`", parts.join(" "))));
                };
                let width: u32 = width
                    .parse()
                    .map_err(|_| parse_error(line, format!("invalid width `{width}`")))?;
                let mut path = scopes.clone();
                path.push(name.clone());
                codes.insert(code.clone(), trace.signals.len());
                trace.signals.push(VcdSignal {
                    code: code.clone(),
                    name: path.join("."),
                    width,
                });
                trace.histories.push(Vec::new());
            }
            "$timescale" => {
                trace.timescale = Some(body(&mut iter, "$timescale", line)?.concat());
            }
            "$enddefinitions" => {
                body(&mut iter, "$enddefinitions", line)?;
                in_definitions = false;
            }
            // Value-section keywords that only bracket changes.
            "$dumpvars" | "$dumpall" | "$dumpon" | "$dumpoff" | "$end" if !in_definitions => {}
            kw if kw.starts_with('$') => {
                body(&mut iter, kw, line)?;
            }
            _ if in_definitions => {
                return Err(parse_error(line, format!("unexpected `{tok}` before $enddefinitions")));
            }
            t if t.starts_with('#') => {
                time = t[1..]
                    .parse()
                    .map_err(|_| parse_error(line, format!("invalid timestamp `{t}`")))?;
            }
            t if t.starts_with(['b', 'B']) => {
                let (_, code) = iter
                    .next()
                    .ok_or_else(|| parse_error(line, "vector value without an identifier"))?;
                let idx = *codes
                    .get(code)
                    .ok_or_else(|| parse_error(line, format!("unknown identifier `{code}`")))?;
                let value = parse_bits(&t[1..], trace.signals[idx].width, line)?;
                trace.histories[idx].push((time, value));
            }
            t => {
                let mut chars = t.chars();
                let bit = chars
                    .next()
                    .and_then(Logic::from_char)
                    .ok_or_else(|| parse_error(line, format!("invalid value change `{t}`")))?;
                let code = chars.as_str();
                let idx = *codes
                    .get(code)
                    .ok_or_else(|| parse_error(line, format!("unknown identifier `{code}`")))?;
                let value = LogicVec::filled(1, bit).resized(trace.signals[idx].width);
                trace.histories[idx].push((time, value));
            }
        }
    }
    if in_definitions && !trace.signals.is_empty() {
        let last = tokens.last().map_or(0, |(line, _)| *line);
        return Err(parse_error(last, "missing $enddefinitions"));
    }
    Ok(trace)
}
