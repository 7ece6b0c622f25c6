//! Configuration types deserialized from `sigflow.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// The whole `sigflow.toml`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct KernelConfig {
    /// Synthesizability checker settings.
    #[serde(default)]
    pub check: CheckConfig,
    /// Scheduler settings.
    #[serde(default)]
    pub sim: SimConfig,
    /// Trace output settings.
    #[serde(default)]
    pub trace: TraceConfig,
}

/// `[check]`: width policy and rule severity overrides.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CheckConfig {
    /// How assignments between different widths are treated.
    #[serde(default)]
    pub width_policy: WidthPolicy,
    /// Rule names or codes promoted to errors. A string or a list.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub deny: Vec<String>,
    /// Rule names or codes that are not run. A string or a list.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub allow: Vec<String>,
}

/// Policy for an assignment whose source width differs from its target width.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidthPolicy {
    /// Any mismatch is an error.
    #[default]
    Strict,
    /// Narrower sources are zero-extended; wider sources are an error.
    ZeroExtend,
    /// Narrower sources are zero-extended; wider sources keep their low bits.
    Truncate,
}

impl WidthPolicy {
    /// Whether a `source`-bit value may be assigned to a `target`-bit destination.
    pub fn accepts(self, source: u32, target: u32) -> bool {
        match self {
            WidthPolicy::Strict => source == target,
            WidthPolicy::ZeroExtend => source <= target,
            WidthPolicy::Truncate => true,
        }
    }
}

impl fmt::Display for WidthPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WidthPolicy::Strict => "strict",
            WidthPolicy::ZeroExtend => "zero-extend",
            WidthPolicy::Truncate => "truncate",
        })
    }
}

/// `[sim]`: scheduler bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Changing update phases allowed at one instant before the watchdog fires.
    #[serde(default = "default_max_deltas")]
    pub max_deltas: u32,
    /// Simulated time, in ticks, at which a run stops.
    #[serde(default)]
    pub time_limit: Option<u64>,
}

/// The delta-cycle watchdog default.
pub const DEFAULT_MAX_DELTAS: u32 = 10_000;

fn default_max_deltas() -> u32 {
    DEFAULT_MAX_DELTAS
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_deltas: DEFAULT_MAX_DELTAS,
            time_limit: None,
        }
    }
}

/// `[trace]`: value-change dump output.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TraceConfig {
    /// File to write. No trace file is written when absent.
    #[serde(default)]
    pub path: Option<String>,
    /// Duration of one simulation tick, written to the VCD header.
    #[serde(default)]
    pub timescale: Timescale,
    /// Gzip the output.
    #[serde(default)]
    pub compress: bool,
}

/// Units accepted in a [`Timescale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    /// Seconds.
    S,
    /// Milliseconds.
    Ms,
    /// Microseconds.
    Us,
    /// Nanoseconds.
    Ns,
    /// Picoseconds.
    Ps,
    /// Femtoseconds.
    Fs,
}

impl TimeUnit {
    fn suffix(self) -> &'static str {
        match self {
            TimeUnit::S => "s",
            TimeUnit::Ms => "ms",
            TimeUnit::Us => "us",
            TimeUnit::Ns => "ns",
            TimeUnit::Ps => "ps",
            TimeUnit::Fs => "fs",
        }
    }
}

/// Length of one tick, e.g. `1ns` or `10ps`. The magnitude is 1, 10 or 100,
/// as in a VCD `$timescale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timescale {
    /// 1, 10 or 100.
    pub magnitude: u32,
    /// Unit the magnitude applies to.
    pub unit: TimeUnit,
}

impl Default for Timescale {
    fn default() -> Self {
        Self {
            magnitude: 1,
            unit: TimeUnit::Ns,
        }
    }
}

impl fmt::Display for Timescale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.suffix())
    }
}

/// Error for a string that is not a valid timescale.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timescale '{input}': expected 1, 10 or 100 followed by s, ms, us, ns, ps or fs")]
pub struct ParseTimescaleError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for Timescale {
    type Err = ParseTimescaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimescaleError {
            input: s.to_string(),
        };
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(err)?;
        let (digits, suffix) = trimmed.split_at(split);
        let magnitude: u32 = digits.parse().map_err(|_| err())?;
        if !matches!(magnitude, 1 | 10 | 100) {
            return Err(err());
        }
        let unit = match suffix.trim() {
            "s" => TimeUnit::S,
            "ms" => TimeUnit::Ms,
            "us" => TimeUnit::Us,
            "ns" => TimeUnit::Ns,
            "ps" => TimeUnit::Ps,
            "fs" => TimeUnit::Fs,
            _ => return Err(err()),
        };
        Ok(Timescale { magnitude, unit })
    }
}

impl<'de> Deserialize<'de> for Timescale {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Accepts both `deny = "latch-inference"` and `deny = ["W101", "W102"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a rule name or a list of rule names")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                out.push(val);
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
