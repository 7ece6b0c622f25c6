//! JSON and binary encodings of a [`NetlistView`].
//!
//! The binary form is a little-endian `u32` header length, a bincode
//! [`NetlistHeader`], then the bincode payload. The header carries magic
//! bytes, the format version and an XXH3 checksum of the payload, so a
//! truncated or foreign file is rejected before the payload is decoded.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sigflow_common::ContentHash;

use crate::error::ExportError;
use crate::view::NetlistView;

/// Magic bytes identifying a binary netlist.
const NETLIST_MAGIC: [u8; 4] = *b"SGNL";

/// Current binary format version. Increment on breaking changes to the
/// header or to [`NetlistView`].
pub const NETLIST_FORMAT_VERSION: u32 = 1;

/// Header prepended to every binary netlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetlistHeader {
    /// Must be `b"SGNL"`.
    pub magic: [u8; 4],
    /// Binary format version.
    pub format_version: u32,
    /// Version of the crate that wrote the file.
    pub producer: String,
    /// Hash of the payload bytes.
    pub checksum: ContentHash,
}

fn serialization(e: impl std::fmt::Display) -> ExportError {
    ExportError::Serialization {
        reason: e.to_string(),
    }
}

/// Encodes a view as pretty-printed JSON.
pub fn to_json(view: &NetlistView) -> Result<String, ExportError> {
    serde_json::to_string_pretty(view).map_err(serialization)
}

/// Decodes a view from JSON.
pub fn from_json(json: &str) -> Result<NetlistView, ExportError> {
    serde_json::from_str(json).map_err(serialization)
}

/// Encodes a view in the binary format.
pub fn encode(view: &NetlistView) -> Result<Vec<u8>, ExportError> {
    let payload =
        bincode::serde::encode_to_vec(view, bincode::config::standard()).map_err(serialization)?;
    let header = NetlistHeader {
        magic: NETLIST_MAGIC,
        format_version: NETLIST_FORMAT_VERSION,
        producer: env!("CARGO_PKG_VERSION").to_string(),
        checksum: ContentHash::from_bytes(&payload),
    };
    let header_bytes =
        bincode::serde::encode_to_vec(&header, bincode::config::standard()).map_err(serialization)?;

    let header_len = header_bytes.len() as u32;
    let mut out = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    out.extend_from_slice(&header_len.to_le_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(&payload);
    log::debug!(
        "encoded `{}` into {} bytes (checksum {})",
        view.top,
        out.len(),
        header.checksum
    );
    Ok(out)
}

/// Decodes a view from the binary format, validating magic, version and
/// checksum first.
pub fn decode(raw: &[u8]) -> Result<NetlistView, ExportError> {
    let invalid = |reason: &str| ExportError::InvalidHeader {
        reason: reason.to_string(),
    };

    let Some((len_bytes, rest)) = raw.split_first_chunk::<4>() else {
        return Err(invalid("missing header length"));
    };
    let header_len = u32::from_le_bytes(*len_bytes) as usize;
    if rest.len() < header_len {
        return Err(invalid("truncated header"));
    }
    let (header_bytes, payload) = rest.split_at(header_len);

    let (header, _): (NetlistHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
            .map_err(|e| invalid(&e.to_string()))?;
    if header.magic != NETLIST_MAGIC {
        return Err(invalid("bad magic bytes"));
    }
    if header.format_version != NETLIST_FORMAT_VERSION {
        return Err(ExportError::VersionMismatch {
            expected: NETLIST_FORMAT_VERSION,
            found: header.format_version,
        });
    }
    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(ExportError::ChecksumMismatch {
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }

    let (view, _): (NetlistView, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .map_err(serialization)?;
    Ok(view)
}

/// Writes the binary encoding of `view` to `path`.
pub fn write_netlist(path: &Path, view: &NetlistView) -> Result<(), ExportError> {
    let bytes = encode(view)?;
    std::fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("wrote netlist `{}` to {}", view.top, path.display());
    Ok(())
}

/// Reads a binary netlist from `path`.
pub fn read_netlist(path: &Path) -> Result<NetlistView, ExportError> {
    let raw = std::fs::read(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigflow_ir::{elaborate, Expr, Statement};

    fn inverter() -> NetlistView {
        let design = elaborate("top", |top| {
            let a = top.input("a", 1)?;
            let y = top.output("y", 1)?;
            top.combinational("inv", &[y], Statement::assign(y, Expr::not(a.into())))?;
            Ok(())
        })
        .unwrap();
        NetlistView::from_checked(&sigflow_check::check(design).unwrap())
    }

    #[test]
    fn binary_roundtrip() {
        let view = inverter();
        let bytes = encode(&view).unwrap();
        assert_eq!(decode(&bytes).unwrap(), view);
    }

    #[test]
    fn json_names_signals() {
        let json = to_json(&inverter()).unwrap();
        assert!(json.contains("\"top.y\""));
        assert!(json.contains("\"Combinational\""));
        assert_eq!(from_json(&json).unwrap(), inverter());
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = decode(&[]).unwrap_err();
        assert!(matches!(err, ExportError::InvalidHeader { .. }));
    }

    #[test]
    fn truncated_header_is_rejected() {
        let bytes = encode(&inverter()).unwrap();
        let err = decode(&bytes[..6]).unwrap_err();
        assert_eq!(err.to_string(), "invalid netlist header: truncated header");
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let header = NetlistHeader {
            magic: *b"NOPE",
            format_version: NETLIST_FORMAT_VERSION,
            producer: "0.0.0".into(),
            checksum: ContentHash::from_bytes(b""),
        };
        let header_bytes =
            bincode::serde::encode_to_vec(&header, bincode::config::standard()).unwrap();
        let mut raw = (header_bytes.len() as u32).to_le_bytes().to_vec();
        raw.extend_from_slice(&header_bytes);
        let err = decode(&raw).unwrap_err();
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn future_version_is_rejected() {
        let header = NetlistHeader {
            magic: NETLIST_MAGIC,
            format_version: NETLIST_FORMAT_VERSION + 1,
            producer: "9.9.9".into(),
            checksum: ContentHash::from_bytes(b""),
        };
        let header_bytes =
            bincode::serde::encode_to_vec(&header, bincode::config::standard()).unwrap();
        let mut raw = (header_bytes.len() as u32).to_le_bytes().to_vec();
        raw.extend_from_slice(&header_bytes);
        assert!(matches!(
            decode(&raw).unwrap_err(),
            ExportError::VersionMismatch { found: 2, .. }
        ));
    }

    #[test]
    fn flipped_payload_byte_fails_the_checksum() {
        let mut bytes = encode(&inverter()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            ExportError::ChecksumMismatch { .. }
        ));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.sgn");
        let err = read_netlist(&path).unwrap_err();
        assert!(err.to_string().contains("absent.sgn"));
    }
}
