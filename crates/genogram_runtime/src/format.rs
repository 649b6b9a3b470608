//! Encoding diagrams as bytes and files.
//!
//! Two encodings are supported: `MessagePack` (compact, the default) and JSON
//! (readable, diffable). Reading detects which one a file holds, so the
//! format only matters when writing.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use genogram_foundation::{Error, ErrorKind, Result};
use tracing::info;

use crate::serialize::DiagramData;

/// On-disk encoding of a diagram.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// `MessagePack` with named fields.
    #[default]
    MessagePack,
    /// Pretty-printed JSON.
    Json,
}

impl Format {
    /// Guesses the encoding of `bytes`: JSON documents open with `{`, after
    /// an optional byte order mark and whitespace.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        match strip_bom(bytes).iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => Self::Json,
            _ => Self::MessagePack,
        }
    }

    /// Guesses the encoding from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "msgpack" | "mpk" | "gen" => Some(Self::MessagePack),
            _ => None,
        }
    }

    /// Short name used on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::MessagePack => "msgpack",
            Self::Json => "json",
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "msgpack" | "messagepack" | "mpk" => Ok(Self::MessagePack),
            "json" => Ok(Self::Json),
            other => Err(Error::new(ErrorKind::Serialization(format!(
                "unknown format '{other}' (expected msgpack or json)"
            )))),
        }
    }
}

fn encode_error(e: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::Serialization(e.to_string()))
}

/// Encodes diagram data.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn to_bytes(data: &DiagramData, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::MessagePack => rmp_serde::to_vec_named(data).map_err(encode_error),
        Format::Json => serde_json::to_vec_pretty(data).map_err(encode_error),
    }
}

/// Decodes diagram data, detecting the encoding.
///
/// # Errors
///
/// Returns an error if the bytes are not a diagram in either encoding.
pub fn from_bytes(bytes: &[u8]) -> Result<DiagramData> {
    match Format::detect(bytes) {
        Format::MessagePack => rmp_serde::from_slice(bytes).map_err(encode_error),
        Format::Json => serde_json::from_slice(strip_bom(bytes)).map_err(encode_error),
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Saves diagram data to a file, replacing any existing contents.
///
/// # Errors
///
/// Returns an error if the file cannot be written or encoding fails.
pub fn save_to_file<P: AsRef<Path>>(data: &DiagramData, path: P, format: Format) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(data, format)?;
    let file = File::create(path).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to create file '{}': {e}",
            path.display()
        )))
    })?;

    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to write to file '{}': {e}",
            path.display()
        )))
    })?;
    writer.flush().map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to flush file '{}': {e}",
            path.display()
        )))
    })?;

    info!(path = %path.display(), format = format.name(), bytes = bytes.len(), "saved diagram");
    Ok(())
}

/// Loads diagram data from a file in either encoding.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<DiagramData> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to open file '{}': {e}",
            path.display()
        )))
    })?;

    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to read file '{}': {e}",
            path.display()
        )))
    })?;

    let data = from_bytes(&bytes)?;
    info!(path = %path.display(), items = data.items.len(), "loaded diagram");
    Ok(data)
}
