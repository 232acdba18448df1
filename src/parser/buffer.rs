//! Loading of captured event buffers from disk.
//!
//! Two on-disk forms are accepted:
//! - `.json`: an array of records (numbers, decimal strings or `0x` hex
//!   strings), or an object carrying that array under `buffer`
//! - anything else: raw little-endian u64 records, as dumped from the ring buffer

use super::event::RawEvent;
use crate::utils::error::ParseError;
use log::{debug, warn};
use std::fs;
use std::path::Path;

const RECORD_SIZE: usize = 8;

/// Field names that may carry the record array in JSON dumps
const BUFFER_FIELD_NAMES: &[&str] = &["buffer", "records", "data"];

/// Load a buffer file, picking the format from its extension
///
/// **Public** - main entry point for buffer input
///
/// # Errors
/// * `ParseError::IoError` - file cannot be read
/// * `ParseError::JsonError` - `.json` file is not valid JSON
/// * `ParseError::InvalidFormat` - JSON does not hold a record array
/// * `ParseError::Misaligned` - binary file is not a whole number of records
pub fn load_buffer(path: impl AsRef<Path>) -> Result<Vec<u64>, ParseError> {
    let path = path.as_ref();
    debug!("Loading event buffer from: {}", path.display());

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let buffer = if is_json {
        let contents = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&contents)?;
        parse_buffer_json(&value)?
    } else {
        parse_buffer_bytes(&fs::read(path)?)?
    };

    debug!("Loaded {} records", buffer.len());
    Ok(buffer)
}

/// Decode raw little-endian records
pub fn parse_buffer_bytes(bytes: &[u8]) -> Result<Vec<u64>, ParseError> {
    if bytes.len() % RECORD_SIZE != 0 {
        return Err(ParseError::Misaligned(bytes.len()));
    }

    Ok(bytes
        .chunks_exact(RECORD_SIZE)
        .map(|chunk| {
            let mut word = [0u8; RECORD_SIZE];
            word.copy_from_slice(chunk);
            u64::from_le_bytes(word)
        })
        .collect())
}

/// Extract records from a JSON dump
pub fn parse_buffer_json(value: &serde_json::Value) -> Result<Vec<u64>, ParseError> {
    let records = match value {
        serde_json::Value::Array(records) => records,
        serde_json::Value::Object(obj) => BUFFER_FIELD_NAMES
            .iter()
            .find_map(|field| obj.get(*field).and_then(|v| v.as_array()))
            .ok_or_else(|| {
                ParseError::InvalidFormat(format!(
                    "Object has none of the buffer fields {:?}",
                    BUFFER_FIELD_NAMES
                ))
            })?,
        _ => {
            return Err(ParseError::InvalidFormat(
                "Buffer must be a JSON array or object".to_string(),
            ))
        }
    };

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            parse_json_u64(record).map_err(|e| {
                warn!("Failed to parse record {}: {}", index, e);
                e
            })
        })
        .collect()
}

/// Latest timestamp among the non-padding records
///
/// Callers that have no externally supplied end time can close open frames
/// at this point instead.
pub fn max_timestamp(buffer: &[u64]) -> Option<u64> {
    buffer
        .iter()
        .filter(|raw| **raw != 0)
        .map(|raw| RawEvent::decode(*raw).timestamp)
        .max()
}

/// Parse a u64 from a JSON number or string
///
/// **Private** - internal utility
fn parse_json_u64(val: &serde_json::Value) -> Result<u64, ParseError> {
    if let Some(n) = val.as_u64() {
        Ok(n)
    } else if let Some(s) = val.as_str() {
        parse_record_value(s)
    } else {
        Err(ParseError::InvalidFormat(format!(
            "Expected number or string, found {}",
            val
        )))
    }
}

/// Parse a record from hex string or decimal
pub fn parse_record_value(value: &str) -> Result<u64, ParseError> {
    if let Some(hex_str) = value.strip_prefix("0x") {
        u64::from_str_radix(hex_str, 16)
            .map_err(|e| ParseError::InvalidFormat(format!("Invalid hex record: {}", e)))
    } else {
        value
            .parse::<u64>()
            .map_err(|e| ParseError::InvalidFormat(format!("Invalid decimal record: {}", e)))
    }
}
