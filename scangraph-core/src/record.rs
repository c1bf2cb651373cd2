// Scan record decoding

use crate::error::DecodeError;
use serde::{Deserialize, Deserializer, Serialize};

/// Autonomous-system ownership reported for a scanned host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsnInfo {
    #[serde(deserialize_with = "nullable")]
    pub as_number: String,
    #[serde(deserialize_with = "nullable")]
    pub as_name: String,
    #[serde(deserialize_with = "nullable")]
    pub as_country: String,
    #[serde(deserialize_with = "nullable")]
    pub as_range: Vec<String>,
}

/// One line of scanner output.
///
/// Missing or `null` fields decode to their empty value so partial records
/// still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanRecord {
    #[serde(deserialize_with = "nullable")]
    pub timestamp: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub asn: AsnInfo,
    #[serde(deserialize_with = "nullable")]
    pub port: String,
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    #[serde(deserialize_with = "nullable")]
    pub input: String,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub scheme: String,
    #[serde(deserialize_with = "nullable")]
    pub webserver: String,
    #[serde(deserialize_with = "nullable")]
    pub tech: Vec<String>,
    /// Resolved IP address of the target.
    #[serde(deserialize_with = "nullable")]
    pub host: String,
    #[serde(deserialize_with = "nullable")]
    pub status_code: i64,
    #[serde(deserialize_with = "nullable")]
    pub words: i64,
    #[serde(deserialize_with = "nullable")]
    pub lines: i64,
    #[serde(deserialize_with = "nullable")]
    pub resolvers: Vec<String>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode one input line. `line` is the 1-based line number, used in errors.
pub fn decode_line(line: usize, content: &str) -> Result<ScanRecord, DecodeError> {
    decode_slice(line, content.as_bytes())
}

/// Like [`decode_line`] for raw bytes; invalid UTF-8 is a decode error.
pub fn decode_slice(line: usize, content: &[u8]) -> Result<ScanRecord, DecodeError> {
    serde_json::from_slice(content).map_err(|source| DecodeError {
        line,
        content: String::from_utf8_lossy(content).into_owned(),
        source,
    })
}
