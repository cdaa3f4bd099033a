//! Decoding of downloaded task results.
//!
//! A result download answers with one of three bodies: a JSON error object,
//! a gzip-compressed TSV table, or a plain TSV table. Decoding runs in stages
//! (classify, decompress, split) so each failure is a distinct value.

use flate2::read::GzDecoder;
use seomagic_core::error::ToolError;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use thiserror::Error;

/// The classified response body.
#[derive(Debug, PartialEq)]
pub enum Payload<'a> {
    /// The remote API reported an error instead of sending a table.
    RemoteError { message: String },
    Body(&'a [u8]),
}

/// Text recovered from a table body.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    Gzip(String),
    Plain(String),
}

impl Decoded {
    pub fn text(&self) -> &str {
        match self {
            Self::Gzip(text) | Self::Plain(text) => text,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty response body")]
    Empty,

    #[error("body is neither gzip nor UTF-8 text")]
    Undecodable,
}

/// A decoded result table, truncated to the requested row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableResult {
    pub total_rows: usize,
    pub returned_rows: usize,
    pub rows: Vec<Vec<String>>,
}

impl TableResult {
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "err": 0,
            "total_rows": self.total_rows,
            "returned_rows": self.returned_rows,
            "data": self.rows,
        })
    }
}

/// Tell a JSON error object apart from table data.
pub fn classify(bytes: &[u8]) -> Payload<'_> {
    let trimmed = bytes.trim_ascii_start();
    if trimmed.first() == Some(&b'{') {
        if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(bytes) {
            if map.contains_key("err") || map.contains_key("errtxt") {
                let message = map
                    .get("errtxt")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        format!("remote error {}", map.get("err").unwrap_or(&Value::Null))
                    });
                return Payload::RemoteError { message };
            }
        }
    }
    Payload::Body(bytes)
}

/// Gunzip when possible, otherwise read the body as plain UTF-8.
pub fn decompress(bytes: &[u8]) -> Result<Decoded, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut inflated = Vec::new();
    if GzDecoder::new(bytes).read_to_end(&mut inflated).is_ok() {
        if let Ok(text) = String::from_utf8(inflated) {
            return Ok(Decoded::Gzip(text));
        }
    }

    String::from_utf8(bytes.to_vec())
        .map(Decoded::Plain)
        .map_err(|_| DecodeError::Undecodable)
}

/// Split tab-separated text into rows. Blank lines are skipped.
pub fn split_rows(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

/// Run the whole pipeline. Anything that yields no rows is `no_data`.
pub fn decode_table(bytes: &[u8], max_rows: usize) -> Result<TableResult, ToolError> {
    let body = match classify(bytes) {
        Payload::RemoteError { message } => return Err(ToolError::no_data(message)),
        Payload::Body(body) => body,
    };

    let decoded = decompress(body).map_err(|e| ToolError::no_data(e.to_string()))?;
    let mut rows = split_rows(decoded.text());
    if rows.is_empty() {
        return Err(ToolError::no_data("the result table is empty"));
    }

    let total_rows = rows.len();
    rows.truncate(max_rows);
    Ok(TableResult {
        total_rows,
        returned_rows: rows.len(),
        rows,
    })
}
