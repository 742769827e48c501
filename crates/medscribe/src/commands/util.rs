//! Shared helpers for command handlers.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::CliError;

/// Read a UTF-8 file, or stdin when `path` is `-`.
pub fn read_text(path: &Path) -> Result<String, CliError> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Read a binary file, or stdin when `path` is `-`.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, CliError> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read(path)?)
}

/// Parse an RFC 3339 timestamp flag.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, CliError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| CliError::validation(field, format!("expected RFC 3339 timestamp: {e}")))
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
