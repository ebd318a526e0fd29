use std::fs;
use std::io::{self, Read};

use chrono::{DateTime, Utc};

use crate::error::Result;

/// Read input from a file or stdin
///
/// If `file` is `None` or `-`, reads from stdin.
pub(crate) fn read_input(file: Option<&str>) -> Result<Vec<u8>> {
    match file {
        Some(path) if path != "-" => Ok(fs::read(path)?),
        _ => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Parse an RFC 3339 timestamp given on the command line.
pub(crate) fn parse_time(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

/// The instant validity is checked against.
pub(crate) fn now(at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    at.unwrap_or_else(Utc::now)
}
