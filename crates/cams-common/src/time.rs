//! Compact product timestamps (`YYYYMMDDTHHMMSS`).

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid timestamp layout '{0}': expected YYYYMMDDTHHMM[SS]")]
    InvalidLayout(String),

    #[error("Timestamp '{0}' is not a valid calendar date-time")]
    OutOfRange(String),
}

/// Parse a compact `YYYYMMDDTHHMM[SS]` timestamp.
///
/// Seconds, when present, must be two digits but are ignored: products are
/// identified down to the minute.
pub fn parse_compact_timestamp(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let bytes = s.as_bytes();
    let layout_ok = matches!(bytes.len(), 13 | 15)
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[8] == b'T'
        && bytes[9..].iter().all(u8::is_ascii_digit);
    if !layout_ok {
        return Err(TimeParseError::InvalidLayout(s.to_string()));
    }

    // All fields are ASCII digits at this point.
    let field = |range: std::ops::Range<usize>| -> u32 {
        s[range].bytes().fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
    };
    let year = field(0..4) as i32;
    let (month, day) = (field(4..6), field(6..8));
    let (hour, minute) = (field(9..11), field(11..13));

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .ok_or_else(|| TimeParseError::OutOfRange(s.to_string()))
}

/// Render a timestamp as `YYYY-MM-DD HH:MM UTC`.
pub fn display_timestamp(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M UTC").to_string()
}
