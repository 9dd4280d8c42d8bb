use chrono::{SecondsFormat, Utc};

/// Current UTC time as an RFC 3339 string with millisecond precision
pub fn utcnow_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Milliseconds since the UNIX epoch
pub fn utcnow_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
