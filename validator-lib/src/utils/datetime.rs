use chrono::{SecondsFormat, Utc};

/// Current UTC time as RFC 3339 with whole seconds, e.g. `2026-01-02T03:04:05Z`
pub fn get_utc_iso_datetime() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
