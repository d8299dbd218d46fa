use chrono::{Local, TimeZone};

/// Display pattern for millisecond timestamps, e.g. `03/14 09:26 AM`.
pub const DISPLAY_FORMAT: &str = "%m/%d %I:%M %p";

/// Current wall clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Renders epoch milliseconds in local time. Out of range values are shown raw.
pub fn format_millis(ms: i64) -> String {
    match Local.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        None => ms.to_string(),
    }
}
