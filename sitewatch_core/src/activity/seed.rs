use super::record::{ActivityRecord, ActivityTime, Icon, Severity};

/// Historical sample shown before any live event arrives, newest first.
pub fn historical_sample() -> Vec<ActivityRecord> {
    let entries: [(i64, &str, &str, &str, &str, Icon); 9] = [
        (1, "device_connect", "Test01 helmet connected", "5 min ago", "success", Icon::Wifi),
        (2, "zone_warning", "Personnel entered danger zone 2", "12 min ago", "warning", Icon::ShieldAlert),
        (3, "personnel_add", "New personnel added: Test01", "25 min ago", "info", Icon::UserPlus),
        (4, "device_low_battery", "Device [Test01] battery below 20%", "1 hour ago", "warning", Icon::BatteryLow),
        (5, "emergency", "Emergency button pressed - Zone A", "2 hours ago", "danger", Icon::Zap),
        (6, "device_disconnect", "Test01 helmet disconnected", "3 hours ago", "error", Icon::WifiOff),
        (7, "general_info", "System maintenance completed", "4 hours ago", "info", Icon::Info),
        (8, "zone_danger", "High-voltage zone anomaly detected, personnel not responding", "5 hours ago", "danger", Icon::AlertTriangle),
        (9, "zone_safe_response", "High-voltage zone anomaly detected, personnel reported safe", "6 hours ago", "resolved", Icon::ShieldCheck),
    ];

    entries
        .into_iter()
        .map(|(id, kind, message, time, status, icon)| {
            ActivityRecord::new(id, message, ActivityTime::Display(time.to_string()))
                .with_kind(kind)
                .with_severity(Severity::from_label(status))
                .with_icon(icon)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::record::ActivityId;

    #[test]
    fn test_sample_is_newest_first() {
        let sample = historical_sample();
        assert_eq!(sample.len(), 9);
        assert_eq!(sample[0].id, ActivityId::Number(1));
        assert_eq!(sample[0].severity, Severity::Success);
        assert_eq!(sample[8].id, ActivityId::Number(9));
    }

    #[test]
    fn test_resolved_entry_renders_as_info() {
        let sample = historical_sample();
        assert_eq!(sample[8].kind, "zone_safe_response");
        assert_eq!(sample[8].severity, Severity::Info);
        assert_eq!(sample[8].icon, Icon::ShieldCheck);
    }
}
