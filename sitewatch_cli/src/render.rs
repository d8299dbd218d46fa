use sitewatch_core::{
    activity::{render_lines, ActivityLog, ActivityView},
    feed::{ConnectionState, FeedStats, FeedUpdate},
};

/// Text to print for one feed update, if any.
pub fn update_line(update: &FeedUpdate) -> Option<String> {
    match update {
        FeedUpdate::Appended(record) => Some(ActivityView::new(record).line()),
        FeedUpdate::StateChanged(ConnectionState::Connected) => Some("-- live --".to_string()),
        FeedUpdate::StateChanged(ConnectionState::Connecting) => {
            Some("-- connecting --".to_string())
        }
        FeedUpdate::StateChanged(ConnectionState::Disconnected) => {
            Some("-- live updates paused --".to_string())
        }
        FeedUpdate::GaveUp => Some("-- feed stopped: reconnect attempts exhausted --".to_string()),
        FeedUpdate::Dropped => None,
    }
}

pub fn print_log(title: &str, log: &ActivityLog) {
    println!("{} ({} of {}):", title, log.len(), log.capacity());
    if log.is_empty() {
        println!("  No activity yet.");
        return;
    }
    for line in render_lines(log.iter()) {
        println!("  {}", line);
    }
}

pub fn print_stats(stats: &FeedStats) {
    println!(
        "received {}, appended {}, dropped {}, ignored {}, connects {}, disconnects {}, errors {}",
        stats.received,
        stats.appended,
        stats.dropped,
        stats.ignored,
        stats.connects,
        stats.disconnects,
        stats.errors
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitewatch_core::activity::{ActivityRecord, ActivityTime, Severity};

    #[test]
    fn test_update_lines() {
        let record = ActivityRecord::new(1, "Zone B breach", ActivityTime::Display("now".into()))
            .with_severity(Severity::Warning);
        let line = update_line(&FeedUpdate::Appended(record)).unwrap();
        assert!(line.starts_with("WARN"));
        assert!(line.ends_with("Zone B breach"));

        assert_eq!(update_line(&FeedUpdate::Dropped), None);
        assert_eq!(
            update_line(&FeedUpdate::StateChanged(ConnectionState::Disconnected)).as_deref(),
            Some("-- live updates paused --")
        );
    }
}
