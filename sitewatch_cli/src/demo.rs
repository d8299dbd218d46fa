use serde_json::{json, Value};
use sitewatch_core::feed::{ConnectionState, LocalHub, RawPayload};
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Payloads the simulated source cycles through. One of them is not valid
/// JSON and one is missing every field.
pub fn sample_payloads() -> Vec<RawPayload> {
    let structured: Vec<Value> = vec![
        json!({ "type": "device_connect", "message": "HD-001 helmet connected", "status": "success", "icon": "Wifi" }),
        json!({ "type": "zone_warning", "message": "Personnel entered danger zone 2", "status": "warning", "icon": "ShieldAlert" }),
        json!({ "type": "device_low_battery", "message": "HD-004 battery below 20%", "status": "warning", "icon": "BatteryLow" }),
        json!({ "type": "emergency", "message": "Emergency button pressed - Zone A", "status": "danger", "icon": "Zap" }),
        json!({ "type": "device_disconnect", "message": "HD-005 helmet disconnected", "status": "error", "icon": "WifiOff" }),
        json!({}),
    ];

    let mut payloads: Vec<RawPayload> = structured.into_iter().map(RawPayload::from).collect();
    payloads.push(RawPayload::Text(
        r#"{"type":"personnel_add","message":"New personnel added: Test02","icon":"UserPlus"}"#.into(),
    ));
    payloads.push(RawPayload::Text("{\"message\": truncated".into()));
    payloads
}

/// Publishes `count` sample payloads once a session is connected, then drops
/// the hub so the session sees the source go away.
pub async fn run_source(
    hub: LocalHub,
    mut state: watch::Receiver<ConnectionState>,
    count: usize,
    interval: Duration,
) {
    if state
        .wait_for(|s| *s == ConnectionState::Connected)
        .await
        .is_err()
    {
        return;
    }

    let payloads = sample_payloads();
    for i in 0..count {
        hub.publish_activity(payloads[i % payloads.len()].clone());
        tokio::time::sleep(interval).await;
    }
    info!(count, "simulated source finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitewatch_core::{
        config::{FeedConfig, ReconnectConfig},
        feed::{FeedSession, FeedUpdate},
    };

    #[tokio::test]
    async fn test_demo_feed_end_to_end() {
        let hub = LocalHub::new(64);
        let config = FeedConfig {
            capacity: 5,
            seed_history: true,
            reconnect: ReconnectConfig::disabled(),
        };
        let mut session = FeedSession::new(hub.channel(), &config);
        assert_eq!(session.log().len(), 5);

        let source = tokio::spawn(run_source(
            hub,
            session.subscribe_state(),
            16,
            Duration::from_millis(1),
        ));

        let mut gave_up = false;
        while let Some(update) = session.next_update().await {
            if update == FeedUpdate::GaveUp {
                gave_up = true;
            }
        }
        source.await.unwrap();

        assert!(gave_up);
        assert_eq!(session.stats().received, 16);
        assert_eq!(session.stats().dropped, 2);
        assert_eq!(session.stats().appended, 14);
        assert_eq!(session.log().len(), 5);
    }
}
