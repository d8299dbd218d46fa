use sitewatch_core::{
    activity::{historical_sample, now_millis, ActivityLog, ActivityRecord, ActivityTime, Severity},
    config::{ServerConfig, SiteWatchConfig},
    error::DecodeError,
    feed::{ActivityDecoder, RawPayload},
};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

/// Shared application state
pub struct AppState {
    /// Broadcast channel feeding every SSE subscriber
    pub activity_tx: broadcast::Sender<ActivityRecord>,

    /// Recent activity kept by the server, newest first
    pub activity_log: RwLock<ActivityLog>,

    /// Normalizes inbound message bodies
    pub decoder: ActivityDecoder,

    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: &SiteWatchConfig) -> Self {
        let (activity_tx, _) = broadcast::channel(config.server.broadcast_capacity.max(1));
        let log = if config.feed.seed_history {
            ActivityLog::with_seed(config.feed.capacity, historical_sample())
        } else {
            ActivityLog::new(config.feed.capacity)
        };

        Self {
            activity_tx,
            activity_log: RwLock::new(log),
            decoder: ActivityDecoder::new(),
            config: config.server.clone(),
        }
    }

    /// Decodes a raw payload and publishes the resulting record.
    pub async fn ingest(&self, payload: RawPayload) -> Result<ActivityRecord, DecodeError> {
        let record = self.decoder.decode(payload)?;
        Ok(self.publish(record).await)
    }

    /// Stores a record in the server log and sends it to live subscribers.
    /// Millisecond timestamps are turned into display text first.
    pub async fn publish(&self, mut record: ActivityRecord) -> ActivityRecord {
        record.occurred_at = record.occurred_at.normalized();

        self.activity_log.write().await.append(record.clone());

        // No subscribers is fine; the record is still in the log.
        let receivers = self.activity_tx.send(record.clone()).unwrap_or(0);
        debug!(id = %record.id, receivers, "published activity");
        record
    }

    /// Publishes a server-generated notice.
    pub async fn announce(&self, kind: &str, message: &str, severity: Severity) -> ActivityRecord {
        info!(kind, message, "announcing");
        let record = ActivityRecord::new(
            self.decoder.fresh_id(),
            message,
            ActivityTime::Millis(now_millis()),
        )
        .with_kind(kind)
        .with_severity(severity);
        self.publish(record).await
    }

    pub async fn snapshot(&self) -> Vec<ActivityRecord> {
        self.activity_log.read().await.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitewatch_core::activity::Icon;

    fn unseeded() -> AppState {
        let mut config = SiteWatchConfig::default();
        config.feed.seed_history = false;
        AppState::new(&config)
    }

    #[tokio::test]
    async fn test_seeded_by_default() {
        let state = AppState::new(&SiteWatchConfig::default());
        assert_eq!(state.snapshot().await.len(), 9);
    }

    #[tokio::test]
    async fn test_publish_normalizes_and_broadcasts() {
        let state = unseeded();
        let mut rx = state.activity_tx.subscribe();

        let record = state
            .ingest(r#"{"id": 5, "message": "hi", "time": 1700000000000}"#.into())
            .await
            .unwrap();
        assert!(matches!(record.occurred_at, ActivityTime::Display(_)));

        let received = rx.recv().await.unwrap();
        assert_eq!(received, record);
        assert_eq!(state.snapshot().await, vec![record]);
    }

    #[tokio::test]
    async fn test_announce() {
        let state = unseeded();
        let record = state
            .announce("disconnection", "A client has disconnected.", Severity::Info)
            .await;
        assert_eq!(record.kind, "disconnection");
        assert_eq!(record.icon, Icon::Info);
        assert_eq!(state.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_not_stored() {
        let state = unseeded();
        assert!(state.ingest("{broken".into()).await.is_err());
        assert!(state.snapshot().await.is_empty());
    }
}
