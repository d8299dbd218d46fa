use std::collections::VecDeque;

use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::adapter::{ActivityDecoder, RawPayload};
use super::channel::{ChannelEvent, EventChannel, ACTIVITY_EVENT};
use super::connection::{ConnectionState, ConnectionTracker};
use super::reconnect::Backoff;
use super::stats::FeedStats;
use crate::activity::{historical_sample, ActivityLog, ActivityRecord};
use crate::config::FeedConfig;

/// What changed after the session processed channel traffic.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedUpdate {
    StateChanged(ConnectionState),
    /// A record was placed at the head of the log.
    Appended(ActivityRecord),
    /// An activity payload could not be decoded and was discarded.
    Dropped,
    /// Reconnect attempts are exhausted; the session will yield nothing more.
    GaveUp,
}

/// A live activity feed: one owned push channel, the adapter in front of it
/// and the capped log behind it.
///
/// The channel is released exactly once, either by [`FeedSession::close`] or
/// when the session is dropped.
pub struct FeedSession<C: EventChannel> {
    id: Uuid,
    channel: C,
    decoder: ActivityDecoder,
    log: ActivityLog,
    connection: ConnectionTracker,
    backoff: Backoff,
    stats: FeedStats,
    pending: VecDeque<FeedUpdate>,
    started: bool,
    exhausted: bool,
    closed: bool,
}

impl<C: EventChannel> FeedSession<C> {
    /// Creates a session, seeded with the historical sample when configured.
    pub fn new(channel: C, config: &FeedConfig) -> Self {
        let seed = if config.seed_history {
            historical_sample()
        } else {
            Vec::new()
        };
        Self::with_seed(channel, config, seed)
    }

    pub fn with_seed(channel: C, config: &FeedConfig, seed: Vec<ActivityRecord>) -> Self {
        let id = Uuid::new_v4();
        let log = ActivityLog::with_seed(config.capacity, seed);
        info!(session = %id, seeded = log.len(), capacity = log.capacity(), "feed session created");

        Self {
            id,
            channel,
            decoder: ActivityDecoder::new(),
            log,
            connection: ConnectionTracker::new(),
            backoff: Backoff::new(config.reconnect.clone()),
            stats: FeedStats::new(),
            pending: VecDeque::new(),
            started: false,
            exhausted: false,
            closed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn snapshot(&self) -> Vec<ActivityRecord> {
        self.log.snapshot()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Watch the connection state, e.g. to show that live updates are paused.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Drives the channel until something observable happens. Opens the
    /// channel on first use and reconnects with backoff after it drops.
    /// Returns `None` once the session is closed or has given up.
    pub async fn next_update(&mut self) -> Option<FeedUpdate> {
        loop {
            if let Some(update) = self.pending.pop_front() {
                return Some(update);
            }
            if self.closed || self.exhausted {
                return None;
            }

            if !self.channel.is_open() {
                if self.started {
                    match self.backoff.next_delay() {
                        Some(delay) => {
                            info!(
                                session = %self.id,
                                attempt = self.backoff.attempts(),
                                delay_ms = delay.as_millis() as u64,
                                "reconnecting feed channel"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            warn!(session = %self.id, "feed channel reconnect attempts exhausted");
                            self.exhausted = true;
                            return Some(FeedUpdate::GaveUp);
                        }
                    }
                }
                self.started = true;
                self.connect().await;
                continue;
            }

            match self.channel.next_event().await {
                Some(event) => self.handle_event(event),
                None => self.handle_event(ChannelEvent::Disconnected(None)),
            }
        }
    }

    async fn connect(&mut self) {
        self.channel.close();
        self.set_state(ConnectionState::Connecting);
        if let Err(e) = self.channel.open().await {
            warn!(session = %self.id, error = %e, "failed to open feed channel");
            self.stats.errors += 1;
            self.set_state(ConnectionState::Disconnected);
        }
    }

    /// Applies one channel event. Store mutation happens only here, and
    /// never after the session is closed.
    pub fn handle_event(&mut self, event: ChannelEvent) {
        if self.closed {
            debug!(session = %self.id, "ignoring event on closed session");
            return;
        }
        match event {
            ChannelEvent::Connected => {
                info!(session = %self.id, "feed channel connected");
                self.stats.connects += 1;
                self.backoff.reset();
                self.set_state(ConnectionState::Connected);
            }
            ChannelEvent::Disconnected(reason) => {
                info!(session = %self.id, reason = ?reason, "feed channel disconnected");
                self.stats.disconnects += 1;
                self.channel.close();
                self.set_state(ConnectionState::Disconnected);
            }
            ChannelEvent::Error(message) => {
                warn!(session = %self.id, error = %message, "feed channel error");
                self.stats.errors += 1;
                self.channel.close();
                self.set_state(ConnectionState::Disconnected);
            }
            ChannelEvent::Message { event, payload } if event == ACTIVITY_EVENT => {
                self.accept(payload);
            }
            ChannelEvent::Message { event, .. } => {
                debug!(session = %self.id, event = %event, "ignoring non-activity message");
                self.stats.ignored += 1;
            }
        }
    }

    fn accept(&mut self, payload: RawPayload) {
        self.stats.received += 1;
        match self.decoder.ingest(payload) {
            Some(record) => {
                self.log.append(record.clone());
                self.stats.appended += 1;
                self.pending.push_back(FeedUpdate::Appended(record));
            }
            None => {
                self.stats.dropped += 1;
                self.pending.push_back(FeedUpdate::Dropped);
            }
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.connection.state() == state {
            return;
        }
        match state {
            ConnectionState::Disconnected => self.connection.on_disconnect(),
            ConnectionState::Connecting => self.connection.begin_connect(),
            ConnectionState::Connected => self.connection.on_connect(),
        };
        self.pending.push_back(FeedUpdate::StateChanged(state));
    }

    /// Releases the channel. Later calls, and the drop that follows, do nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.channel.close();
        self.closed = true;
        self.pending.clear();
        self.connection.on_disconnect();
        info!(
            session = %self.id,
            appended = self.stats.appended,
            dropped = self.stats.dropped,
            "feed session closed"
        );
    }
}

impl<C: EventChannel> Drop for FeedSession<C> {
    fn drop(&mut self) {
        self.close();
    }
}
