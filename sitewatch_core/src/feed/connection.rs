use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use tracing::info;

/// Lifecycle of the push channel behind a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    /// Live updates are paused whenever the channel is not connected.
    pub fn is_paused(&self) -> bool {
        !matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Holds the current connection state and publishes every change to watchers,
/// e.g. a "live updates paused" indicator.
#[derive(Debug)]
pub struct ConnectionTracker {
    tx: watch::Sender<ConnectionState>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ConnectionState::Disconnected);
        Self { tx }
    }

    pub fn state(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    pub fn begin_connect(&self) -> bool {
        self.transition(ConnectionState::Connecting)
    }

    pub fn on_connect(&self) -> bool {
        self.transition(ConnectionState::Connected)
    }

    pub fn on_disconnect(&self) -> bool {
        self.transition(ConnectionState::Disconnected)
    }

    /// Moves to `next`, returning whether the state actually changed.
    fn transition(&self, next: ConnectionState) -> bool {
        let changed = self.tx.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            info!(state = %next, "feed connection state changed");
        }
        changed
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}
