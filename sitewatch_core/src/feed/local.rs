use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::warn;

use super::adapter::RawPayload;
use super::channel::{ChannelEvent, EventChannel, ACTIVITY_EVENT};
use crate::error::ChannelError;

#[derive(Debug, Clone)]
struct HubMessage {
    event: String,
    payload: RawPayload,
}

/// In-process event source. Channels opened on the hub only see messages
/// published after they connected.
#[derive(Debug, Clone)]
pub struct LocalHub {
    tx: Arc<broadcast::Sender<HubMessage>>,
}

impl LocalHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx: Arc::new(tx) }
    }

    /// Publishes a named message; returns how many channels received it.
    pub fn publish(&self, event: impl Into<String>, payload: impl Into<RawPayload>) -> usize {
        self.tx
            .send(HubMessage {
                event: event.into(),
                payload: payload.into(),
            })
            .unwrap_or(0)
    }

    pub fn publish_activity(&self, payload: impl Into<RawPayload>) -> usize {
        self.publish(ACTIVITY_EVENT, payload)
    }

    pub fn channel(&self) -> LocalChannel {
        LocalChannel {
            hub: Arc::downgrade(&self.tx),
            stream: None,
            announce_connect: false,
        }
    }

    pub fn subscribers(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A [`EventChannel`] backed by a [`LocalHub`]. Ends when every hub handle is dropped.
#[derive(Debug)]
pub struct LocalChannel {
    hub: Weak<broadcast::Sender<HubMessage>>,
    stream: Option<BroadcastStream<HubMessage>>,
    announce_connect: bool,
}

#[async_trait]
impl EventChannel for LocalChannel {
    async fn open(&mut self) -> Result<(), ChannelError> {
        if self.stream.is_some() {
            return Err(ChannelError::AlreadyOpen);
        }
        let tx = self.hub.upgrade().ok_or(ChannelError::Closed)?;
        self.stream = Some(BroadcastStream::new(tx.subscribe()));
        self.announce_connect = true;
        Ok(())
    }

    async fn next_event(&mut self) -> Option<ChannelEvent> {
        if self.announce_connect {
            self.announce_connect = false;
            return Some(ChannelEvent::Connected);
        }
        let stream = self.stream.as_mut()?;
        match stream.next().await {
            Some(Ok(message)) => Some(ChannelEvent::Message {
                event: message.event,
                payload: message.payload,
            }),
            Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                warn!(skipped, "local channel lagged behind the hub");
                Some(ChannelEvent::Error(format!("lagged by {} messages", skipped)))
            }
            None => {
                self.stream = None;
                None
            }
        }
    }

    fn close(&mut self) {
        self.stream = None;
        self.announce_connect = false;
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}
