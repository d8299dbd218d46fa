use async_trait::async_trait;

use super::adapter::RawPayload;
use crate::error::ChannelError;

/// Name of the event that carries activity payloads.
pub const ACTIVITY_EVENT: &str = "activity";

/// Something a push channel reported.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The transport is up.
    Connected,
    /// The transport went away, with an optional reason.
    Disconnected(Option<String>),
    /// A transport-level failure.
    Error(String),
    /// A named message.
    Message { event: String, payload: RawPayload },
}

impl ChannelEvent {
    pub fn activity(payload: impl Into<RawPayload>) -> Self {
        ChannelEvent::Message {
            event: ACTIVITY_EVENT.to_string(),
            payload: payload.into(),
        }
    }
}

/// A push channel owned by exactly one feed session.
///
/// `open` on an already open channel fails with [`ChannelError::AlreadyOpen`].
/// `close` is synchronous so it can run from `Drop`, and must be idempotent.
#[async_trait]
pub trait EventChannel: Send {
    async fn open(&mut self) -> Result<(), ChannelError>;

    /// Waits for the next event. `None` once the transport has ended.
    async fn next_event(&mut self) -> Option<ChannelEvent>;

    fn close(&mut self);

    fn is_open(&self) -> bool;
}
