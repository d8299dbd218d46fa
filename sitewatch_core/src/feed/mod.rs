mod adapter;
mod channel;
mod connection;
mod local;
mod reconnect;
mod session;
mod stats;

pub use adapter::{ActivityDecoder, FallbackIds, RawPayload};
pub use channel::{ChannelEvent, EventChannel, ACTIVITY_EVENT};
pub use connection::{ConnectionState, ConnectionTracker};
pub use local::{LocalChannel, LocalHub};
pub use reconnect::Backoff;
pub use session::{FeedSession, FeedUpdate};
pub use stats::FeedStats;
