pub mod activity;
pub mod config;
pub mod error;
pub mod feed;

pub use activity::{ActivityLog, ActivityRecord, Severity};
pub use config::{FeedConfig, ReconnectConfig, ServerConfig, SiteWatchConfig};
pub use error::{ChannelError, ConfigError, DecodeError, StoreError};
pub use feed::{ActivityDecoder, ChannelEvent, EventChannel, FeedSession, FeedUpdate, RawPayload};
