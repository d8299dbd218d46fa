use thiserror::Error;

/// Why an inbound payload could not become an activity record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed activity payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Activity payload is null")]
    Null,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel is already open")]
    AlreadyOpen,

    #[error("Channel is closed")]
    Closed,

    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Activity log has already been initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
