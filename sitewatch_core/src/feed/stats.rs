use serde::Serialize;

/// Running counters for one feed session.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    /// Activity payloads delivered by the channel.
    pub received: usize,
    pub appended: usize,
    /// Payloads that failed to decode.
    pub dropped: usize,
    /// Messages under other event names.
    pub ignored: usize,
    pub connects: usize,
    pub disconnects: usize,
    pub errors: usize,
}

impl FeedStats {
    pub fn new() -> Self {
        Self::default()
    }
}
