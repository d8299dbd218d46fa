use std::collections::VecDeque;

use super::record::ActivityRecord;
use crate::error::StoreError;

/// Number of records kept by the dashboard feed.
pub const DEFAULT_CAPACITY: usize = 50;

/// Bounded, arrival-ordered log of recent activity. The head is the newest
/// record; once the capacity is exceeded the oldest records fall off the tail.
///
/// The log is owned by a single session and mutated from one task, so it holds
/// no lock of its own. Wrap it when it has to be shared.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    records: VecDeque<ActivityRecord>,
    capacity: usize,
    initialized: bool,
}

impl ActivityLog {
    /// Creates an empty log. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            initialized: false,
        }
    }

    /// Creates a log already initialized with `seed` (newest first).
    pub fn with_seed(capacity: usize, seed: impl IntoIterator<Item = ActivityRecord>) -> Self {
        let mut log = Self::new(capacity);
        log.fill(seed);
        log
    }

    /// Sets the starting contents, newest first. Allowed once per log, and only
    /// before anything has been appended.
    pub fn initialize(
        &mut self,
        seed: impl IntoIterator<Item = ActivityRecord>,
    ) -> Result<(), StoreError> {
        if self.initialized {
            return Err(StoreError::AlreadyInitialized);
        }
        self.fill(seed);
        Ok(())
    }

    fn fill(&mut self, seed: impl IntoIterator<Item = ActivityRecord>) {
        self.records = seed.into_iter().take(self.capacity).collect();
        self.initialized = true;
    }

    /// Inserts `record` at the head and truncates the tail to the capacity.
    pub fn append(&mut self, record: ActivityRecord) {
        self.initialized = true;
        self.records.push_front(record);
        self.records.truncate(self.capacity);
    }

    /// Copy of the current contents, newest first.
    pub fn snapshot(&self) -> Vec<ActivityRecord> {
        self.records.iter().cloned().collect()
    }

    /// The `n` newest records, newest first.
    pub fn latest(&self, n: usize) -> Vec<ActivityRecord> {
        self.records.iter().take(n).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.records.iter()
    }

    pub fn head(&self) -> Option<&ActivityRecord> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
