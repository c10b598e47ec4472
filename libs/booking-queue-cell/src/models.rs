use chrono::{DateTime, Utc};

/// How a fetch presents itself to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Shows a loading indicator; on failure the stale data is cleared.
    Foreground,
    /// Silent periodic refresh; on failure only the error banner changes.
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Failed,
    /// The poller was stopped or remounted while the request was in flight.
    Discarded,
    /// The source reported a fatal error and the poller stopped itself.
    Halted,
}

/// State published to the presentation layer for one polled view.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueView<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> Default for QueueView<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            last_updated: None,
        }
    }
}

impl<T> QueueView<T> {
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}
