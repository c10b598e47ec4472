use shared_models::QueueSnapshot;

use crate::models::QueueView;

/// Shown in place of a name that is absent, never in place of a present one.
pub const EMPTY_SLOT: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDisplay {
    pub currently_serving: String,
    pub next_patient: String,
    pub total_waiting: String,
}

impl From<&QueueSnapshot> for SnapshotDisplay {
    fn from(snapshot: &QueueSnapshot) -> Self {
        Self {
            currently_serving: slot(snapshot.current_patient.as_deref()),
            next_patient: slot(snapshot.next_patient.as_deref()),
            total_waiting: snapshot.total_waiting.to_string(),
        }
    }
}

fn slot(name: Option<&str>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => EMPTY_SLOT.to_string(),
    }
}

impl QueueView<QueueSnapshot> {
    /// Values to render. The last good snapshot stays visible after a
    /// background failure; `error` is then shown as a banner beside it.
    pub fn display(&self) -> Option<SnapshotDisplay> {
        self.data.as_ref().map(SnapshotDisplay::from)
    }

    /// True when a settled, error-free fetch reported nobody waiting.
    pub fn is_empty_queue(&self) -> bool {
        !self.loading
            && self.error.is_none()
            && self.data.as_ref().is_some_and(QueueSnapshot::is_empty)
    }

    /// Spinner only when there is nothing to show yet.
    pub fn show_spinner(&self) -> bool {
        self.loading && self.data.is_none()
    }
}
