use serde::{Deserialize, Serialize};

/// Public aggregate shown on the patient-facing queue display.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub total_waiting: u32,
    #[serde(default)]
    pub current_patient: Option<String>,
    #[serde(default)]
    pub next_patient: Option<String>,
}

impl QueueSnapshot {
    pub fn is_empty(&self) -> bool {
        self.total_waiting == 0
    }

    /// Current patient exists iff someone waits; next patient iff two or more wait.
    pub fn is_consistent(&self) -> bool {
        self.current_patient.is_some() == (self.total_waiting >= 1)
            && self.next_patient.is_some() == (self.total_waiting >= 2)
    }
}
