use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    Waiting,
    Done,
    Cancelled,
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Done | BookingStatus::Cancelled)
    }

    pub fn can_transition_to(&self, target: &BookingStatus) -> bool {
        matches!(
            (self, target),
            (BookingStatus::Waiting, BookingStatus::Done)
                | (BookingStatus::Waiting, BookingStatus::Cancelled)
        )
    }

    /// Badge text shown to patients.
    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::Waiting => "Waiting",
            BookingStatus::Done => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

/// Patient-facing booking record, keyed by the public booking id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    // Older servers omit the id from detail responses; the client fills it in.
    #[serde(default)]
    pub booking_id: String,
    pub patient_name: String,
    pub status: BookingStatus,
    #[serde(default)]
    pub position: Option<u32>,
    pub booking_time: DateTime<Utc>,
}

impl Booking {
    pub fn is_waiting(&self) -> bool {
        self.status == BookingStatus::Waiting
    }

    /// `position` is present iff the booking is waiting, and then lies in `1..=total_waiting`.
    pub fn position_is_consistent(&self, total_waiting: u32) -> bool {
        match (self.status, self.position) {
            (BookingStatus::Waiting, Some(position)) => position >= 1 && position <= total_waiting,
            (BookingStatus::Waiting, None) => false,
            (_, position) => position.is_none(),
        }
    }

    /// Applies the local side of a successful cancellation.
    pub fn mark_cancelled(&mut self) {
        self.status = BookingStatus::Cancelled;
        self.position = None;
    }
}

/// Admin listing row. `internal_id` is only ever used for admin mutations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminBooking {
    #[serde(rename = "_id", alias = "internalId")]
    pub internal_id: String,
    pub patient_name: String,
    pub booking_time: DateTime<Utc>,
    pub booking_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub patient_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub message: String,
    pub booking_id: String,
    #[serde(default)]
    pub patient_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Result of a mutation that asks the user for confirmation first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied { message: String },
    Declined,
}
