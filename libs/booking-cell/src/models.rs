use shared_models::Booking;

/// State of the "book a slot" form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFormView {
    pub patient_name: String,
    pub submitting: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    pub last_booking_id: Option<String>,
}

/// State of the "check status / cancel" view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusView {
    /// Text in the booking id field.
    pub input: String,
    /// Id of the most recent lookup; only its result is ever shown.
    pub checked_id: Option<String>,
    pub detail: Option<Booking>,
    pub loading: bool,
    pub cancelling: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl StatusView {
    pub fn visible_detail(&self) -> Option<&Booking> {
        match (&self.detail, &self.checked_id) {
            (Some(detail), Some(checked)) if &detail.booking_id == checked => Some(detail),
            _ => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.loading && !self.input.trim().is_empty()
    }

    pub fn can_cancel(&self) -> bool {
        !self.loading
            && !self.cancelling
            && self.visible_detail().is_some_and(Booking::is_waiting)
    }

    pub fn no_result_notice(&self) -> Option<String> {
        let checked = self.checked_id.as_ref()?;
        if self.loading || self.detail.is_some() || self.error.is_some() || self.message.is_some() {
            return None;
        }
        Some(format!("No active or recent booking found for ID: {}", checked))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// The response belongs to the newest request and is now displayed.
    Current(Booking),
    /// A newer lookup was issued while this one was in flight; nothing changed.
    Superseded,
}
