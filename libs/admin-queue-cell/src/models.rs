use shared_models::AdminBooking;

/// Waiting bookings in service order; index 0 is being served.
pub type AdminQueueListing = Vec<AdminBooking>;

/// Action state of the admin panel, separate from the polled listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminActionView {
    /// Internal id of the record whose mark-done call is outstanding.
    pub processing_id: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl AdminActionView {
    pub fn is_processing(&self) -> bool {
        self.processing_id.is_some()
    }

    /// Every row's button is disabled while any mark-done is outstanding.
    pub fn can_mark_done(&self, _internal_id: &str) -> bool {
        !self.is_processing()
    }

    pub fn is_processing_row(&self, internal_id: &str) -> bool {
        self.processing_id.as_deref() == Some(internal_id)
    }
}
