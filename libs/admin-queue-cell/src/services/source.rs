use std::sync::Arc;

use async_trait::async_trait;

use auth_cell::SessionManager;
use booking_queue_cell::{QueuePoller, QueueSource};
use shared_models::{AdminBooking, ClientError};

use crate::services::tags::OptimisticTags;

/// Authenticated listing of waiting bookings.
///
/// Results pass through the session, so a rejected cookie logs the operator
/// out, and through the optimistic tags, so locally removed rows stay gone.
pub struct AdminQueueSource {
    session: SessionManager,
    tags: Arc<OptimisticTags>,
}

impl AdminQueueSource {
    pub fn new(session: SessionManager, tags: Arc<OptimisticTags>) -> Self {
        Self { session, tags }
    }

    pub fn tags(&self) -> &Arc<OptimisticTags> {
        &self.tags
    }
}

#[async_trait]
impl QueueSource for AdminQueueSource {
    type Item = Vec<AdminBooking>;

    fn name(&self) -> &'static str {
        "admin queue"
    }

    async fn fetch(&self) -> Result<Vec<AdminBooking>, ClientError> {
        let ticket = self.tags.begin_read();
        let listing = self
            .session
            .observe(self.session.api().get_admin_queue().await)?;

        Ok(self.tags.reconcile(&ticket, listing))
    }

    fn is_fatal(&self, error: &ClientError) -> bool {
        error.is_unauthorized()
    }
}

pub type AdminQueuePoller = QueuePoller<AdminQueueSource>;
