use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use auth_cell::SessionManager;
use booking_queue_cell::{FetchMode, FetchOutcome, PollGuard, QueuePoller, QueueView};
use shared_config::ClientConfig;
use shared_models::{AdminBooking, ClientError, MutationOutcome};
use shared_utils::confirm::Confirmer;
use shared_utils::notice::clear_notice_after;
use shared_utils::validation::required_trimmed;

use crate::models::AdminActionView;
use crate::services::source::{AdminQueuePoller, AdminQueueSource};
use crate::services::tags::OptimisticTags;

const MISSING_INTERNAL_ID: &str = "Internal Booking ID is required.";
const BUSY: &str = "Another patient is already being marked as done.";
const MARK_DONE_TIMEOUT: &str = "Marking the patient as done timed out. Please refresh the queue.";
const MARKED_DONE_FALLBACK: &str = "Patient marked as done.";

/// Held for the lifetime of one mark-done call.
///
/// The lock lives in the published action view itself, so acquiring it and
/// disabling the buttons are one atomic update. Dropping the guard releases
/// it on every exit path, including a dropped future.
struct MarkDoneLock {
    actions: Arc<watch::Sender<AdminActionView>>,
    internal_id: String,
}

impl MarkDoneLock {
    fn acquire(
        actions: &Arc<watch::Sender<AdminActionView>>,
        internal_id: &str,
    ) -> Option<Self> {
        let mut acquired = false;
        actions.send_if_modified(|view| {
            if view.processing_id.is_some() {
                return false;
            }
            view.processing_id = Some(internal_id.to_string());
            view.message = None;
            view.error = None;
            acquired = true;
            true
        });

        acquired.then(|| Self {
            actions: Arc::clone(actions),
            internal_id: internal_id.to_string(),
        })
    }
}

impl Drop for MarkDoneLock {
    fn drop(&mut self) {
        let internal_id = self.internal_id.as_str();
        self.actions.send_if_modified(|view| {
            if view.processing_id.as_deref() == Some(internal_id) {
                view.processing_id = None;
                true
            } else {
                false
            }
        });
        debug!("Released mark-done lock for {}", internal_id);
    }
}

/// Operator view of the waiting queue.
pub struct AdminQueueController {
    session: SessionManager,
    poller: AdminQueuePoller,
    tags: Arc<OptimisticTags>,
    confirmer: Arc<dyn Confirmer>,
    actions: Arc<watch::Sender<AdminActionView>>,
    mutation_timeout: Duration,
    notice_ttl: Duration,
}

impl AdminQueueController {
    pub fn new(session: SessionManager, confirmer: Arc<dyn Confirmer>, config: &ClientConfig) -> Self {
        let tags = Arc::new(OptimisticTags::new());
        let source = AdminQueueSource::new(session.clone(), Arc::clone(&tags));

        Self {
            session,
            poller: QueuePoller::new(Arc::new(source), config.admin_poll_interval),
            tags,
            confirmer,
            actions: Arc::new(watch::Sender::new(AdminActionView::default())),
            mutation_timeout: config.admin_mutation_timeout,
            notice_ttl: config.admin_notice_ttl,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn poller(&self) -> &AdminQueuePoller {
        &self.poller
    }

    pub fn tags(&self) -> &Arc<OptimisticTags> {
        &self.tags
    }

    /// Starts the listing poller for a mounted admin view.
    pub fn mount(&self) -> Result<PollGuard<AdminQueueSource>, ClientError> {
        self.poller.start()
    }

    pub async fn refresh(&self) -> FetchOutcome {
        self.poller.refresh(FetchMode::Foreground).await
    }

    pub fn listing(&self) -> QueueView<Vec<AdminBooking>> {
        self.poller.view()
    }

    pub fn subscribe_listing(&self) -> watch::Receiver<QueueView<Vec<AdminBooking>>> {
        self.poller.subscribe()
    }

    pub fn actions(&self) -> AdminActionView {
        self.actions.borrow().clone()
    }

    pub fn subscribe_actions(&self) -> watch::Receiver<AdminActionView> {
        self.actions.subscribe()
    }

    pub fn processing_id(&self) -> Option<String> {
        self.actions.borrow().processing_id.clone()
    }

    pub fn can_mark_done(&self, internal_id: &str) -> bool {
        self.actions.borrow().can_mark_done(internal_id)
    }

    /// Marks one waiting booking as served.
    ///
    /// Only one call may be outstanding at a time, across all rows. A second
    /// call is rejected without a prompt or a request.
    #[instrument(skip(self))]
    pub async fn mark_done(
        &self,
        internal_id: &str,
        patient_name: &str,
    ) -> Result<MutationOutcome, ClientError> {
        let internal_id = required_trimmed(internal_id, MISSING_INTERNAL_ID)?;

        if let Some(outstanding) = self.processing_id() {
            warn!("Rejecting mark-done for {} while {} is outstanding", internal_id, outstanding);
            return Err(ClientError::InvalidState(BUSY.to_string()));
        }

        let prompt = format!("Mark patient \"{}\" as done?", patient_name);
        if !self.confirmer.confirm(&prompt).await {
            debug!("Mark-done for {} declined", internal_id);
            return Ok(MutationOutcome::Declined);
        }

        let Some(lock) = MarkDoneLock::acquire(&self.actions, internal_id) else {
            warn!("Lost the race for the mark-done lock on {}", internal_id);
            return Err(ClientError::InvalidState(BUSY.to_string()));
        };

        let api = self.session.api();
        let result = match timeout(self.mutation_timeout, api.mark_patient_done(internal_id)).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Mark-done for {} gave no answer within {:?}",
                    internal_id, self.mutation_timeout
                );
                Err(ClientError::Transport(MARK_DONE_TIMEOUT.to_string()))
            }
        };

        match self.session.observe(result) {
            Ok(response) => {
                self.tags.tag_removed(internal_id);
                self.poller
                    .update_data(|rows| rows.retain(|row| row.internal_id != internal_id));
                drop(lock);

                let message = if response.message.trim().is_empty() {
                    MARKED_DONE_FALLBACK.to_string()
                } else {
                    response.message
                };
                info!("Marked {} as done", internal_id);

                self.actions
                    .send_modify(|view| view.message = Some(message.clone()));
                clear_notice_after(
                    &self.actions,
                    self.notice_ttl,
                    message.clone(),
                    |view: &mut AdminActionView| &mut view.message,
                );

                Ok(MutationOutcome::Applied { message })
            }
            Err(e) => {
                drop(lock);
                error!("Mark-done for {} failed: {}", internal_id, e);

                if e.is_unauthorized() {
                    self.poller.stop();
                }

                self.actions
                    .send_modify(|view| view.error = Some(e.display_message()));
                Err(e)
            }
        }
    }

    /// Ends the operator session and stops polling.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.poller.stop();
        self.session.logout().await;
    }
}
