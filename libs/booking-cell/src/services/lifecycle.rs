use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use shared_api_client::QueueApiClient;
use shared_config::ClientConfig;
use shared_models::{ClientError, MutationOutcome};
use shared_utils::confirm::Confirmer;
use shared_utils::notice::clear_notice_after;
use shared_utils::validation::required_trimmed;

use crate::models::{BookingFormView, LookupOutcome, StatusView};
use crate::services::recovery::RecoveryStore;

const MISSING_NAME: &str = "Please enter your name.";
const MISSING_BOOKING_ID: &str = "Please enter your Booking ID.";
const NOT_CANCELLABLE: &str = "Only a waiting booking that is currently shown can be cancelled.";
const CANCELLED_FALLBACK: &str = "Booking cancelled successfully.";

/// Patient side of a booking: create it, look it up, cancel it.
///
/// Publishes two views through watch channels. All state changes go through
/// this controller; the presentation layer only reads and forwards input.
pub struct BookingLifecycleController {
    api: Arc<QueueApiClient>,
    store: Arc<dyn RecoveryStore>,
    confirmer: Arc<dyn Confirmer>,
    form: Arc<watch::Sender<BookingFormView>>,
    status: Arc<watch::Sender<StatusView>>,
    lookup_seq: AtomicU64,
    cancel_notice_ttl: Duration,
}

impl BookingLifecycleController {
    pub fn new(
        api: Arc<QueueApiClient>,
        store: Arc<dyn RecoveryStore>,
        confirmer: Arc<dyn Confirmer>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            api,
            store,
            confirmer,
            form: Arc::new(watch::Sender::new(BookingFormView::default())),
            status: Arc::new(watch::Sender::new(StatusView::default())),
            lookup_seq: AtomicU64::new(0),
            cancel_notice_ttl: config.cancel_notice_ttl,
        }
    }

    pub fn form(&self) -> BookingFormView {
        self.form.borrow().clone()
    }

    pub fn subscribe_form(&self) -> watch::Receiver<BookingFormView> {
        self.form.subscribe()
    }

    pub fn status(&self) -> StatusView {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<StatusView> {
        self.status.subscribe()
    }

    pub fn store(&self) -> &Arc<dyn RecoveryStore> {
        &self.store
    }

    pub fn set_patient_name(&self, name: &str) {
        self.form.send_modify(|form| form.patient_name = name.to_string());
    }

    pub fn set_lookup_input(&self, input: &str) {
        self.status.send_modify(|view| view.input = input.to_string());
    }

    /// Creates a booking and remembers its id on this device.
    #[instrument(skip(self))]
    pub async fn create(&self, patient_name: &str) -> Result<String, ClientError> {
        let name = match required_trimmed(patient_name, MISSING_NAME) {
            Ok(name) => name,
            Err(e) => {
                self.form.send_modify(|form| {
                    form.message = None;
                    form.error = Some(e.display_message());
                });
                return Err(e);
            }
        };

        self.form.send_modify(|form| {
            form.submitting = true;
            form.message = None;
            form.error = None;
        });

        match self.api.create_booking(name).await {
            Ok(response) => {
                let booking_id = response.booking_id;
                self.store.save(&booking_id);
                info!("Booking {} created", booking_id);

                self.form.send_modify(|form| {
                    form.submitting = false;
                    form.patient_name.clear();
                    form.message = Some(format!(
                        "Booking successful! Your Booking ID is: {}. Keep this ID safe to check your status or cancel.",
                        booking_id
                    ));
                    form.last_booking_id = Some(booking_id.clone());
                });

                Ok(booking_id)
            }
            Err(e) => {
                error!("Booking failed: {}", e);
                self.form.send_modify(|form| {
                    form.submitting = false;
                    form.error = Some(e.display_message());
                });
                Err(e)
            }
        }
    }

    /// Fetches the authoritative record for `booking_id`.
    ///
    /// Only the newest lookup may touch the view. An older response that
    /// completes late returns `Superseded` and is dropped.
    #[instrument(skip(self))]
    pub async fn lookup(&self, booking_id: &str) -> Result<LookupOutcome, ClientError> {
        let ticket = self.lookup_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let booking_id = match required_trimmed(booking_id, MISSING_BOOKING_ID) {
            Ok(id) => id.to_string(),
            Err(e) => {
                self.status.send_modify(|view| {
                    view.checked_id = None;
                    view.detail = None;
                    view.loading = false;
                    view.message = None;
                    view.error = Some(e.display_message());
                });
                return Err(e);
            }
        };

        self.status.send_modify(|view| {
            view.input = booking_id.clone();
            view.checked_id = Some(booking_id.clone());
            view.detail = None;
            view.loading = true;
            view.message = None;
            view.error = None;
        });

        let result = self.api.get_booking_details(&booking_id).await;

        let mut applied = false;
        self.status.send_if_modified(|view| {
            let current = self.lookup_seq.load(Ordering::SeqCst) == ticket
                && view.checked_id.as_deref() == Some(booking_id.as_str());
            if !current {
                return false;
            }

            view.loading = false;
            match &result {
                Ok(booking) => view.detail = Some(booking.clone()),
                Err(e) => {
                    view.detail = None;
                    view.error = Some(e.display_message());
                }
            }
            applied = true;
            true
        });

        if !applied {
            debug!("Dropping superseded lookup for {}", booking_id);
            return Ok(LookupOutcome::Superseded);
        }

        match result {
            Ok(booking) => {
                if booking.status.is_terminal() && self.store.clear_if_matches(&booking_id) {
                    info!(
                        "Booking {} is {}, forgetting it on this device",
                        booking_id,
                        booking.status.label()
                    );
                }
                Ok(LookupOutcome::Current(booking))
            }
            Err(e) => {
                error!("Lookup for {} failed: {}", booking_id, e);
                Err(e)
            }
        }
    }

    /// Cancels the displayed waiting booking after the patient confirms.
    #[instrument(skip(self))]
    pub async fn cancel(&self, booking_id: &str) -> Result<MutationOutcome, ClientError> {
        let booking_id = booking_id.trim();

        let patient_name = {
            let view = self.status.borrow();
            match view.visible_detail() {
                Some(detail)
                    if detail.booking_id == booking_id && view.can_cancel() =>
                {
                    detail.patient_name.clone()
                }
                _ => {
                    warn!("Refusing to cancel {}: not a displayed waiting booking", booking_id);
                    return Err(ClientError::InvalidState(NOT_CANCELLABLE.to_string()));
                }
            }
        };

        let prompt = format!(
            "Are you sure you want to cancel the booking for {} (ID: {})?",
            patient_name, booking_id
        );
        if !self.confirmer.confirm(&prompt).await {
            debug!("Cancellation of {} declined", booking_id);
            return Ok(MutationOutcome::Declined);
        }

        // The view may have moved on while the prompt was open.
        let mut still_cancellable = false;
        self.status.send_if_modified(|view| {
            still_cancellable = view.can_cancel()
                && view
                    .visible_detail()
                    .is_some_and(|detail| detail.booking_id == booking_id);
            if !still_cancellable {
                return false;
            }
            view.cancelling = true;
            view.message = None;
            view.error = None;
            true
        });

        if !still_cancellable {
            warn!("Booking {} is no longer shown as waiting, not cancelling", booking_id);
            return Err(ClientError::InvalidState(NOT_CANCELLABLE.to_string()));
        }

        match self.api.cancel_booking(booking_id).await {
            Ok(response) => {
                let message = if response.message.trim().is_empty() {
                    CANCELLED_FALLBACK.to_string()
                } else {
                    response.message
                };

                self.status.send_modify(|view| {
                    view.cancelling = false;
                    if let Some(detail) = view
                        .detail
                        .as_mut()
                        .filter(|detail| detail.booking_id == booking_id)
                    {
                        detail.mark_cancelled();
                    }
                    view.message = Some(message.clone());
                });

                if self.store.clear_if_matches(booking_id) {
                    debug!("Forgot cancelled booking {}", booking_id);
                }
                info!("Booking {} cancelled", booking_id);

                clear_notice_after(
                    &self.status,
                    self.cancel_notice_ttl,
                    message.clone(),
                    |view: &mut StatusView| &mut view.message,
                );

                Ok(MutationOutcome::Applied { message })
            }
            Err(e) => {
                error!("Cancelling {} failed: {}", booking_id, e);
                self.status.send_modify(|view| {
                    view.cancelling = false;
                    view.error = Some(e.display_message());
                });
                Err(e)
            }
        }
    }

    /// Pre-fills the lookup field with the remembered id, if any. Never fetches.
    pub fn open_status_view(&self) -> Option<String> {
        let remembered = self.store.load();

        if let Some(id) = &remembered {
            debug!("Pre-filling status lookup with remembered booking {}", id);
            self.status.send_modify(|view| view.input = id.clone());
        }

        remembered
    }
}
