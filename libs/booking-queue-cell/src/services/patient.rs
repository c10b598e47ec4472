use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use shared_api_client::QueueApiClient;
use shared_config::ClientConfig;
use shared_models::{ClientError, QueueSnapshot};

use crate::services::poller::{QueuePoller, QueueSource};

/// Public queue snapshot shown on the patient side.
pub struct PatientQueueSource {
    api: Arc<QueueApiClient>,
}

impl PatientQueueSource {
    pub fn new(api: Arc<QueueApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl QueueSource for PatientQueueSource {
    type Item = QueueSnapshot;

    fn name(&self) -> &'static str {
        "patient queue"
    }

    async fn fetch(&self) -> Result<QueueSnapshot, ClientError> {
        let snapshot = self.api.get_queue_snapshot().await?;

        if !snapshot.is_consistent() {
            warn!(
                "Queue snapshot names do not match totalWaiting={}",
                snapshot.total_waiting
            );
        }

        Ok(snapshot)
    }
}

pub type PatientQueuePoller = QueuePoller<PatientQueueSource>;

pub fn patient_queue_poller(api: Arc<QueueApiClient>, config: &ClientConfig) -> PatientQueuePoller {
    QueuePoller::new(
        Arc::new(PatientQueueSource::new(api)),
        config.patient_poll_interval,
    )
}
