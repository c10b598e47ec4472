//! Wiring for end-to-end scenarios: one mock queue service, a patient
//! device and an operator console sharing it.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use wiremock::MockServer;

use admin_queue_cell::AdminQueueController;
use auth_cell::SessionManager;
use booking_cell::{BookingLifecycleController, FileRecoveryStore};
use booking_queue_cell::{patient_queue_poller, PatientQueuePoller};
use shared_api_client::QueueApiClient;
use shared_config::ClientConfig;
use shared_models::ClientError;
use shared_utils::test_utils::{RecordingConfirmer, TestConfig};

pub struct Clinic {
    pub server: MockServer,
    pub config: ClientConfig,
    // Keeps the recovery file alive for the whole scenario.
    pub data_dir: TempDir,
}

impl Clinic {
    pub async fn open() -> std::io::Result<Self> {
        let server = MockServer::start().await;
        let data_dir = tempfile::tempdir()?;

        let mut test_config = TestConfig::with_base_url(format!("{}/api", server.uri()));
        test_config.recovery_store_path = data_dir.path().join("last_booking.json");
        // Operator listings refresh on demand only.
        test_config.admin_poll_interval = Duration::from_secs(60);

        Ok(Self {
            server,
            config: test_config.to_client_config(),
            data_dir,
        })
    }

    fn api(&self) -> Result<Arc<QueueApiClient>, ClientError> {
        QueueApiClient::new(&self.config).map(Arc::new)
    }

    /// A patient device. Each call is a fresh process over the same disk.
    pub fn patient(&self) -> Result<PatientDevice, ClientError> {
        let api = self.api()?;
        let store = Arc::new(FileRecoveryStore::from_config(&self.config));

        Ok(PatientDevice {
            bookings: BookingLifecycleController::new(
                Arc::clone(&api),
                store.clone(),
                Arc::new(RecordingConfirmer::accepting()),
                &self.config,
            ),
            queue: patient_queue_poller(api, &self.config),
            store,
        })
    }

    /// An operator console with its own cookie jar.
    pub fn operator(&self) -> Result<OperatorConsole, ClientError> {
        let session = SessionManager::new(self.api()?);
        let admin = AdminQueueController::new(
            session.clone(),
            Arc::new(RecordingConfirmer::accepting()),
            &self.config,
        );

        Ok(OperatorConsole { session, admin })
    }
}

pub struct PatientDevice {
    pub bookings: BookingLifecycleController,
    pub queue: PatientQueuePoller,
    pub store: Arc<FileRecoveryStore>,
}

pub struct OperatorConsole {
    pub session: SessionManager,
    pub admin: AdminQueueController,
}
