use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;

use shared_config::ClientConfig;

use crate::confirm::Confirmer;

pub struct TestConfig {
    pub api_base_url: String,
    pub patient_poll_interval: Duration,
    pub admin_poll_interval: Duration,
    pub recovery_store_path: PathBuf,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            patient_poll_interval: Duration::from_millis(50),
            admin_poll_interval: Duration::from_millis(50),
            recovery_store_path: std::env::temp_dir().join("clinic-queue-test-last-booking.json"),
        }
    }
}

impl TestConfig {
    /// Points at a mock server, e.g. `MockServer::uri()` plus `/api`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.api_base_url.clone(),
            patient_poll_interval: self.patient_poll_interval,
            admin_poll_interval: self.admin_poll_interval,
            request_timeout: Duration::from_secs(5),
            admin_mutation_timeout: Duration::from_secs(5),
            recovery_store_path: self.recovery_store_path.clone(),
            cancel_notice_ttl: Duration::from_millis(200),
            admin_notice_ttl: Duration::from_millis(200),
        }
    }
}

/// Confirmer that answers with a fixed value and remembers every prompt.
pub struct RecordingConfirmer {
    answer: bool,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl RecordingConfirmer {
    pub fn accepting() -> Self {
        Self {
            answer: true,
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn declining() -> Self {
        Self {
            answer: false,
            ..Self::accepting()
        }
    }

    /// Accepts, but only after the prompt has been open for `delay`.
    pub fn accepting_after(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::accepting()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Confirmer for RecordingConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answer
    }
}

pub struct MockQueueResponses;

impl MockQueueResponses {
    pub fn booking_created(booking_id: &str, patient_name: &str) -> serde_json::Value {
        json!({
            "message": "Booking successful",
            "bookingId": booking_id,
            "patientName": patient_name
        })
    }

    pub fn booking_detail(
        booking_id: &str,
        patient_name: &str,
        status: &str,
        position: Option<u32>,
    ) -> serde_json::Value {
        json!({
            "bookingId": booking_id,
            "patientName": patient_name,
            "status": status,
            "position": position,
            "bookingTime": "2024-05-01T09:30:00Z"
        })
    }

    pub fn queue_snapshot(
        total_waiting: u32,
        current_patient: Option<&str>,
        next_patient: Option<&str>,
    ) -> serde_json::Value {
        json!({
            "totalWaiting": total_waiting,
            "currentPatient": current_patient,
            "nextPatient": next_patient
        })
    }

    /// Waiting rows in booking order, one minute apart.
    pub fn admin_queue(rows: &[(&str, &str, &str)]) -> serde_json::Value {
        let start = Utc::now() - ChronoDuration::hours(1);
        let rows: Vec<serde_json::Value> = rows
            .iter()
            .enumerate()
            .map(|(i, (internal_id, patient_name, booking_id))| {
                json!({
                    "_id": internal_id,
                    "patientName": patient_name,
                    "bookingTime": (start + ChronoDuration::minutes(i as i64)).to_rfc3339(),
                    "bookingId": booking_id
                })
            })
            .collect();
        json!(rows)
    }

    pub fn auth_status(is_authenticated: bool) -> serde_json::Value {
        json!({ "isAuthenticated": is_authenticated })
    }

    pub fn message(message: &str) -> serde_json::Value {
        json!({ "message": message })
    }
}
