use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::ClientConfig;
use shared_utils::validation::required_trimmed;
use shared_models::{
    AdminBooking, AuthStatusResponse, Booking, ClientError, CreateBookingRequest,
    CreateBookingResponse, LoginRequest, MessageResponse, QueueSnapshot,
};

/// Error body shape used by the queue service. Some routes send `error` instead of `message`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Typed client for the clinic queue service.
///
/// The session cookie set by the login route lives in the client's cookie
/// store and is attached to every later call automatically, so clones of one
/// `QueueApiClient` share a session.
#[derive(Clone)]
pub struct QueueApiClient {
    client: Client,
    base_url: Url,
}

impl QueueApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(config.api_base_url.trim()).map_err(|e| {
            ClientError::InvalidState(format!(
                "Invalid API base URL {:?}: {}",
                config.api_base_url, e
            ))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidState(format!(
                "API base URL {:?} cannot carry a path",
                config.api_base_url
            )));
        }

        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidState(format!("Invalid API base URL {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request<T>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
        fallback: &str,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, url.clone());

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            ClientError::Transport(fallback.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}) from {}: {}", status, url, error_text);

            let message = server_message(&error_text).unwrap_or_else(|| fallback.to_string());

            return Err(match status.as_u16() {
                401 | 403 => ClientError::Unauthorized(message),
                404 => ClientError::NotFound(message),
                code => ClientError::Server {
                    status: code,
                    message,
                },
            });
        }

        response.json::<T>().await.map_err(|e| {
            error!("Unreadable response body from {}: {}", url, e);
            ClientError::Transport(fallback.to_string())
        })
    }

    pub async fn create_booking(
        &self,
        patient_name: &str,
    ) -> Result<CreateBookingResponse, ClientError> {
        let body = serde_json::to_value(CreateBookingRequest {
            patient_name: patient_name.to_string(),
        })
        .map_err(|e| ClientError::Validation(e.to_string()))?;

        self.request(
            Method::POST,
            &["bookings"],
            Some(body),
            "Failed to book slot.",
        )
        .await
    }

    pub async fn get_queue_snapshot(&self) -> Result<QueueSnapshot, ClientError> {
        self.request(
            Method::GET,
            &["queue"],
            None,
            "Failed to fetch queue status.",
        )
        .await
    }

    pub async fn get_booking_details(&self, booking_id: &str) -> Result<Booking, ClientError> {
        let booking_id = required_trimmed(booking_id, "Booking ID is required.")?;

        let mut booking: Booking = self
            .request(
                Method::GET,
                &["bookings", booking_id],
                None,
                "Failed to fetch booking details.",
            )
            .await?;

        if booking.booking_id.is_empty() {
            booking.booking_id = booking_id.to_string();
        }

        Ok(booking)
    }

    pub async fn cancel_booking(&self, booking_id: &str) -> Result<MessageResponse, ClientError> {
        let booking_id = required_trimmed(booking_id, "Booking ID is required.")?;

        self.request(
            Method::DELETE,
            &["bookings", booking_id],
            None,
            "Failed to cancel booking.",
        )
        .await
    }

    pub async fn get_admin_queue(&self) -> Result<Vec<AdminBooking>, ClientError> {
        self.request(
            Method::GET,
            &["admin", "queue"],
            None,
            "Failed to fetch admin queue.",
        )
        .await
    }

    /// Takes the service-internal id, not the patient-facing booking id.
    pub async fn mark_patient_done(
        &self,
        internal_id: &str,
    ) -> Result<MessageResponse, ClientError> {
        let internal_id = required_trimmed(internal_id, "Internal Booking ID is required.")?;

        self.request(
            Method::PATCH,
            &["admin", "bookings", internal_id, "done"],
            None,
            "Failed to mark patient as done.",
        )
        .await
    }

    /// Rejected credentials come back as `AuthFailed`, never `Unauthorized`.
    pub async fn login(&self, username: &str, password: &str) -> Result<MessageResponse, ClientError> {
        let body = serde_json::to_value(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
        .map_err(|e| ClientError::Validation(e.to_string()))?;

        self.request(Method::POST, &["auth", "login"], Some(body), "Login failed.")
            .await
            .map_err(|e| match e {
                ClientError::Unauthorized(msg) | ClientError::NotFound(msg) => {
                    ClientError::AuthFailed(msg)
                }
                ClientError::Server { message, .. } => ClientError::AuthFailed(message),
                other => other,
            })
    }

    pub async fn logout(&self) -> Result<MessageResponse, ClientError> {
        self.request(Method::POST, &["auth", "logout"], None, "Logout failed.")
            .await
    }

    pub async fn auth_status(&self) -> Result<AuthStatusResponse, ClientError> {
        self.request(
            Method::GET,
            &["auth", "status"],
            None,
            "Failed to check authentication status.",
        )
        .await
    }
}

fn server_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}
