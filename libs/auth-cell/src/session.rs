use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use shared_api_client::QueueApiClient;
use shared_models::{ClientError, SessionState};
use shared_utils::validation::{required, required_trimmed};

const MISSING_CREDENTIALS: &str = "Please enter both username and password.";

/// Owner of the operator session flag.
///
/// Cheap to clone; every clone observes and drives the same state. Created
/// `Unknown` at startup and only moved by `verify`, `login`, `logout` and
/// observed authorization failures.
#[derive(Clone)]
pub struct SessionManager {
    api: Arc<QueueApiClient>,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionManager {
    pub fn new(api: Arc<QueueApiClient>) -> Self {
        Self {
            api,
            state: Arc::new(watch::Sender::new(SessionState::Unknown)),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn api(&self) -> &Arc<QueueApiClient> {
        &self.api
    }

    /// Asks the service whether the session cookie is still valid.
    ///
    /// Fails closed: any error leaves the session `Unauthenticated`.
    #[instrument(skip(self))]
    pub async fn verify(&self) -> SessionState {
        let next = match self.api.auth_status().await {
            Ok(status) if status.is_authenticated => SessionState::Authenticated,
            Ok(_) => SessionState::Unauthenticated,
            Err(e) => {
                warn!("Session check failed, treating as logged out: {}", e);
                SessionState::Unauthenticated
            }
        };

        self.transition(next, "verify");
        next
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let username = required_trimmed(username, MISSING_CREDENTIALS)?;
        required(password, MISSING_CREDENTIALS)?;

        match self.api.login(username, password).await {
            Ok(response) => {
                self.transition(SessionState::Authenticated, "login");
                Ok(response.message)
            }
            Err(e) => {
                warn!("Login rejected for {}: {}", username, e);
                Err(ClientError::AuthFailed(e.display_message()))
            }
        }
    }

    /// Best-effort remote logout. The local session always ends.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!("Logout request failed, proceeding client-side: {}", e);
        }
        self.transition(SessionState::Unauthenticated, "logout");
    }

    /// Local half of logout, used when an authenticated call comes back unauthorized.
    pub fn force_logout(&self, reason: &str) {
        warn!("Session rejected by server ({}), logging out locally", reason);
        self.transition(SessionState::Unauthenticated, "authorization failure");
    }

    /// Passes a result through, forcing a local logout on `Unauthorized`.
    pub fn observe<T>(&self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(ClientError::Unauthorized(reason)) = &result {
            self.force_logout(reason);
        }
        result
    }

    fn transition(&self, next: SessionState, cause: &str) {
        debug_assert!(next != SessionState::Unknown);

        let previous = self.state.send_replace(next);
        if previous != next {
            info!("Session {:?} -> {:?} ({})", previous, next, cause);
        } else {
            debug!("Session stays {:?} ({})", next, cause);
        }
    }
}
