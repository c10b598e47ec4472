use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_RECOVERY_STORE_PATH: &str = ".clinic-queue/last_booking.json";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub patient_poll_interval: Duration,
    pub admin_poll_interval: Duration,
    pub request_timeout: Duration,
    pub admin_mutation_timeout: Duration,
    pub recovery_store_path: PathBuf,
    pub cancel_notice_ttl: Duration,
    pub admin_notice_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            patient_poll_interval: Duration::from_secs(15),
            admin_poll_interval: Duration::from_secs(20),
            request_timeout: Duration::from_secs(10),
            admin_mutation_timeout: Duration::from_secs(30),
            recovery_store_path: PathBuf::from(DEFAULT_RECOVERY_STORE_PATH),
            cancel_notice_ttl: Duration::from_secs(4),
            admin_notice_ttl: Duration::from_secs(3),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            api_base_url: env::var("QUEUE_API_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("QUEUE_API_BASE_URL not set, using default");
                    defaults.api_base_url.clone()
                }),
            patient_poll_interval: secs_from_env(
                "PATIENT_POLL_INTERVAL_SECS",
                defaults.patient_poll_interval,
            ),
            admin_poll_interval: secs_from_env(
                "ADMIN_POLL_INTERVAL_SECS",
                defaults.admin_poll_interval,
            ),
            request_timeout: secs_from_env("REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            admin_mutation_timeout: secs_from_env(
                "ADMIN_MUTATION_TIMEOUT_SECS",
                defaults.admin_mutation_timeout,
            ),
            recovery_store_path: env::var("RECOVERY_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| defaults.recovery_store_path.clone()),
            cancel_notice_ttl: secs_from_env("CANCEL_NOTICE_SECS", defaults.cancel_notice_ttl),
            admin_notice_ttl: secs_from_env("ADMIN_NOTICE_SECS", defaults.admin_notice_ttl),
        };

        if !config.is_configured() {
            warn!("Queue client not fully configured - API base URL is empty or not http(s)");
        }

        config
    }

    /// Config pointing at an arbitrary server, used by tests against mock servers.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn is_configured(&self) -> bool {
        let url = self.api_base_url.trim();
        !url.is_empty() && (url.starts_with("http://") || url.starts_with("https://"))
    }
}

fn secs_from_env(key: &str, default: Duration) -> Duration {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!("Invalid {} value {:?}, using default of {}s", key, raw, default.as_secs());
                default
            }
        },
        Err(_) => default,
    }
}
