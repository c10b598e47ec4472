use std::sync::Arc;

use anyhow::{bail, Context};
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod screen;

use auth_cell::{admin_gate, SessionManager};
use booking_cell::{BookingLifecycleController, FileRecoveryStore, RecoveryStore};
use booking_queue_cell::patient_queue_poller;
use shared_api_client::QueueApiClient;
use shared_config::ClientConfig;
use shared_utils::confirm::AutoConfirm;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic queue kiosk");

    // Load configuration
    let config = ClientConfig::from_env();
    if !config.is_configured() {
        bail!("QUEUE_API_BASE_URL must be an http(s) URL, got {:?}", config.api_base_url);
    }

    let api = Arc::new(QueueApiClient::new(&config).context("building queue API client")?);
    info!("Queue service at {}", api.base_url());

    let session = SessionManager::new(Arc::clone(&api));
    let state = session.verify().await;
    info!("Operator session: {:?} ({:?})", state, admin_gate(state));

    // A kiosk never cancels on anyone's behalf.
    let store: Arc<dyn RecoveryStore> = Arc::new(FileRecoveryStore::from_config(&config));
    let bookings = BookingLifecycleController::new(
        Arc::clone(&api),
        store,
        Arc::new(AutoConfirm(false)),
        &config,
    );

    if let Some(booking_id) = bookings.open_status_view() {
        if let Err(e) = bookings.lookup(&booking_id).await {
            warn!("Could not refresh remembered booking {}: {}", booking_id, e);
        }
        if let Some(line) = screen::booking_line(&bookings.status()) {
            println!("{}", line);
        }
    }

    let poller = patient_queue_poller(Arc::clone(&api), &config);
    let mut updates = poller.subscribe();
    let _guard = poller.start()?;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = screen::queue_line(&updates.borrow_and_update());
                println!("{}", line);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down kiosk");
                break;
            }
        }
    }

    Ok(())
}
