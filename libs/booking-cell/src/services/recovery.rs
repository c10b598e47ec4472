use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use shared_config::ClientConfig;

/// Remembers the last booking id created on this device, so the status view
/// can offer it again after a restart. Holds one slot only.
pub trait RecoveryStore: Send + Sync {
    fn save(&self, booking_id: &str);

    fn load(&self) -> Option<String>;

    fn clear(&self);

    /// Clears the slot only if it still holds `booking_id`.
    fn clear_if_matches(&self, booking_id: &str) -> bool {
        if self.load().as_deref() == Some(booking_id) {
            self.clear();
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryRecoveryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryRecoveryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecoveryStore for MemoryRecoveryStore {
    fn save(&self, booking_id: &str) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(booking_id.to_string());
        }
    }

    fn load(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecoveryDocument {
    #[serde(rename = "lastBookingId", default)]
    last_booking_id: Option<String>,
}

/// JSON file backed store: `{"lastBookingId": "..."}`.
///
/// I/O failures are logged and otherwise ignored; losing the remembered id
/// only costs the patient retyping it.
#[derive(Debug, Clone)]
pub struct FileRecoveryStore {
    path: PathBuf,
}

impl FileRecoveryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.recovery_store_path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, document: &RecoveryDocument) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let body = serde_json::to_vec_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)
    }
}

impl RecoveryStore for FileRecoveryStore {
    fn save(&self, booking_id: &str) {
        let document = RecoveryDocument {
            last_booking_id: Some(booking_id.to_string()),
        };

        match self.write(&document) {
            Ok(()) => debug!("Remembered booking {} in {}", booking_id, self.path.display()),
            Err(e) => warn!(
                "Failed to remember booking {} in {}: {}",
                booking_id,
                self.path.display(),
                e
            ),
        }
    }

    fn load(&self) -> Option<String> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice::<RecoveryDocument>(&raw) {
            Ok(document) => document
                .last_booking_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            Err(e) => {
                warn!("Ignoring unreadable recovery file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Cleared remembered booking in {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to clear {}: {}", self.path.display(), e),
        }
    }
}
