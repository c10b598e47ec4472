use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

/// Clears a transient message slot after `ttl`, unless it has been replaced in the meantime.
///
/// Holds only a weak reference, so a view that is torn down before the timer
/// fires is left alone.
pub fn clear_notice_after<T, F>(
    sender: &Arc<watch::Sender<T>>,
    ttl: Duration,
    expected: String,
    slot: F,
) where
    T: Send + Sync + 'static,
    F: Fn(&mut T) -> &mut Option<String> + Send + 'static,
{
    let weak = Arc::downgrade(sender);

    tokio::spawn(async move {
        tokio::time::sleep(ttl).await;

        let Some(sender) = weak.upgrade() else {
            return;
        };

        sender.send_if_modified(|state| {
            let current = slot(state);
            if current.as_deref() == Some(expected.as_str()) {
                debug!("Clearing transient notice: {}", expected);
                *current = None;
                true
            } else {
                false
            }
        });
    });
}
