use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use shared_models::ClientError;

use crate::models::{FetchMode, FetchOutcome, QueueView};

/// Something a poller can fetch on a schedule.
#[async_trait]
pub trait QueueSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    /// Short label used in logs.
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<Self::Item, ClientError>;

    /// Errors after which polling is pointless, e.g. a rejected session.
    fn is_fatal(&self, _error: &ClientError) -> bool {
        false
    }
}

struct PollerShared<S: QueueSource> {
    source: Arc<S>,
    interval: Duration,
    view: watch::Sender<QueueView<S::Item>>,
    // Bumped on every start and stop; fetches tagged with an older epoch are dropped.
    epoch: AtomicU64,
    running: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<S: QueueSource> PollerShared<S> {
    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.running.load(Ordering::SeqCst) && self.epoch.load(Ordering::SeqCst) == epoch
    }

    fn halt(&self, epoch: u64) {
        let _task = self.lock_task();
        if self.is_current(epoch) {
            self.running.store(false, Ordering::SeqCst);
            self.epoch.fetch_add(1, Ordering::SeqCst);
            warn!("{} poller halted after fatal error", self.source.name());
        }
    }

    async fn run(self: Arc<Self>, epoch: u64) {
        if self.fetch(FetchMode::Foreground, epoch).await == FetchOutcome::Halted {
            return;
        }

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.fetch(FetchMode::Background, epoch).await {
                FetchOutcome::Halted | FetchOutcome::Discarded => break,
                FetchOutcome::Applied | FetchOutcome::Failed => {}
            }
        }

        debug!("{} poll loop ended", self.source.name());
    }

    async fn fetch(&self, mode: FetchMode, epoch: u64) -> FetchOutcome {
        if !self.is_current(epoch) {
            return FetchOutcome::Discarded;
        }

        if mode == FetchMode::Foreground {
            self.view.send_modify(|view| {
                view.loading = true;
                view.error = None;
            });
        }

        let result = self.source.fetch().await;

        if !self.is_current(epoch) {
            debug!("Discarding {} result from a stopped poller", self.source.name());
            if mode == FetchMode::Foreground {
                self.view.send_if_modified(|view| std::mem::replace(&mut view.loading, false));
            }
            return FetchOutcome::Discarded;
        }

        match result {
            Ok(item) => {
                self.view.send_modify(|view| {
                    view.data = Some(item);
                    view.error = None;
                    view.last_updated = Some(Utc::now());
                    if mode == FetchMode::Foreground {
                        view.loading = false;
                    }
                });
                FetchOutcome::Applied
            }
            Err(e) => {
                let fatal = self.source.is_fatal(&e);
                warn!("{} fetch failed ({:?}): {}", self.source.name(), mode, e);

                self.view.send_modify(|view| {
                    view.error = Some(e.display_message());
                    if mode == FetchMode::Foreground || fatal {
                        view.data = None;
                        view.loading = false;
                    }
                });

                if fatal {
                    self.halt(epoch);
                    FetchOutcome::Halted
                } else {
                    FetchOutcome::Failed
                }
            }
        }
    }
}

/// Repeating fetch of one queue view.
///
/// `start` does an immediate foreground fetch and then a background fetch
/// every interval until stopped. Failures never stop the timer unless the
/// source calls them fatal. Clones share the same timer and view.
pub struct QueuePoller<S: QueueSource> {
    shared: Arc<PollerShared<S>>,
}

impl<S: QueueSource> Clone for QueuePoller<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: QueueSource> QueuePoller<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        Self {
            shared: Arc::new(PollerShared {
                source,
                interval,
                view: watch::Sender::new(QueueView::default()),
                epoch: AtomicU64::new(0),
                running: AtomicBool::new(false),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.shared.source
    }

    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn view(&self) -> QueueView<S::Item> {
        self.shared.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueueView<S::Item>> {
        self.shared.view.subscribe()
    }

    /// Starts polling. The returned guard stops the poller when dropped.
    pub fn start(&self) -> Result<PollGuard<S>, ClientError> {
        let mut task = self.shared.lock_task();

        if self.is_running() {
            return Err(ClientError::InvalidState(format!(
                "{} poller is already running",
                self.shared.source.name()
            )));
        }

        // A poller that halted itself leaves its finished handle behind.
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.running.store(true, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        *task = Some(tokio::spawn(shared.run(epoch)));

        info!(
            "Started {} poller every {:?}",
            self.shared.source.name(),
            self.shared.interval
        );

        Ok(PollGuard {
            poller: self.clone(),
            epoch,
        })
    }

    /// Cancels the timer. Safe to call at any time, any number of times.
    pub fn stop(&self) {
        let mut task = self.shared.lock_task();

        if let Some(handle) = task.take() {
            handle.abort();
        }

        if self.shared.running.swap(false, Ordering::SeqCst) {
            self.shared.epoch.fetch_add(1, Ordering::SeqCst);
            // An aborted foreground fetch never gets to clear its spinner.
            self.shared
                .view
                .send_if_modified(|view| std::mem::replace(&mut view.loading, false));
            info!("Stopped {} poller", self.shared.source.name());
        }
    }

    fn stop_epoch(&self, epoch: u64) {
        if self.shared.epoch.load(Ordering::SeqCst) == epoch {
            self.stop();
        }
    }

    /// Manual refresh; races freely with the timer and the last response wins.
    pub async fn refresh(&self, mode: FetchMode) -> FetchOutcome {
        let epoch = self.shared.epoch.load(Ordering::SeqCst);
        self.shared.fetch(mode, epoch).await
    }

    /// Edits the held data in place, e.g. for an optimistic removal.
    pub fn update_data<F>(&self, edit: F)
    where
        F: FnOnce(&mut S::Item),
    {
        self.shared.view.send_if_modified(|view| match view.data.as_mut() {
            Some(data) => {
                edit(data);
                true
            }
            None => false,
        });
    }

    /// Replaces the error banner without touching the data.
    pub fn set_error(&self, message: Option<String>) {
        self.shared.view.send_modify(|view| view.error = message);
    }
}

/// Scope of one mounted view's poller. Dropping it stops that mount's timer.
pub struct PollGuard<S: QueueSource> {
    poller: QueuePoller<S>,
    epoch: u64,
}

impl<S: QueueSource> PollGuard<S> {
    pub fn poller(&self) -> &QueuePoller<S> {
        &self.poller
    }

    pub fn stop(self) {}
}

impl<S: QueueSource> std::fmt::Debug for PollGuard<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollGuard")
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl<S: QueueSource> Drop for PollGuard<S> {
    fn drop(&mut self) {
        self.poller.stop_epoch(self.epoch);
    }
}
