//! Reminder scheduler background task
//!
//! Scans the shared collection on a fixed interval and delivers one
//! notification per due reminder. The notification ledger is shared with the
//! app through [`SharedLedger`] so a committed reminder change can reset it
//! before the next scan; see [`NotificationLedger`] for how rescheduled
//! reminders re-arm.
//!
//! # Timing
//!
//! A reminder fires on the first scan at or after its instant, so it can be
//! up to one `scan_interval` late. A reminder that has been due for hours
//! still fires once. Ticks never overlap: the loop finishes a scan before it
//! waits for the next tick.
//!
//! # Usage
//!
//! ```ignore
//! let scheduler = ReminderScheduler::new(store, channel, Arc::new(SystemClock), config);
//! let handle = scheduler.spawn();
//! // ...
//! let metrics = handle.shutdown().await?;
//! ```

use crate::clock::Clock;
use crate::config::ReminderConfig;
use crate::error::ClientError;
use crate::notifications::{NotificationChannel, ReminderNotification};
use crate::store::SharedNoteStore;
use notebell_core::{Note, NoteId, NotificationLedger, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub scan_interval: Duration,
    /// Notification title.
    pub title: String,
    /// Notification body when the note title is blank.
    pub fallback_body: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_config(&ReminderConfig::default())
    }
}

impl SchedulerConfig {
    pub fn from_config(config: &ReminderConfig) -> Self {
        Self {
            scan_interval: Duration::from_millis(config.scan_interval_ms),
            title: config.title.clone(),
            fallback_body: config.fallback_body.clone(),
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    pub scans: AtomicU64,
    /// Scans skipped because notification permission was not granted.
    pub skipped_scans: AtomicU64,
    pub delivered: AtomicU64,
    pub failed: AtomicU64,
}

impl SchedulerMetrics {
    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            scans: self.scans.load(Ordering::Relaxed),
            skipped_scans: self.skipped_scans.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    pub scans: u64,
    pub skipped_scans: u64,
    pub delivered: u64,
    pub failed: u64,
}

/// Outcome of a single scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Permission was not granted, nothing was examined.
    pub skipped: bool,
    pub delivered: Vec<NoteId>,
    /// Delivery failed; these stay due and are retried next scan.
    pub failed: Vec<NoteId>,
}

// ============================================================================
// LEDGER
// ============================================================================

/// Notification ledger shared between the scheduler and the app.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<NotificationLedger>>,
}

impl SharedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> MutexGuard<'_, NotificationLedger> {
        self.inner.lock().await
    }

    pub async fn snapshot(&self) -> NotificationLedger {
        self.inner.lock().await.clone()
    }

    /// Re-arm the note's reminder.
    pub async fn forget(&self, id: NoteId) -> Option<Timestamp> {
        self.inner.lock().await.forget(id)
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

pub struct ReminderScheduler {
    store: SharedNoteStore,
    channel: Arc<dyn NotificationChannel>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    ledger: SharedLedger,
    metrics: Arc<SchedulerMetrics>,
}

impl ReminderScheduler {
    pub fn new(
        store: SharedNoteStore,
        channel: Arc<dyn NotificationChannel>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            channel,
            clock,
            config,
            ledger: SharedLedger::new(),
            metrics: Arc::new(SchedulerMetrics::default()),
        }
    }

    /// Use `ledger` instead of a private one.
    pub fn with_ledger(mut self, ledger: SharedLedger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Copy of the ledger as it stands.
    pub async fn ledger(&self) -> NotificationLedger {
        self.ledger.snapshot().await
    }

    pub fn metrics(&self) -> Arc<SchedulerMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn notification_for(&self, note: &Note) -> ReminderNotification {
        let body = if note.title.trim().is_empty() {
            self.config.fallback_body.clone()
        } else {
            note.title.clone()
        };
        ReminderNotification {
            note_id: note.id,
            title: self.config.title.clone(),
            body,
        }
    }

    /// Examine the collection once and deliver every due, unnotified reminder.
    pub async fn scan_once(&mut self) -> ScanReport {
        self.metrics.scans.fetch_add(1, Ordering::Relaxed);
        let mut report = ScanReport::default();

        if !self.channel.permission().is_granted() {
            self.metrics.skipped_scans.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("Reminder scan skipped: notification permission not granted");
            report.skipped = true;
            return report;
        }

        let now = self.clock.now();
        // Held for the whole scan so a reset from the app lands before or
        // after it, never between selection and recording.
        let mut ledger = self.ledger.lock().await;
        let due: Vec<Note> = {
            let store = self.store.read().await;
            let pruned = ledger.prune(store.notes());
            if pruned > 0 {
                tracing::debug!(pruned, "Dropped stale notification ledger entries");
            }
            ledger
                .due_unnotified(store.notes(), now)
                .into_iter()
                .cloned()
                .collect()
        };

        for note in due {
            let notification = self.notification_for(&note);
            match self.channel.deliver(&notification) {
                Ok(()) => {
                    ledger.record(&note);
                    self.metrics.delivered.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(note_id = %note.id, "Reminder delivered");
                    report.delivered.push(note.id);
                }
                Err(err) => {
                    self.metrics.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(note_id = %note.id, error = %err, "Reminder delivery failed");
                    report.failed.push(note.id);
                }
            }
        }

        report
    }

    /// Run the scan loop until `shutdown_rx` turns true or its sender drops.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) -> SchedulerSnapshot {
        let mut ticker = interval(self.config.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            scan_interval_ms = self.config.scan_interval.as_millis() as u64,
            "Reminder scheduler started"
        );

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::info!("Reminder scheduler shutting down");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.scan_once().await;
                }
            }
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            scans = snapshot.scans,
            skipped_scans = snapshot.skipped_scans,
            delivered = snapshot.delivered,
            failed = snapshot.failed,
            "Reminder scheduler stopped"
        );
        snapshot
    }

    /// Start the scan loop on the tokio runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let metrics = self.metrics();
        let task = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle {
            shutdown_tx,
            task,
            metrics,
        }
    }
}

/// Handle to a running scheduler. Dropping it also stops the loop.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<SchedulerSnapshot>,
    metrics: Arc<SchedulerMetrics>,
}

impl SchedulerHandle {
    pub fn metrics(&self) -> SchedulerSnapshot {
        self.metrics.snapshot()
    }

    pub async fn shutdown(self) -> Result<SchedulerSnapshot, ClientError> {
        let _ = self.shutdown_tx.send(true);
        Ok(self.task.await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.scan_interval, Duration::from_secs(30));
        assert_eq!(config.title, "⏰ Reminder");
        assert_eq!(config.fallback_body, "Note");
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = SchedulerMetrics::default();
        metrics.scans.store(4, Ordering::Relaxed);
        metrics.delivered.store(2, Ordering::Relaxed);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.scans, 4);
        assert_eq!(snapshot.delivered, 2);
        assert_eq!(snapshot.failed, 0);
    }
}
