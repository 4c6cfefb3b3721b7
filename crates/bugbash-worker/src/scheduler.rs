//! Poll scheduler
//!
//! Runs one background loop that feeds logged fix events through the scoring
//! pipeline. State machine: Stopped -> start() -> Running -> stop() -> Stopped.
//!
//! Delivery is at-least-once: the cursor is persisted after each record, so a
//! crash between scoring and the cursor write reprocesses that record. The
//! pipeline tolerates this because score events hold absolute totals.
//!
//! A cancelled worker keeps counting as running until its task has exited, so
//! two loops never score concurrently.

use std::sync::Arc;

use bugbash_core::{
    apply_fix_event, BugBashError, FixEventRecord, FixEventSource, PollCursor, PollCursorStore,
    Result, ScoringStore,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::config::PollerConfig;

/// A failure observed by the poll loop
#[derive(Debug)]
pub struct PollFailure {
    /// Record being processed, `None` for cursor or fetch failures
    pub record_id: Option<i64>,
    pub error: BugBashError,
}

/// Handles returned to whoever started the poller
#[derive(Debug)]
pub struct PollerSupervision {
    /// Cancelling this token stops the worker like `stop()` without clearing state
    pub cancel: CancellationToken,
    /// Per-record and per-tick failures, oldest first
    pub errors: mpsc::Receiver<PollFailure>,
}

/// Snapshot of the scheduler and its persisted cursor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PollerStatus {
    pub running: bool,
    pub last_polled: DateTime<Utc>,
    pub last_poll_completed: Option<DateTime<Utc>>,
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Worker {
    fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Wait up to `grace` for the task to exit. The handle must not be awaited again after `true`.
    async fn join(&mut self, grace: std::time::Duration) -> bool {
        match tokio::time::timeout(grace, &mut self.handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!(error = %e, "Poller task ended abnormally");
                true
            }
            Err(_) => {
                warn!(
                    grace_ms = grace.as_millis() as u64,
                    "Poller did not finish within grace period"
                );
                false
            }
        }
    }
}

/// Supervised poller over a fix event source
pub struct PollScheduler {
    config: PollerConfig,
    scoring: Arc<dyn ScoringStore>,
    cursors: Arc<dyn PollCursorStore>,
    source: Arc<dyn FixEventSource>,
    worker: Mutex<Option<Worker>>,
}

impl PollScheduler {
    pub fn new(
        config: PollerConfig,
        scoring: Arc<dyn ScoringStore>,
        cursors: Arc<dyn PollCursorStore>,
        source: Arc<dyn FixEventSource>,
    ) -> Self {
        Self {
            config,
            scoring,
            cursors,
            source,
            worker: Mutex::new(None),
        }
    }

    /// Launch the worker loop.
    ///
    /// Refused with `PollerAlreadyRunning` while a live worker exists. A worker
    /// cancelled through its supervision token is given `stop_grace` to exit
    /// and replaced once it has; if it is still mid-tick the start is refused.
    pub async fn start(&self) -> Result<PollerSupervision> {
        if self.config.interval.is_zero() {
            return Err(BugBashError::config("poll interval must be greater than zero"));
        }

        let mut worker = self.worker.lock().await;
        if let Some(current) = worker.as_mut() {
            if current.is_running() {
                if !current.cancel.is_cancelled() || !current.join(self.config.stop_grace).await {
                    return Err(BugBashError::PollerAlreadyRunning);
                }
            }
        }

        let cancel = CancellationToken::new();
        let (errors_tx, errors_rx) = mpsc::channel(self.config.error_capacity);

        let poll_loop = PollLoop {
            scoring: Arc::clone(&self.scoring),
            cursors: Arc::clone(&self.cursors),
            source: Arc::clone(&self.source),
            cursor_id: self.config.cursor_id.clone(),
            errors: errors_tx,
        };
        let interval = self.config.interval;
        let token = cancel.clone();

        let handle = tokio::spawn(async move { poll_loop.run(interval, token).await });

        info!(
            interval_ms = interval.as_millis() as u64,
            cursor_id = %self.config.cursor_id,
            "Poller started"
        );

        *worker = Some(Worker {
            cancel: cancel.clone(),
            handle,
        });

        Ok(PollerSupervision {
            cancel,
            errors: errors_rx,
        })
    }

    /// Signal the worker to halt and wait up to the grace period for it. No-op when stopped.
    ///
    /// A worker that outlives the grace period stays registered and still
    /// reports as running until its in-flight tick returns.
    pub async fn stop(&self) {
        let mut worker = self.worker.lock().await;
        let Some(current) = worker.as_mut() else {
            debug!("Poller already stopped");
            return;
        };

        current.cancel.cancel();

        if current.join(self.config.stop_grace).await {
            *worker = None;
            info!("Poller stopped");
        }
    }

    pub async fn restart(&self) -> Result<PollerSupervision> {
        self.stop().await;
        self.start().await
    }

    pub async fn is_running(&self) -> bool {
        self.worker
            .lock()
            .await
            .as_ref()
            .is_some_and(Worker::is_running)
    }

    /// Override the persisted watermark. Does not trigger a poll.
    ///
    /// The cursor may move backwards, which makes the next tick reprocess
    /// everything received strictly after `last_polled`.
    pub async fn set_cursor(&self, last_polled: DateTime<Utc>) -> Result<PollCursor> {
        let mut cursor = self.cursors.select_poll_cursor(&self.config.cursor_id).await?;
        let previous = cursor.last_polled;
        cursor.override_to(last_polled);
        self.cursors.update_poll_cursor(&cursor).await?;

        info!(
            cursor_id = %cursor.id,
            previous = %previous,
            last_polled = %last_polled,
            "Poll cursor overridden"
        );
        Ok(cursor)
    }

    pub async fn status(&self) -> Result<PollerStatus> {
        let cursor = self.cursors.select_poll_cursor(&self.config.cursor_id).await?;
        Ok(PollerStatus {
            running: self.is_running().await,
            last_polled: cursor.last_polled,
            last_poll_completed: cursor.last_poll_completed,
        })
    }
}

// ============================================================================
// PollLoop - body of the spawned worker task
// ============================================================================

struct PollLoop {
    scoring: Arc<dyn ScoringStore>,
    cursors: Arc<dyn PollCursorStore>,
    source: Arc<dyn FixEventSource>,
    cursor_id: String,
    errors: mpsc::Sender<PollFailure>,
}

impl PollLoop {
    async fn run(self, interval: std::time::Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Poll loop: shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    self.poll_once(&cancel).await;
                }
            }
        }

        debug!("Poll loop exited");
    }

    /// One tick: read cursor, fetch newer records, score them in order
    async fn poll_once(&self, cancel: &CancellationToken) {
        if cancel.is_cancelled() {
            return;
        }

        let mut cursor = match self.cursors.select_poll_cursor(&self.cursor_id).await {
            Ok(cursor) => cursor,
            Err(e) => {
                self.report(None, e);
                return;
            }
        };

        let records = match self.source.fetch_after(&cursor).await {
            Ok(records) => records,
            Err(e) => {
                self.report(None, e);
                return;
            }
        };

        if records.is_empty() {
            debug!(last_polled = %cursor.last_polled, "No new fix events");
            return;
        }

        let total = records.len();
        let mut processed = 0usize;

        for record in records {
            if cancel.is_cancelled() {
                info!(processed, total, "Poll interrupted by shutdown");
                return;
            }

            if let Err(e) = self.process(&record).await {
                self.report(Some(record.id), e);
            }

            cursor.advance_to(&record);
            if let Err(e) = self.cursors.update_poll_cursor(&cursor).await {
                self.report(Some(record.id), e);
                return;
            }
            processed += 1;
        }

        cursor.last_poll_completed = Some(Utc::now());
        if let Err(e) = self.cursors.update_poll_cursor(&cursor).await {
            self.report(None, e);
            return;
        }

        info!(
            processed,
            last_polled = %cursor.last_polled,
            last_record_id = cursor.last_record_id,
            "Poll completed"
        );
    }

    async fn process(&self, record: &FixEventRecord) -> Result<()> {
        let message = record.parse()?;
        let applied = apply_fix_event(self.scoring.as_ref(), record.received_at, &message).await?;
        debug!(
            record_id = record.id,
            participants = applied.len(),
            "Fix event processed"
        );
        Ok(())
    }

    fn report(&self, record_id: Option<i64>, error: BugBashError) {
        error!(record_id = ?record_id, error = %error, "Poll failure");

        if let Err(e) = self.errors.try_send(PollFailure { record_id, error }) {
            match e {
                mpsc::error::TrySendError::Full(failure) => warn!(
                    record_id = ?failure.record_id,
                    "Poll failure channel full, dropping report"
                ),
                mpsc::error::TrySendError::Closed(_) => {
                    debug!("Poll failure channel closed, supervisor gone")
                }
            }
        }
    }
}
