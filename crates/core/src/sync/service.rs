//! Push sync orchestrator - drives one serialized run from backlog to summary

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use punchsync_domain::{
    BatchEntry, BatchOutcome, PunchSyncError, PushReport, RejectedRecord, Result, SyncConfig,
    SyncKind, SyncLogStatus, SyncLogUpdate, SyncProgress, SyncStats,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::batch_builder::BatchBuilder;
use super::classifier::{classify, friendly_app_error};
use super::ports::{BatchTransport, SyncLogRepository, TimesheetRepository, TokenProvider};
use super::progress::{NoopProgressSink, ProgressSink};

/// Reason recorded when a run is stopped between batches.
pub const CANCELLED_REASON: &str = "sync cancelled before all batches were sent";

/// Observable phases of a push run, emitted as trace events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushPhase {
    Authenticating,
    Fetching,
    BuildingBatches,
    Sending { batch: usize, of: usize },
    Reconciling { batch: usize },
    Finalized { success: bool },
}

fn enter(phase: PushPhase) {
    debug!(?phase, "push phase");
}

/// Push sync service
pub struct PushSyncService {
    timesheets: Arc<dyn TimesheetRepository>,
    sync_log: Arc<dyn SyncLogRepository>,
    tokens: Arc<dyn TokenProvider>,
    transport: Arc<dyn BatchTransport>,
    progress: Arc<dyn ProgressSink>,
    builder: BatchBuilder,
    backlog_limit: usize,
    cancellation: Option<CancellationToken>,
}

impl PushSyncService {
    /// Create a service with default batching and no progress listener.
    pub fn new(
        timesheets: Arc<dyn TimesheetRepository>,
        sync_log: Arc<dyn SyncLogRepository>,
        tokens: Arc<dyn TokenProvider>,
        transport: Arc<dyn BatchTransport>,
    ) -> Self {
        let defaults = SyncConfig::default();
        Self {
            timesheets,
            sync_log,
            tokens,
            transport,
            progress: Arc::new(NoopProgressSink),
            builder: BatchBuilder::new(defaults.batch_size),
            backlog_limit: defaults.backlog_limit,
            cancellation: None,
        }
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    /// Apply batch size and backlog cap.
    pub fn with_config(mut self, config: &SyncConfig) -> Self {
        self.builder = BatchBuilder::new(config.batch_size);
        self.backlog_limit = config.backlog_limit;
        self
    }

    /// Stop before the next batch once `token` is cancelled. A batch already
    /// in flight always completes and is reconciled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Run one push. Never returns an error: every failure is folded into the
    /// report and the sync log.
    #[instrument(skip(self), fields(run_id = %Uuid::now_v7()))]
    pub async fn push(&self) -> PushReport {
        let started = Instant::now();
        let mut stats = SyncStats::default();

        let log_id = match self.sync_log.create_sync_log(SyncKind::Push).await {
            Ok(id) => id,
            Err(err) => return self.abort(None, stats, &err).await,
        };

        info!(log_id, "starting push sync");

        let report = match self.run(log_id, &mut stats).await {
            Ok(report) => report,
            Err(err) => self.abort(Some(log_id), stats, &err).await,
        };

        enter(PushPhase::Finalized { success: report.success });
        info!(
            log_id,
            success = report.success,
            processed = report.stats.processed,
            synced = report.stats.success,
            failed = report.stats.failed,
            skipped = report.stats.skipped,
            duration_ms = started.elapsed().as_millis() as u64,
            "push sync finished"
        );

        report
    }

    async fn run(&self, log_id: i64, stats: &mut SyncStats) -> Result<PushReport> {
        enter(PushPhase::Authenticating);
        let mut token = self.tokens.valid_token().await?;

        enter(PushPhase::Fetching);
        let backlog = self.timesheets.get_unsynced_timesheets(self.backlog_limit).await?;
        info!(count = backlog.len(), "found unsynced timesheet records");

        if backlog.is_empty() {
            return self.finish_early(log_id, stats, "No records to sync").await;
        }

        enter(PushPhase::BuildingBatches);
        let built = self.builder.build(&backlog);
        stats.processed = built.processed;
        stats.skipped = built.skipped;

        if built.is_empty() {
            return self.finish_early(log_id, stats, "No valid records to sync").await;
        }

        stats.batches_total = built.batches.len();
        info!(
            entries = built.entry_count(),
            batches = stats.batches_total,
            batch_size = self.builder.batch_size(),
            "backlog split into batches"
        );

        let mut halt_reason: Option<String> = None;

        for (index, batch) in built.batches.iter().enumerate() {
            let batch_number = index + 1;

            if self.is_cancelled() {
                warn!(batch = batch_number, "push cancelled, remaining batches left unsynced");
                halt_reason = Some(CANCELLED_REASON.to_string());
                break;
            }

            // Picks up a token refreshed by the transport during the previous batch.
            if index > 0 {
                token = self.tokens.valid_token().await?;
            }

            enter(PushPhase::Sending { batch: batch_number, of: stats.batches_total });
            self.progress.emit(SyncProgress {
                batch_current: batch_number,
                batch_total: stats.batches_total,
                batch_size: batch.len(),
                success: stats.success,
                failed: stats.failed,
                completed: false,
            });

            let outcome = self.transport.send(&token, batch).await;

            enter(PushPhase::Reconciling { batch: batch_number });
            match outcome {
                BatchOutcome::Partial { synced, failed } => {
                    let (accepted, rejected) = self.reconcile(batch, &synced, &failed, stats).await?;
                    stats.batches_completed += 1;
                    info!(batch = batch_number, accepted, rejected, "batch completed");
                }
                BatchOutcome::Fatal { reason } => {
                    error!(batch = batch_number, %reason, "batch failed, stopping push");
                    self.fail_batch(batch, &reason, stats).await?;
                    halt_reason = Some(reason);
                    break;
                }
            }
        }

        self.progress.emit(SyncProgress {
            batch_current: stats.batches_completed,
            batch_total: stats.batches_total,
            batch_size: 0,
            success: stats.success,
            failed: stats.failed,
            completed: true,
        });

        self.sync_log.update_last_sync_time(SyncKind::Push).await?;

        let status = if halt_reason.is_none() && stats.failed == 0 {
            SyncLogStatus::Success
        } else {
            SyncLogStatus::Error
        };
        let message = summary_message(halt_reason.as_deref(), stats);

        self.sync_log
            .update_sync_log(log_id, &SyncLogUpdate::from_stats(status, stats, halt_reason.clone()))
            .await?;

        info!(%status, "{message}");
        Ok(PushReport { success: halt_reason.is_none(), message, stats: *stats })
    }

    /// Apply a partial outcome. Only ids belonging to `batch` are honoured and
    /// each id is applied at most once.
    async fn reconcile(
        &self,
        batch: &[BatchEntry],
        synced: &[i64],
        failed: &[RejectedRecord],
        stats: &mut SyncStats,
    ) -> Result<(usize, usize)> {
        let mut pending: HashSet<i64> = batch.iter().map(|entry| entry.id).collect();
        let mut accepted = 0usize;
        let mut rejected = 0usize;

        for &id in synced {
            if !pending.remove(&id) {
                warn!(timesheet_id = id, "acknowledgement for a record outside the batch ignored");
                continue;
            }
            self.timesheets.mark_synced(id, &id.to_string()).await?;
            stats.success += 1;
            accepted += 1;
            debug!(timesheet_id = id, "timesheet synced");
        }

        for record in failed {
            if !pending.remove(&record.id) {
                warn!(timesheet_id = record.id, "rejection for a record outside the batch ignored");
                continue;
            }
            let message = friendly_app_error(record.error_code, &record.reason);
            self.timesheets.mark_sync_failed(record.id, &message).await?;
            stats.failed += 1;
            rejected += 1;
            warn!(
                timesheet_id = record.id,
                error_code = record.error_code,
                reason = %record.reason,
                %message,
                "timesheet rejected"
            );
        }

        if !pending.is_empty() {
            debug!(unanswered = pending.len(), "records left unsynced by the remote response");
        }

        Ok((accepted, rejected))
    }

    async fn fail_batch(
        &self,
        batch: &[BatchEntry],
        reason: &str,
        stats: &mut SyncStats,
    ) -> Result<()> {
        for entry in batch {
            self.timesheets.mark_sync_failed(entry.id, reason).await?;
            stats.failed += 1;
        }
        Ok(())
    }

    async fn finish_early(
        &self,
        log_id: i64,
        stats: &SyncStats,
        message: &str,
    ) -> Result<PushReport> {
        info!("{message}");
        self.sync_log
            .update_sync_log(log_id, &SyncLogUpdate::from_stats(SyncLogStatus::Success, stats, None))
            .await?;
        Ok(PushReport { success: true, message: message.to_string(), stats: *stats })
    }

    async fn abort(&self, log_id: Option<i64>, stats: SyncStats, err: &PunchSyncError) -> PushReport {
        let message = format!("Push sync error: {}", err.user_message());
        error!(kind = classify(err).label(), error = %err, "push sync aborted");

        if let Some(id) = log_id {
            let update = SyncLogUpdate::from_stats(SyncLogStatus::Error, &stats, Some(message.clone()));
            if let Err(log_err) = self.sync_log.update_sync_log(id, &update).await {
                warn!(log_id = id, error = %log_err, "failed to record aborted push in sync log");
            }
        }

        PushReport { success: false, message, stats }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// Operator-facing summary of a run that reached the sending phase.
pub fn summary_message(halt_reason: Option<&str>, stats: &SyncStats) -> String {
    match halt_reason {
        Some(reason) => {
            let mut message = format!("Push failed: {reason}");
            if stats.success > 0 {
                message.push_str(&format!(
                    " ({} synced before error, {} failed)",
                    stats.success, stats.failed
                ));
            }
            message
        }
        None if stats.failed > 0 => {
            format!("Push completed with errors: {} synced, {} failed", stats.success, stats.failed)
        }
        None => format!("Push completed: {} records synced successfully", stats.success),
    }
}
