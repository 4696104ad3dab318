//! Delivery of progress events to whoever started the run

use punchsync_domain::SyncProgress;
use tokio::sync::mpsc;
use tracing::debug;

/// Receives progress events in batch order.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: SyncProgress);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn emit(&self, _progress: SyncProgress) {}
}

impl ProgressSink for mpsc::UnboundedSender<SyncProgress> {
    fn emit(&self, progress: SyncProgress) {
        if self.send(progress).is_err() {
            debug!("progress receiver dropped, event discarded");
        }
    }
}

impl ProgressSink for mpsc::Sender<SyncProgress> {
    /// Never waits; a full channel drops the event.
    fn emit(&self, progress: SyncProgress) {
        if let Err(err) = self.try_send(progress) {
            debug!(error = %err, "progress event not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(batch_current: usize) -> SyncProgress {
        SyncProgress {
            batch_current,
            batch_total: 2,
            batch_size: 50,
            success: 0,
            failed: 0,
            completed: false,
        }
    }

    #[tokio::test]
    async fn unbounded_sender_forwards_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.emit(event(1));
        tx.emit(event(2));

        assert_eq!(rx.recv().await.map(|p| p.batch_current), Some(1));
        assert_eq!(rx.recv().await.map(|p| p.batch_current), Some(2));
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel::<SyncProgress>();
        drop(rx);
        tx.emit(event(1));
    }

    #[test]
    fn full_bounded_channel_drops_events() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.emit(event(1));
        tx.emit(event(2));

        assert_eq!(rx.try_recv().map(|p| p.batch_current).ok(), Some(1));
        assert!(rx.try_recv().is_err());
    }
}
