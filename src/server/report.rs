use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};
use uuid::Uuid;

/// Destination for errors that operators need to see.
#[async_trait]
pub trait ErrorSink: Send + Sync {
    /// Record `error` without waiting for delivery. Returns the event id.
    fn capture(&self, error: &(dyn std::error::Error + 'static)) -> Uuid;

    /// Wait up to `timeout` for captured errors to be delivered.
    ///
    /// Returns `false` if reports were still pending when the timeout elapsed.
    async fn flush(&self, timeout: Duration) -> bool;
}

#[derive(Debug)]
struct Report {
    event_id: Uuid,
    message: String,
}

/// Queue-backed sink that delivers reports as `error_report` tracing events.
#[derive(Clone)]
pub struct TracingSink {
    tx: mpsc::UnboundedSender<Report>,
    pending: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl TracingSink {
    /// Start the delivery task. Must be called from within a tokio runtime.
    pub fn spawn() -> Self {
        let (sink, mut rx) = Self::channel();

        let pending = Arc::clone(&sink.pending);
        let drained = Arc::clone(&sink.drained);
        tokio::spawn(async move {
            while let Some(report) = rx.recv().await {
                tracing::error!(
                    target: "error_report",
                    event_id = %report.event_id,
                    "{}",
                    report.message
                );
                pending.fetch_sub(1, Ordering::AcqRel);
                drained.notify_waiters();
            }
        });

        sink
    }

    fn channel() -> (Self, mpsc::UnboundedReceiver<Report>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            tx,
            pending: Arc::new(AtomicUsize::new(0)),
            drained: Arc::new(Notify::new()),
        };
        (sink, rx)
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ErrorSink for TracingSink {
    fn capture(&self, error: &(dyn std::error::Error + 'static)) -> Uuid {
        let event_id = Uuid::new_v4();
        let report = Report {
            event_id,
            message: error.to_string(),
        };

        self.pending.fetch_add(1, Ordering::AcqRel);
        if self.tx.send(report).is_err() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            tracing::warn!(%event_id, "error report worker is gone, dropping report");
        }

        event_id
    }

    async fn flush(&self, timeout: Duration) -> bool {
        let drained = async {
            loop {
                let notified = self.drained.notified();
                tokio::pin!(notified);
                // Register before checking the counter so a wakeup can't slip in between.
                notified.as_mut().enable();
                if self.pending() == 0 {
                    return;
                }
                notified.await;
            }
        };

        tokio::time::timeout(timeout, drained).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ChunkError};

    #[test_log::test(tokio::test)]
    async fn flush_waits_for_delivery() {
        let sink = TracingSink::spawn();

        let first = sink.capture(&ChunkError::MissingHost);
        let second = sink.capture(&ChunkError::from(AppError::new("boom")));
        assert_ne!(first, second);

        assert!(sink.flush(Duration::from_secs(2)).await);
        assert_eq!(sink.pending(), 0);
    }

    #[tokio::test]
    async fn flush_with_nothing_captured_is_immediate() {
        let sink = TracingSink::spawn();
        assert!(sink.flush(Duration::ZERO).await);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_gives_up_after_timeout() {
        // Keep the receiver alive but never drain it.
        let (sink, _rx) = TracingSink::channel();
        sink.capture(&ChunkError::MissingHost);

        let started = tokio::time::Instant::now();
        assert!(!sink.flush(Duration::from_millis(2000)).await);
        assert!(started.elapsed() >= Duration::from_millis(2000));
        assert_eq!(sink.pending(), 1);
    }

    #[tokio::test]
    async fn capture_after_worker_stopped_does_not_count_as_pending() {
        let (sink, rx) = TracingSink::channel();
        drop(rx);

        sink.capture(&ChunkError::MissingHost);
        assert_eq!(sink.pending(), 0);
        assert!(sink.flush(Duration::ZERO).await);
    }
}
