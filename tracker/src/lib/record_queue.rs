use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::error::{Result, TrackerError};
use super::metrics;
use super::tracker::Tracker;

#[derive(Debug)]
enum RecordCommand {
    Record(String),
    Reset,
    /// Acknowledged once every command queued ahead of it has been applied.
    Flush(oneshot::Sender<()>),
}

/// Cloneable handle feeding a single consumer task that applies records to
/// a [`Tracker`] in arrival order.
///
/// Callers on the request path hand off the key and return; the consumer
/// is the only writer that goes through the queue, so lock contention from
/// the hot path is bounded to one task.
#[derive(Debug, Clone)]
pub struct RecordQueue {
    sender: mpsc::Sender<RecordCommand>,
}

impl RecordQueue {
    /// Spawn the consumer on the current tokio runtime.
    ///
    /// The task exits once every `RecordQueue` clone has been dropped and
    /// the queue is drained, or immediately on a count overflow.
    pub fn spawn(tracker: Arc<Tracker>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_record_consumer(tracker, receiver));
        (Self { sender }, handle)
    }

    /// Enqueue without waiting. Fails with `QueueFull` under back-pressure.
    pub fn try_record(&self, key: &str) -> Result<()> {
        validate(key)?;
        match self.sender.try_send(RecordCommand::Record(key.to_owned())) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                metrics::QUEUE_DROPPED_TOTAL.inc();
                Err(TrackerError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(TrackerError::QueueClosed),
        }
    }

    /// Enqueue, waiting for capacity if the queue is full.
    pub async fn record(&self, key: &str) -> Result<()> {
        validate(key)?;
        self.send(RecordCommand::Record(key.to_owned())).await
    }

    /// Enqueue an epoch reset, ordered after every record already queued.
    pub async fn reset(&self) -> Result<()> {
        self.send(RecordCommand::Reset).await
    }

    /// Wait until every command queued before this call has been applied.
    pub async fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.send(RecordCommand::Flush(ack_tx)).await?;
        ack_rx.await.map_err(|_| TrackerError::QueueClosed)
    }

    async fn send(&self, command: RecordCommand) -> Result<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| TrackerError::QueueClosed)
    }
}

fn validate(key: &str) -> Result<()> {
    if key.is_empty() {
        metrics::INVALID_KEYS_TOTAL.inc();
        return Err(TrackerError::InvalidKey);
    }
    Ok(())
}

async fn run_record_consumer(tracker: Arc<Tracker>, mut receiver: mpsc::Receiver<RecordCommand>) {
    debug!("Record queue consumer started");
    let mut applied: u64 = 0;

    while let Some(command) = receiver.recv().await {
        match command {
            RecordCommand::Record(key) => match tracker.record(&key) {
                Ok(()) => applied += 1,
                Err(e @ TrackerError::CountOverflow { .. }) => {
                    // Fatal: stop consuming so producers see QueueClosed
                    error!("Stopping record queue consumer: {}", e);
                    return;
                }
                Err(e) => warn!("Dropping queued record for '{}': {}", key, e),
            },
            RecordCommand::Reset => tracker.reset(),
            RecordCommand::Flush(ack) => {
                // Flusher may have given up waiting
                let _ = ack.send(());
            }
        }
    }

    debug!("Record queue consumer stopped after {} records", applied);
}

/// Reset `tracker` every `period`, starting one period from now.
///
/// Runs until the task is aborted.
pub fn run_epoch_reset(tracker: Arc<Tracker>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            debug!("Epoch boundary reached after {:?}", period);
            tracker.reset();
        }
    })
}
