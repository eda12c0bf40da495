//! Progress channel: latest-value publication from a running kernel.
//!
//! The kernel thread publishes without blocking; the worker's async side
//! observes the most recent value. Intermediate values may be skipped or read
//! twice, but a published fraction never goes down and never reaches 1.0
//! (that value belongs to the `Succeeded` transition in the registry).

use tokio::sync::watch;

use crate::kernel::Checkpoint;

/// One published progress value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub fraction: f64,
    pub checkpoint: Checkpoint,
}

impl ProgressUpdate {
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Self {
        Self {
            fraction: checkpoint.fraction_complete(),
            checkpoint,
        }
    }
}

/// Create a channel for one task.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = watch::channel(None);
    (ProgressSender { tx }, ProgressReceiver { rx })
}

/// Writing half, owned by the kernel.
#[derive(Debug)]
pub struct ProgressSender {
    tx: watch::Sender<Option<ProgressUpdate>>,
}

impl ProgressSender {
    /// Publish `update` if it moves progress forward.
    ///
    /// Returns whether the value was published. Never blocks and does not
    /// fail when the receiver is gone.
    pub fn publish(&self, update: ProgressUpdate) -> bool {
        self.tx.send_if_modified(|current| {
            let ahead = match current {
                Some(prev) => update.fraction > prev.fraction,
                None => update.fraction >= 0.0,
            };
            if ahead && update.fraction < 1.0 {
                *current = Some(update);
                true
            } else {
                false
            }
        })
    }
}

/// Reading half, owned by the worker that mirrors progress into the registry.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: watch::Receiver<Option<ProgressUpdate>>,
}

impl ProgressReceiver {
    /// Most recent value, without waiting. Marks it as seen.
    pub fn latest(&mut self) -> Option<ProgressUpdate> {
        *self.rx.borrow_and_update()
    }

    /// Wait until a value newer than the last one seen is published.
    ///
    /// Errors once the sender is dropped and nothing new is pending.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}
