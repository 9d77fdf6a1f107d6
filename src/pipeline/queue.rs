//! Bounded handoff queues between pipeline tasks.
//!
//! Every blocking queue operation races against the run's cancellation token,
//! so a task parked on a full or empty queue unwinds as soon as the group is
//! cancelled.

use std::future::Future;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use crate::error::{Error, Result};

/// Capacity of every inter-stage queue.
pub const QUEUE_CAPACITY: usize = 100;

pub fn bounded<T>() -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(QUEUE_CAPACITY)
}

/// Send `item`, blocking while the queue is full.
pub async fn send<T>(tx: &mpsc::Sender<T>, item: T, token: &CancellationToken) -> Result<()> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        sent = tx.send(item) => match sent {
            Ok(()) => Ok(()),
            Err(_) => {
                // Consumers drain until close, so a dropped receiver means its
                // task failed. Wait for that failure to cancel the group so it
                // is the error the group reports.
                token.cancelled().await;
                Err(Error::Cancelled)
            }
        },
    }
}

/// Receive the next item, `None` once every sender is gone.
pub async fn recv<T>(rx: &mut mpsc::Receiver<T>, token: &CancellationToken) -> Result<Option<T>> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        item = rx.recv() => Ok(item),
    }
}

/// Receive from a queue drained by several workers.
pub async fn recv_shared<T>(
    rx: &Mutex<mpsc::Receiver<T>>,
    token: &CancellationToken,
) -> Result<Option<T>> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        item = async { rx.lock().await.recv().await } => Ok(item),
    }
}

/// Run a collaborator call, abandoning it if the run is cancelled first.
pub async fn cancellable<F, T>(token: &CancellationToken, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        result = future => result,
    }
}

/// Cancel the run when a producer fails, before its output sender drops.
///
/// Consumers treat a closed queue as the end of their input. Cancelling first
/// keeps them from flushing partial results downstream.
pub fn cancel_on_error<T>(token: &CancellationToken, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if !e.is_cancellation() {
            token.cancel();
        }
    }
    result
}
