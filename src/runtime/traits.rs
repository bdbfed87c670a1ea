//! Trait abstractions for runtime timing
//!
//! The settle intervals go through `Scheduler` so tests can replace wall
//! clock sleeps with timers they fire by hand.

use crate::state_machine::Event;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Delivers an event back to the runtime after a delay
pub trait Scheduler: Send + Sync {
    /// Send `event` on `tx` once `delay` has elapsed, unless `cancel` fires first.
    fn schedule(
        &self,
        delay: Duration,
        event: Event,
        tx: mpsc::Sender<Event>,
        cancel: CancellationToken,
    );
}

impl<T: Scheduler + ?Sized> Scheduler for Arc<T> {
    fn schedule(
        &self,
        delay: Duration,
        event: Event,
        tx: mpsc::Sender<Event>,
        cancel: CancellationToken,
    ) {
        (**self).schedule(delay, event, tx, cancel);
    }
}

// ============================================================================
// Production Adapter
// ============================================================================

/// Scheduler backed by tokio timers
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(
        &self,
        delay: Duration,
        event: Event,
        tx: mpsc::Sender<Event>,
        cancel: CancellationToken,
    ) {
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!(?event, "Settle timer cancelled");
                }
                () = tokio::time::sleep(delay) => {
                    if tx.send(event).await.is_err() {
                        tracing::debug!("Runtime gone before settle timer fired");
                    }
                }
            }
        });
    }
}
