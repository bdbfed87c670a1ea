//! Runtime for driving a demo session
//!
//! One runtime task per session owns the transcript, topic memory and
//! phase. Shells talk to it through a `SimulatorHandle`.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SimulatorRuntime;
pub use traits::*;

use crate::classifier::TopicTag;
use crate::state_machine::{ConversationTurn, DemoContext, Event, Phase};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};

/// Read-only view of a session published after every change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub transcript: Vec<ConversationTurn>,
    pub phase: Phase,
    pub last_topic: Option<TopicTag>,
    /// Submissions waiting for the current turn to finish
    pub queued: usize,
}

/// Events sent to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimulatorEvent {
    Snapshot(Snapshot),
    TurnSettled {
        turn_id: String,
        rule: String,
        topic: Option<TopicTag>,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("Simulator runtime has stopped")]
    Stopped,
}

/// Handle to interact with a running simulator
#[derive(Clone)]
pub struct SimulatorHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SimulatorEvent>,
    snapshot_rx: watch::Receiver<Snapshot>,
    /// Inputs accepted by the channel, shared by all clones
    sent: Arc<AtomicU64>,
    /// Inputs the runtime has finished processing
    processed_rx: watch::Receiver<u64>,
}

impl SimulatorHandle {
    /// Submit user text; returns the turn id. Blank text is accepted and ignored.
    pub async fn submit(&self, text: impl Into<String>) -> Result<String, SimulatorError> {
        let turn_id = uuid::Uuid::new_v4().to_string();
        self.send(Event::UserSubmit {
            text: text.into(),
            turn_id: turn_id.clone(),
        })
        .await?;
        Ok(turn_id)
    }

    /// Clear transcript, memory and phase
    pub async fn reset(&self) -> Result<(), SimulatorError> {
        self.send(Event::Reset).await
    }

    async fn send(&self, event: Event) -> Result<(), SimulatorError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| SimulatorError::Stopped)?;
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Subscribe to every snapshot and turn notification from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SimulatorEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Wait until every input sent so far has been handled and the session
    /// is idle with nothing queued.
    pub async fn settle(&self) -> Result<Snapshot, SimulatorError> {
        let sent = self.sent.load(Ordering::SeqCst);
        let mut processed = self.processed_rx.clone();
        processed
            .wait_for(|n| *n >= sent)
            .await
            .map_err(|_| SimulatorError::Stopped)?;

        let mut snapshots = self.snapshot_rx.clone();
        let snapshot = snapshots
            .wait_for(|s| s.phase == Phase::Idle && s.queued == 0)
            .await
            .map_err(|_| SimulatorError::Stopped)?;
        Ok(Snapshot::clone(&snapshot))
    }
}

/// Build a runtime for `context` and start it on the current tokio runtime
pub fn spawn_simulator<S>(context: DemoContext, scheduler: S) -> SimulatorHandle
where
    S: Scheduler + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);
    let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
    let (processed_tx, processed_rx) = watch::channel(0);

    let session_id = context.session_id.clone();
    let runtime = SimulatorRuntime::new(
        context,
        scheduler,
        event_rx,
        event_tx.downgrade(),
        broadcast_tx.clone(),
        snapshot_tx,
        processed_tx,
    );

    tokio::spawn(async move {
        runtime.run().await;
        tracing::info!(session_id = %session_id, "Simulator runtime finished");
    });

    SimulatorHandle {
        event_tx,
        broadcast_tx,
        snapshot_rx,
        sent: Arc::new(AtomicU64::new(0)),
        processed_rx,
    }
}
