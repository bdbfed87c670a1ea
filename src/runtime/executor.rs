//! Simulator runtime executor

use super::traits::Scheduler;
use super::{SimulatorEvent, Snapshot};

use crate::classifier::TopicTag;
use crate::state_machine::event::is_blank;
use crate::state_machine::{
    transition, ConversationMemory, ConversationTurn, DemoContext, DemoState, Effect, Event,
    TransitionError,
};
use std::collections::VecDeque;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Owns one session's transcript, memory and phase and drives them from events
pub struct SimulatorRuntime<S>
where
    S: Scheduler + 'static,
{
    context: DemoContext,
    state: DemoState,
    memory: ConversationMemory,
    transcript: Vec<ConversationTurn>,
    scheduler: S,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so the runtime stops once every handle is dropped
    event_tx: mpsc::WeakSender<Event>,
    broadcast_tx: broadcast::Sender<SimulatorEvent>,
    snapshot_tx: watch::Sender<Snapshot>,
    /// Count of handle inputs processed; timer events are not counted
    processed_tx: watch::Sender<u64>,
    /// Submissions received while a turn was in flight, oldest first
    pending: VecDeque<Event>,
    /// Disarms the settle timers of the turn in flight
    timer_cancel: CancellationToken,
}

impl<S> SimulatorRuntime<S>
where
    S: Scheduler + 'static,
{
    pub fn new(
        context: DemoContext,
        scheduler: S,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        broadcast_tx: broadcast::Sender<SimulatorEvent>,
        snapshot_tx: watch::Sender<Snapshot>,
        processed_tx: watch::Sender<u64>,
    ) -> Self {
        Self {
            context,
            state: DemoState::Idle,
            memory: ConversationMemory::default(),
            transcript: Vec::new(),
            scheduler,
            event_rx,
            event_tx,
            broadcast_tx,
            snapshot_tx,
            processed_tx,
            pending: VecDeque::new(),
            timer_cancel: CancellationToken::new(),
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting simulator runtime");

        while let Some(event) = self.event_rx.recv().await {
            let from_handle = !event.is_timer();
            self.process_event(event);
            if from_handle {
                self.processed_tx.send_modify(|n| *n += 1);
            }
        }

        self.timer_cancel.cancel();
        tracing::info!(session_id = %self.context.session_id, "Simulator runtime stopped");
    }

    fn process_event(&mut self, event: Event) {
        if let Event::UserSubmit { text, turn_id } = &event {
            // Blank input is dropped before it can be queued
            if is_blank(text) {
                tracing::debug!(session_id = %self.context.session_id, "Ignoring blank submission");
                return;
            }
            if !self.state.is_idle() {
                tracing::debug!(
                    session_id = %self.context.session_id,
                    turn_id = %turn_id,
                    phase = self.state.phase().as_str(),
                    queued = self.pending.len() + 1,
                    "Queueing submission until idle"
                );
                self.pending.push_back(event);
                self.publish_snapshot();
                return;
            }
        }

        if matches!(event, Event::Reset) {
            if !self.pending.is_empty() {
                tracing::info!(dropped = self.pending.len(), "Reset drops queued submissions");
            }
            self.pending.clear();
        }

        self.apply(event);

        // Start queued submissions in arrival order whenever we are back to idle
        while self.state.is_idle() {
            let Some(next) = self.pending.pop_front() else {
                break;
            };
            self.apply(next);
        }
    }

    fn apply(&mut self, event: Event) {
        let is_timer = event.is_timer();
        let result = match transition(&self.state, &self.memory, &self.context, event) {
            Ok(r) => r,
            Err(e @ TransitionError::StaleTimer { .. }) => {
                tracing::debug!(session_id = %self.context.session_id, error = %e, "Dropping timer");
                return;
            }
            Err(e) => {
                tracing::warn!(session_id = %self.context.session_id, error = %e, timer = is_timer, "Transition rejected");
                let _ = self.broadcast_tx.send(SimulatorEvent::Error {
                    message: e.to_string(),
                });
                return;
            }
        };

        let old_phase = self.state.phase();
        self.state = result.new_state;
        if old_phase != self.state.phase() {
            tracing::debug!(
                session_id = %self.context.session_id,
                turn_id = ?self.state.turn_id(),
                from = old_phase.as_str(),
                to = self.state.phase().as_str(),
                "Phase change"
            );
        }

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendTurn { turn } => {
                self.transcript.push(turn);
            }
            Effect::ClearTranscript => {
                self.transcript.clear();
            }
            Effect::RememberTopic { topic } => {
                self.memory.last_topic = topic;
            }
            Effect::ScheduleSettle {
                delay,
                turn_id,
                phase,
            } => {
                tracing::debug!(
                    turn_id = %turn_id,
                    phase = phase.as_str(),
                    delay_ms = %delay.as_millis(),
                    "Scheduling settle timer"
                );
                let Some(tx) = self.event_tx.upgrade() else {
                    tracing::debug!("All handles dropped, not scheduling");
                    return;
                };
                self.scheduler.schedule(
                    delay,
                    Event::PhaseSettled { turn_id, phase },
                    tx,
                    self.timer_cancel.clone(),
                );
            }
            Effect::CancelTimers => {
                self.timer_cancel.cancel();
                self.timer_cancel = CancellationToken::new();
            }
            Effect::NotifySnapshot => {
                self.publish_snapshot();
            }
            Effect::NotifyTurnSettled {
                turn_id,
                rule,
                topic,
            } => {
                tracing::info!(
                    session_id = %self.context.session_id,
                    turn_id = %turn_id,
                    rule = %rule,
                    topic = topic.map(TopicTag::as_str),
                    transcript_len = self.transcript.len(),
                    "Turn settled"
                );
                let _ = self
                    .broadcast_tx
                    .send(SimulatorEvent::TurnSettled { turn_id, rule, topic });
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            transcript: self.transcript.clone(),
            phase: self.state.phase(),
            last_topic: self.memory.last_topic,
            queued: self.pending.len(),
        }
    }

    fn publish_snapshot(&self) {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_replace(snapshot.clone());
        // No subscribers is fine
        let _ = self.broadcast_tx.send(SimulatorEvent::Snapshot(snapshot));
    }
}
