//! Pure state transition function
//!
//! `transition` performs no I/O: given the same state, memory, context and
//! event it always yields the same new state and effects.

use super::event::is_blank;
use super::state::{ConversationMemory, DemoContext, DemoState, Phase};
use super::{Effect, Event};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: DemoState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: DemoState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Simulator is busy ({0}), wait for the current turn to finish")]
    Busy(&'static str),
    #[error("Ignoring stale {phase} timer for turn {turn_id}")]
    StaleTimer { turn_id: String, phase: &'static str },
}

/// Pure transition function
pub fn transition(
    state: &DemoState,
    memory: &ConversationMemory,
    context: &DemoContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // User input
        // ============================================================

        // Blank input never changes anything, busy or not
        (_, Event::UserSubmit { text, .. }) if is_blank(&text) => {
            Ok(TransitionResult::new(state.clone()))
        }

        // Idle + UserSubmit -> Searching
        (DemoState::Idle, Event::UserSubmit { text, turn_id }) => {
            let effects = [
                Effect::append_user(text.clone()),
                Effect::schedule_settle(context.search_delay, turn_id.clone(), Phase::Searching),
                Effect::NotifySnapshot,
            ];
            Ok(TransitionResult::new(DemoState::Searching { turn_id, text }).with_effects(effects))
        }

        // Busy + UserSubmit -> Reject (the runtime queues instead of sending these)
        (DemoState::Searching { .. } | DemoState::Typing { .. }, Event::UserSubmit { .. }) => {
            Err(TransitionError::Busy(state.phase().as_str()))
        }

        // Any + Reset -> Idle with everything cleared
        (_, Event::Reset) => Ok(TransitionResult::new(DemoState::Idle).with_effects([
            Effect::CancelTimers,
            Effect::ClearTranscript,
            Effect::RememberTopic { topic: None },
            Effect::NotifySnapshot,
        ])),

        // ============================================================
        // Settle timers
        // ============================================================

        // Searching settled -> Typing
        (
            DemoState::Searching { turn_id, text },
            Event::PhaseSettled {
                turn_id: settled,
                phase: Phase::Searching,
            },
        ) if *turn_id == settled => Ok(TransitionResult::new(DemoState::Typing {
            turn_id: turn_id.clone(),
            text: text.clone(),
        })
        .with_effect(Effect::schedule_settle(
            context.typing_delay,
            turn_id.clone(),
            Phase::Typing,
        ))
        .with_effect(Effect::NotifySnapshot)),

        // Typing settled -> classify, answer, remember, Idle
        (
            DemoState::Typing { turn_id, text },
            Event::PhaseSettled {
                turn_id: settled,
                phase: Phase::Typing,
            },
        ) if *turn_id == settled => {
            let classification = context.rules.classify(text, memory.last_topic);
            let entry = context.responses.resolve(classification.response_key);
            Ok(TransitionResult::new(DemoState::Idle).with_effects([
                Effect::append_bot(entry.text.clone(), entry.sources.clone()),
                Effect::RememberTopic {
                    topic: classification.topic,
                },
                Effect::NotifySnapshot,
                Effect::NotifyTurnSettled {
                    turn_id: turn_id.clone(),
                    rule: classification.rule_name().to_string(),
                    topic: classification.topic,
                },
            ]))
        }

        // Timer for a turn that is no longer in flight (e.g. after reset)
        (_, Event::PhaseSettled { turn_id, phase }) => Err(TransitionError::StaleTimer {
            turn_id,
            phase: phase.as_str(),
        }),
    }
}
