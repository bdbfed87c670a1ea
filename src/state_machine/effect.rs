//! Effects produced by state transitions

use super::state::{ConversationTurn, Phase};
use crate::classifier::TopicTag;
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a turn to the transcript
    AppendTurn { turn: ConversationTurn },

    /// Drop every transcript entry
    ClearTranscript,

    /// Overwrite the topic memory
    RememberTopic { topic: Option<TopicTag> },

    /// Fire `PhaseSettled` for this turn after `delay`
    ScheduleSettle {
        delay: Duration,
        turn_id: String,
        phase: Phase,
    },

    /// Disarm every pending settle timer
    CancelTimers,

    /// Publish a fresh snapshot to subscribers
    NotifySnapshot,

    /// Tell subscribers a turn finished and which rule answered it
    NotifyTurnSettled {
        turn_id: String,
        rule: String,
        topic: Option<TopicTag>,
    },
}

impl Effect {
    pub fn append_user(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            turn: ConversationTurn::user(text),
        }
    }

    pub fn append_bot(text: impl Into<String>, sources: Vec<String>) -> Self {
        Effect::AppendTurn {
            turn: ConversationTurn::bot(text, sources),
        }
    }

    pub fn schedule_settle(delay: Duration, turn_id: impl Into<String>, phase: Phase) -> Self {
        Effect::ScheduleSettle {
            delay,
            turn_id: turn_id.into(),
            phase,
        }
    }
}
