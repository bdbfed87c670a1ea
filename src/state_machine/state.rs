//! Simulator state types

use crate::classifier::{RuleTable, TopicTag};
use crate::responses::ResponseTable;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(800);
pub const DEFAULT_TYPING_DELAY: Duration = Duration::from_millis(1000);

// ============================================================================
// Transcript
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Bot,
}

/// One entry of the append-only transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    /// Citation labels; always empty for user turns
    pub sources: Vec<String>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            sources: vec![],
        }
    }

    pub fn bot(text: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            speaker: Speaker::Bot,
            text: text.into(),
            sources,
        }
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Short-term topic memory consulted by the next classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMemory {
    pub last_topic: Option<TopicTag>,
}

// ============================================================================
// Phase / State
// ============================================================================

/// Externally visible progress phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Searching,
    Typing,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Searching => "searching",
            Phase::Typing => "typing",
        }
    }

    /// Progress label a shell shows while the phase is active
    pub fn indicator(self) -> Option<&'static str> {
        match self {
            Phase::Idle => None,
            Phase::Searching => Some("Searching articles..."),
            Phase::Typing => Some("Typing..."),
        }
    }
}

/// Simulator state; busy variants carry the turn in flight
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DemoState {
    /// Ready for input, nothing in flight
    #[default]
    Idle,

    /// User turn recorded, simulated retrieval running
    Searching { turn_id: String, text: String },

    /// Simulated generation running
    Typing { turn_id: String, text: String },
}

impl DemoState {
    pub fn phase(&self) -> Phase {
        match self {
            DemoState::Idle => Phase::Idle,
            DemoState::Searching { .. } => Phase::Searching,
            DemoState::Typing { .. } => Phase::Typing,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, DemoState::Idle)
    }

    /// Id of the turn in flight, if any
    pub fn turn_id(&self) -> Option<&str> {
        match self {
            DemoState::Idle => None,
            DemoState::Searching { turn_id, .. } | DemoState::Typing { turn_id, .. } => {
                Some(turn_id)
            }
        }
    }
}

// ============================================================================
// Context
// ============================================================================

/// Immutable per-session configuration passed to every transition
#[derive(Debug, Clone)]
pub struct DemoContext {
    pub session_id: String,
    pub rules: Arc<RuleTable>,
    pub responses: Arc<ResponseTable>,
    pub search_delay: Duration,
    pub typing_delay: Duration,
}

impl DemoContext {
    /// Context with the built-in catalog and reference delays
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            rules: Arc::new(RuleTable::builtin()),
            responses: Arc::new(ResponseTable::builtin()),
            search_delay: DEFAULT_SEARCH_DELAY,
            typing_delay: DEFAULT_TYPING_DELAY,
        }
    }

    pub fn with_tables(mut self, rules: RuleTable, responses: ResponseTable) -> Self {
        self.rules = Arc::new(rules);
        self.responses = Arc::new(responses);
        self
    }

    pub fn with_delays(mut self, search_delay: Duration, typing_delay: Duration) -> Self {
        self.search_delay = search_delay;
        self.typing_delay = typing_delay;
        self
    }
}
