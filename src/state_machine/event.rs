//! Events that can occur in a demo session

use super::state::Phase;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    UserSubmit {
        text: String,
        turn_id: String,
    },
    Reset,

    // Timer events
    /// The settle interval of `phase` elapsed for `turn_id`
    PhaseSettled {
        turn_id: String,
        phase: Phase,
    },
}

impl Event {
    pub fn is_timer(&self) -> bool {
        matches!(self, Event::PhaseSettled { .. })
    }
}

/// Blank (empty or whitespace-only) input is ignored everywhere.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
