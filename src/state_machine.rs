//! Dialogue simulator state machine
//!
//! Elm Architecture: a pure `transition` turns (state, event) into a new
//! state plus effects, and the runtime executes the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{ConversationMemory, ConversationTurn, DemoContext, DemoState, Phase, Speaker};
pub use transition::{transition, TransitionError};
