//! Core game state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

pub mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::{Effect, Notice, NoticeKind};
pub use event::{Action, Event};
pub use state::{GameContext, GamePhase, GameState};
pub use transition::{transition, TransitionError};
