//! Runtime for executing the game
//!
//! The runtime owns the game state, feeds events through the pure
//! transition function and executes the resulting effects. Gateway calls and
//! timers run as background tasks and report back through the event channel.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::GameRuntime;
pub use traits::*;

use crate::gateway::ConversationGateway;
use crate::state_machine::{Event, GameContext, GameState, Notice};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Events sent to the presentation layer
#[derive(Debug, Clone)]
pub enum UiEvent {
    StateChanged { state: Arc<GameState> },
    /// The game is back at the title screen; `can_resume` is read from the store
    TitleScreen { can_resume: bool },
    Notice(Notice),
    /// A player event was refused; the state is unchanged
    Rejected { message: String },
}

/// Handle to interact with a running game
#[derive(Clone)]
pub struct GameHandle {
    pub event_tx: mpsc::Sender<Event>,
    pub broadcast_tx: broadcast::Sender<UiEvent>,
    /// A saved game existed when the runtime started; later answers
    /// arrive as [`UiEvent::TitleScreen`]
    pub can_resume: bool,
}

impl GameHandle {
    /// Queue a player event
    pub async fn dispatch(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.event_tx.send(event).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.broadcast_tx.subscribe()
    }
}

/// Spawn a runtime for `context` and return its handle
pub fn spawn_game<S: SnapshotStore + 'static>(
    context: GameContext,
    store: Arc<S>,
    gateway: Arc<ConversationGateway>,
) -> GameHandle {
    let (event_tx, event_rx) = mpsc::channel(64);
    let (broadcast_tx, _) = broadcast::channel(256);

    let runtime = GameRuntime::new(
        context,
        store,
        gateway,
        event_rx,
        event_tx.clone(),
        broadcast_tx.clone(),
    );
    let can_resume = runtime.can_resume();
    tokio::spawn(runtime.run());

    GameHandle {
        event_tx,
        broadcast_tx,
        can_resume,
    }
}
