//! Events that drive the game

use crate::store::SaveSnapshot;
use serde::{Deserialize, Serialize};

/// Companion interaction offered while playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Give a gift
    Favor,
    /// Call the companion to the player's chambers
    Summon,
    /// Grant the companion an heir
    Imprint,
}

/// Which launch an initialized gateway is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    New,
    Resume,
}

/// Timed phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// End of the warp sequence
    Warp,
    /// End of the pause after the draw stops
    Reveal,
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Player events
    StartNew {
        credential: String,
    },
    StopDraw,
    ConfirmTalent,
    ToggleCompanion {
        id: String,
    },
    BeginPlaythrough,
    PlayerMessage {
        text: String,
    },
    Interact {
        companion_id: String,
        action: Action,
    },
    SetPortrait {
        companion_id: String,
        /// Image data; empty clears the override
        image: String,
    },
    Resume {
        credential: String,
    },
    Reset,

    // Runtime events, tagged with the epoch they were issued in
    GatewayReady {
        epoch: u64,
        launch: Launch,
    },
    GatewayFailed {
        epoch: u64,
        message: String,
    },
    TimerFired {
        epoch: u64,
        timer: Timer,
    },
    DrawTick {
        epoch: u64,
    },
    DrawResolved {
        epoch: u64,
        index: usize,
    },
    SnapshotLoaded {
        epoch: u64,
        snapshot: Option<Box<SaveSnapshot>>,
    },
    SessionOpened {
        epoch: u64,
        narration: String,
    },
    SessionOpenFailed {
        epoch: u64,
        message: String,
    },
    SessionResumed {
        epoch: u64,
    },
    SessionResumeFailed {
        epoch: u64,
        message: String,
    },
    NarrationReceived {
        epoch: u64,
        text: String,
    },
    NarrationInterrupted {
        epoch: u64,
        notice: String,
    },
}

impl Event {
    /// Epoch of a runtime event; `None` for player events
    pub fn epoch(&self) -> Option<u64> {
        match self {
            Event::GatewayReady { epoch, .. }
            | Event::GatewayFailed { epoch, .. }
            | Event::TimerFired { epoch, .. }
            | Event::DrawTick { epoch }
            | Event::DrawResolved { epoch, .. }
            | Event::SnapshotLoaded { epoch, .. }
            | Event::SessionOpened { epoch, .. }
            | Event::SessionOpenFailed { epoch, .. }
            | Event::SessionResumed { epoch }
            | Event::SessionResumeFailed { epoch, .. }
            | Event::NarrationReceived { epoch, .. }
            | Event::NarrationInterrupted { epoch, .. } => Some(*epoch),
            _ => None,
        }
    }
}
