//! Effects produced by state transitions

use super::event::{Launch, Timer};
use crate::model::DIRECTIVE_PREFIX;
use serde::Serialize;
use std::time::Duration;

/// How prominently a notice should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Must be acknowledged; the flow was aborted
    Blocking,
    /// Transient; play continues
    Toast,
}

/// User-facing message emitted by a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn blocking(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Blocking,
            message: message.into(),
        }
    }

    pub fn toast(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Toast,
            message: message.into(),
        }
    }
}

/// System-authored instruction sent as a player turn after an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Favor,
    Summon,
    /// First imprint of a companion
    ImprintAnnounced,
    /// Any later imprint
    ImprintProgressed,
}

impl Directive {
    /// Full message text, prefix included
    pub fn text(self, name: &str) -> String {
        let body = match self {
            Directive::Favor => format!(
                "The player bestowed a precious gift on {name}. What is his expression right now?"
            ),
            Directive::Summon => format!(
                "The player chose {name} to attend her tonight. Describe the charged night; he may \
                 tremble from excitement or not dare to touch her."
            ),
            Directive::ImprintAnnounced => format!(
                "The player granted {name} an heir. How does he react on learning he carries the \
                 pureblood line? (Ecstasy, tears, even disbelief.)"
            ),
            Directive::ImprintProgressed => {
                format!("{name}'s gestation has advanced. Does he grow even more clingy?")
            }
        };
        format!("{DIRECTIVE_PREFIX} {body}")
    }
}

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Configure the gateway client; answered by `GatewayReady` or `GatewayFailed`
    InitializeGateway {
        credential: String,
        launch: Launch,
        epoch: u64,
    },

    /// Remove the persisted snapshot
    ClearSnapshot,

    /// Read the persisted snapshot; answered by `SnapshotLoaded`
    LoadSnapshot { epoch: u64 },

    /// Write the current playthrough through to the save slot
    PersistSnapshot,

    ScheduleTimer {
        timer: Timer,
        delay: Duration,
        epoch: u64,
    },

    /// Emit `DrawTick` every `interval` until stopped
    StartDrawTicker { interval: Duration, epoch: u64 },

    StopDrawTicker,

    /// Cancel every pending timer and the draw ticker
    CancelTimers,

    /// Pick an outfit uniformly at random; answered by `DrawResolved`
    RollOutfit { epoch: u64 },

    /// Start a fresh session and fetch the opening scene
    OpenSession { epoch: u64 },

    /// Rebuild the session from the current log without a network call
    ResumeSession { epoch: u64 },

    /// Send one turn; answered by `NarrationReceived` or `NarrationInterrupted`
    RequestNarration { epoch: u64, text: String },

    TearDownSession,

    Notify(Notice),
}

impl Effect {
    pub fn blocking(message: impl Into<String>) -> Self {
        Effect::Notify(Notice::blocking(message))
    }

    pub fn toast(message: impl Into<String>) -> Self {
        Effect::Notify(Notice::toast(message))
    }
}
