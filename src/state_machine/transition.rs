//! Pure state transition function

use super::effect::{Directive, Effect};
use super::event::{Action, Event, Launch, Timer};
use super::state::{GameContext, GamePhase, GameState, PendingTurn, Playthrough};
use crate::model::{ChatMessage, RelationshipStatus};
use thiserror::Error;

pub const FAVOR_GAIN: i64 = 5;
pub const SUMMON_GAIN: i64 = 10;
pub const IMPRINT_GAIN: i64 = 20;

/// Notice when a saved game cannot be restored
pub const INCOMPATIBLE_SAVE: &str = "The save data is incompatible. Please start anew.";

/// Notice when the opening scene could not be fetched
pub const CONNECTION_FAILED: &str = "Failed to connect to the plane. Please check your key.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: GameState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: GameState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("An API key is required")]
    MissingCredential,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Still waiting for the narrator")]
    AwaitingReply,
    #[error("Select at least one companion")]
    NoCompanionSelected,
    #[error("Unknown companion: {0}")]
    UnknownCompanion(String),
    #[error("The talent has already been drawn")]
    OutfitAlreadyBound,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same state and effects; all
/// I/O is described by the returned effects. Runtime events whose epoch or
/// phase no longer matches are discarded without error.
#[allow(clippy::too_many_lines)]
pub fn transition(
    state: &GameState,
    context: &GameContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    if let Some(epoch) = event.epoch() {
        if epoch != state.epoch {
            return Ok(discard(state, "stale epoch"));
        }
    }

    let mut next = state.clone();
    let epoch = state.epoch;

    match (&state.phase, event) {
        // ============================================================
        // Launch: new game or resume
        // ============================================================
        (GamePhase::Intro { resuming: false }, Event::StartNew { credential }) => {
            let credential = require_credential(&credential)?;
            next.epoch += 1;
            next.playthrough = Playthrough::default();
            let epoch = next.epoch;
            Ok(
                TransitionResult::new(next).with_effect(Effect::InitializeGateway {
                    credential,
                    launch: Launch::New,
                    epoch,
                }),
            )
        }

        (GamePhase::Intro { resuming: false }, Event::Resume { credential }) => {
            let credential = require_credential(&credential)?;
            next.epoch += 1;
            next.playthrough = Playthrough::default();
            next.phase = GamePhase::Intro { resuming: true };
            let epoch = next.epoch;
            Ok(
                TransitionResult::new(next).with_effect(Effect::InitializeGateway {
                    credential,
                    launch: Launch::Resume,
                    epoch,
                }),
            )
        }

        (phase, Event::StartNew { .. } | Event::Resume { .. }) => Err(
            TransitionError::InvalidTransition(format!("cannot launch a game from {phase}")),
        ),

        (
            GamePhase::Intro { resuming: false },
            Event::GatewayReady {
                launch: Launch::New,
                ..
            },
        ) => {
            next.phase = GamePhase::Warp;
            // Starting anew forfeits the old save before anything else happens
            Ok(TransitionResult::new(next)
                .with_effect(Effect::ClearSnapshot)
                .with_effect(Effect::ScheduleTimer {
                    timer: Timer::Warp,
                    delay: context.timings.warp,
                    epoch,
                }))
        }

        (
            GamePhase::Intro { resuming: true },
            Event::GatewayReady {
                launch: Launch::Resume,
                ..
            },
        ) => Ok(TransitionResult::new(next).with_effect(Effect::LoadSnapshot { epoch })),

        (GamePhase::Intro { resuming }, Event::GatewayFailed { message, .. }) => {
            let notice = if *resuming {
                INCOMPATIBLE_SAVE.to_string()
            } else {
                format!("Could not set up the narrator: {message}")
            };
            next.phase = GamePhase::Intro { resuming: false };
            next.playthrough = Playthrough::default();
            Ok(TransitionResult::new(next).with_effect(Effect::blocking(notice)))
        }

        (GamePhase::Intro { resuming: true }, Event::SnapshotLoaded { snapshot, .. }) => {
            match snapshot.filter(|s| !s.selected_leads.is_empty() && !s.messages.is_empty()) {
                Some(snapshot) => {
                    next.playthrough = Playthrough::from_snapshot(*snapshot);
                    Ok(TransitionResult::new(next).with_effect(Effect::ResumeSession { epoch }))
                }
                None => {
                    next.phase = GamePhase::Intro { resuming: false };
                    Ok(TransitionResult::new(next).with_effect(Effect::blocking(INCOMPATIBLE_SAVE)))
                }
            }
        }

        (GamePhase::Intro { resuming: true }, Event::SessionResumed { .. }) => {
            next.phase = GamePhase::Playing { pending: None };
            Ok(TransitionResult::new(next))
        }

        (GamePhase::Intro { resuming: true }, Event::SessionResumeFailed { .. }) => {
            next.phase = GamePhase::Intro { resuming: false };
            next.playthrough = Playthrough::default();
            Ok(TransitionResult::new(next)
                .with_effect(Effect::TearDownSession)
                .with_effect(Effect::blocking(INCOMPATIBLE_SAVE)))
        }

        // ============================================================
        // Warp and talent draw
        // ============================================================
        (
            GamePhase::Warp,
            Event::TimerFired {
                timer: Timer::Warp,
                ..
            },
        ) => {
            next.phase = GamePhase::TalentDraw {
                index: 0,
                rolling: true,
            };
            Ok(
                TransitionResult::new(next).with_effect(Effect::StartDrawTicker {
                    interval: context.timings.draw_tick,
                    epoch,
                }),
            )
        }

        (
            GamePhase::TalentDraw {
                index,
                rolling: true,
            },
            Event::DrawTick { .. },
        ) => {
            let count = context.catalog.outfits.len().max(1);
            next.phase = GamePhase::TalentDraw {
                index: (index + 1) % count,
                rolling: true,
            };
            Ok(TransitionResult::new(next))
        }

        (
            GamePhase::TalentDraw {
                index,
                rolling: true,
            },
            Event::StopDraw,
        ) => {
            next.phase = GamePhase::TalentDraw {
                index: *index,
                rolling: false,
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::StopDrawTicker)
                .with_effect(Effect::RollOutfit { epoch }))
        }

        (_, Event::DrawResolved { .. }) if state.playthrough.outfit.is_some() => {
            Err(TransitionError::OutfitAlreadyBound)
        }

        (GamePhase::TalentDraw { rolling: false, .. }, Event::DrawResolved { index, .. }) => {
            let outfit = context.catalog.outfits.get(index).ok_or_else(|| {
                TransitionError::InvalidTransition(format!("no outfit at index {index}"))
            })?;
            tracing::info!(outfit = %outfit.id, "Talent drawn");
            next.playthrough.outfit = Some(outfit.clone());
            next.phase = GamePhase::TalentDraw {
                index,
                rolling: false,
            };
            Ok(
                TransitionResult::new(next).with_effect(Effect::ScheduleTimer {
                    timer: Timer::Reveal,
                    delay: context.timings.reveal,
                    epoch,
                }),
            )
        }

        (
            GamePhase::TalentDraw { rolling: false, .. },
            Event::TimerFired {
                timer: Timer::Reveal,
                ..
            },
        ) if state.playthrough.outfit.is_some() => {
            next.phase = GamePhase::TalentReveal;
            Ok(TransitionResult::new(next))
        }

        (GamePhase::TalentReveal, Event::ConfirmTalent) => {
            next.phase = GamePhase::CompanionSelect;
            Ok(TransitionResult::new(next))
        }

        // ============================================================
        // Companion selection
        // ============================================================
        (GamePhase::CompanionSelect, Event::ToggleCompanion { id }) => {
            let companion = context
                .catalog
                .companion(&id)
                .ok_or_else(|| TransitionError::UnknownCompanion(id.clone()))?;
            let selection = &mut next.playthrough.companions;
            if let Some(pos) = selection.iter().position(|c| c.id() == id) {
                selection.remove(pos);
            } else {
                selection.push(companion.clone());
            }
            Ok(TransitionResult::new(next))
        }

        // Selection is frozen outside companion-select
        (_, Event::ToggleCompanion { .. }) => Ok(TransitionResult::new(next)),

        (GamePhase::CompanionSelect, Event::BeginPlaythrough) => {
            if next.playthrough.companions.is_empty() {
                return Err(TransitionError::NoCompanionSelected);
            }
            if next.playthrough.outfit.is_none() {
                return Err(TransitionError::InvalidTransition(
                    "no talent has been drawn".to_string(),
                ));
            }
            next.playthrough.messages.clear();
            next.phase = GamePhase::Playing {
                pending: Some(PendingTurn::Opening),
            };
            Ok(TransitionResult::new(next).with_effect(Effect::OpenSession { epoch }))
        }

        (
            GamePhase::CompanionSelect | GamePhase::Playing { .. },
            Event::SetPortrait {
                companion_id,
                image,
            },
        ) => {
            if context.catalog.companion(&companion_id).is_none() {
                return Err(TransitionError::UnknownCompanion(companion_id));
            }
            if image.trim().is_empty() {
                next.playthrough.custom_images.remove(&companion_id);
            } else {
                next.playthrough.custom_images.insert(companion_id, image);
            }
            let playing = next.phase.is_playing();
            let result = TransitionResult::new(next);
            Ok(if playing {
                result.with_effect(Effect::PersistSnapshot)
            } else {
                result
            })
        }

        // ============================================================
        // Play
        // ============================================================
        (
            GamePhase::Playing {
                pending: Some(PendingTurn::Opening),
            },
            Event::SessionOpened { narration, .. },
        ) => {
            next.playthrough.messages = vec![ChatMessage::narrator(narration)];
            next.phase = GamePhase::Playing { pending: None };
            Ok(TransitionResult::new(next).with_effect(Effect::PersistSnapshot))
        }

        (
            GamePhase::Playing {
                pending: Some(PendingTurn::Opening),
            },
            Event::SessionOpenFailed { .. },
        ) => {
            next.phase = GamePhase::Intro { resuming: false };
            next.playthrough = Playthrough::default();
            Ok(TransitionResult::new(next)
                .with_effect(Effect::TearDownSession)
                .with_effect(Effect::blocking(CONNECTION_FAILED)))
        }

        (GamePhase::Playing { pending: None }, Event::PlayerMessage { text }) => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyMessage);
            }
            Ok(begin_turn(next, text))
        }

        (
            GamePhase::Playing { pending: None },
            Event::Interact {
                companion_id,
                action,
            },
        ) => interact(next, &companion_id, action),

        (
            GamePhase::Playing { pending: Some(_) },
            Event::PlayerMessage { .. } | Event::Interact { .. },
        ) => Err(TransitionError::AwaitingReply),

        (
            GamePhase::Playing {
                pending: Some(PendingTurn::Narration { .. }),
            },
            Event::NarrationReceived { text, .. },
        ) => {
            next.playthrough.messages.push(ChatMessage::narrator(text));
            next.phase = GamePhase::Playing { pending: None };
            Ok(TransitionResult::new(next).with_effect(Effect::PersistSnapshot))
        }

        (
            GamePhase::Playing {
                pending: Some(PendingTurn::Narration { rollback_len }),
            },
            Event::NarrationInterrupted { notice, .. },
        ) => {
            // The turn never happened: drop its message, keep the stat changes
            next.playthrough.messages.truncate(*rollback_len);
            next.phase = GamePhase::Playing { pending: None };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::PersistSnapshot)
                .with_effect(Effect::toast(notice)))
        }

        // ============================================================
        // Reset
        // ============================================================
        (_, Event::Reset) => {
            let next = GameState {
                epoch: state.epoch + 1,
                ..GameState::default()
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::CancelTimers)
                .with_effect(Effect::TearDownSession))
        }

        // ============================================================
        // Everything else
        // ============================================================
        (phase, event) => {
            if event.epoch().is_some() {
                Ok(discard(state, "phase no longer matches"))
            } else {
                Err(TransitionError::InvalidTransition(format!(
                    "{event:?} is not allowed in {phase}"
                )))
            }
        }
    }
}

fn require_credential(credential: &str) -> Result<String, TransitionError> {
    let credential = credential.trim();
    if credential.is_empty() {
        Err(TransitionError::MissingCredential)
    } else {
        Ok(credential.to_string())
    }
}

fn discard(state: &GameState, reason: &'static str) -> TransitionResult {
    tracing::debug!(phase = %state.phase, epoch = state.epoch, reason, "Discarding event");
    TransitionResult::new(state.clone())
}

/// Append a player-role message and request the narrator's answer
fn begin_turn(mut next: GameState, text: String) -> TransitionResult {
    let rollback_len = next.playthrough.messages.len();
    next.playthrough.messages.push(ChatMessage::player(text.clone()));
    next.phase = GamePhase::Playing {
        pending: Some(PendingTurn::Narration { rollback_len }),
    };
    let epoch = next.epoch;
    TransitionResult::new(next)
        .with_effect(Effect::PersistSnapshot)
        .with_effect(Effect::RequestNarration { epoch, text })
}

/// Apply an interaction's stat change, then narrate it through a directive
fn interact(
    mut next: GameState,
    companion_id: &str,
    action: Action,
) -> Result<TransitionResult, TransitionError> {
    let companion = next
        .playthrough
        .companion_mut(companion_id)
        .ok_or_else(|| TransitionError::UnknownCompanion(companion_id.to_string()))?;
    let stats = &mut companion.stats;

    let directive = match action {
        Action::Favor => {
            stats.favorability = stats.favorability.raise(FAVOR_GAIN);
            Directive::Favor
        }
        Action::Summon => {
            if stats.relationship != RelationshipStatus::RoyalConsort {
                stats.relationship = RelationshipStatus::Consort;
            }
            stats.favorability = stats.favorability.raise(SUMMON_GAIN);
            Directive::Summon
        }
        Action::Imprint => {
            let before = stats.pregnancy;
            stats.pregnancy = before.raise(IMPRINT_GAIN);
            if before.is_zero() && !stats.pregnancy.is_zero() {
                Directive::ImprintAnnounced
            } else {
                Directive::ImprintProgressed
            }
        }
    };

    tracing::debug!(companion = %companion_id, ?action, stats = ?companion.stats, "Interaction applied");
    let text = directive.text(companion.name());
    Ok(begin_turn(next, text))
}
