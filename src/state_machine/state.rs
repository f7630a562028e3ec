//! Game state types

use crate::catalog::Catalog;
use crate::config::GameTimings;
use crate::model::{ChatMessage, Companion, Outfit};
use crate::store::SaveSnapshot;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Characters of the latest message quoted by [`GameState::story_excerpt`]
const EXCERPT_CHARS: usize = 100;

/// Model turn the playthrough is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingTurn {
    /// The opening scene of a fresh session
    Opening,
    /// A reply to a player or directive message
    Narration {
        /// Log length before the turn's message was appended
        rollback_len: usize,
    },
}

/// Phase of the game, with phase-local sub-state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GamePhase {
    /// Title screen; `resuming` while a saved game is being restored
    Intro { resuming: bool },
    /// Timed transition into the draw
    Warp,
    /// Talent draw. `index` cycles through the outfit catalog while rolling.
    TalentDraw { index: usize, rolling: bool },
    TalentReveal,
    CompanionSelect,
    Playing { pending: Option<PendingTurn> },
    /// Reserved; no transition enters it
    #[allow(dead_code)]
    Victory,
}

impl GamePhase {
    pub fn name(&self) -> &'static str {
        match self {
            GamePhase::Intro { .. } => "intro",
            GamePhase::Warp => "warp",
            GamePhase::TalentDraw { .. } => "talent_draw",
            GamePhase::TalentReveal => "talent_reveal",
            GamePhase::CompanionSelect => "companion_select",
            GamePhase::Playing { .. } => "playing",
            GamePhase::Victory => "victory",
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, GamePhase::Playing { .. })
    }
}

impl Default for GamePhase {
    fn default() -> Self {
        GamePhase::Intro { resuming: false }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Choices and log of the current playthrough
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playthrough {
    /// Bound once when the draw resolves
    pub outfit: Option<Outfit>,
    /// Selected companions, in selection order
    pub companions: Vec<Companion>,
    pub messages: Vec<ChatMessage>,
    /// Companion id -> portrait override
    pub custom_images: BTreeMap<String, String>,
}

impl Playthrough {
    pub fn from_snapshot(snapshot: SaveSnapshot) -> Self {
        Self {
            outfit: Some(snapshot.selected_outfit),
            companions: snapshot.selected_leads,
            messages: snapshot.messages,
            custom_images: snapshot.custom_images,
        }
    }

    pub fn companion(&self, id: &str) -> Option<&Companion> {
        self.companions.iter().find(|c| c.id() == id)
    }

    pub fn companion_mut(&mut self, id: &str) -> Option<&mut Companion> {
        self.companions.iter_mut().find(|c| c.id() == id)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.companion(id).is_some()
    }
}

/// Complete game state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameState {
    pub phase: GamePhase,
    pub playthrough: Playthrough,
    /// Incremented whenever a playthrough starts, resumes or resets.
    /// Timers and replies carry the epoch they were issued in.
    pub epoch: u64,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot to persist, if the playthrough is complete enough to resume
    pub fn snapshot(&self) -> Option<SaveSnapshot> {
        let p = &self.playthrough;
        let outfit = p.outfit.as_ref()?;
        if !self.phase.is_playing() || p.companions.is_empty() || p.messages.is_empty() {
            return None;
        }
        Some(SaveSnapshot {
            selected_outfit: outfit.clone(),
            selected_leads: p.companions.clone(),
            messages: p.messages.clone(),
            custom_images: p.custom_images.clone(),
        })
    }

    /// Portrait to show for `companion`: the override if set, else the catalog image
    pub fn portrait_for<'a>(&'a self, companion: &'a Companion) -> &'a str {
        self.playthrough
            .custom_images
            .get(companion.id())
            .map_or(companion.profile.image.as_str(), String::as_str)
    }

    /// Short shareable summary: outfit name and the start of the latest message
    pub fn story_excerpt(&self) -> Option<String> {
        let outfit = self.playthrough.outfit.as_ref()?;
        let latest = self.playthrough.messages.last()?;
        let mut quote: String = latest.text.chars().take(EXCERPT_CHARS).collect();
        if latest.text.chars().count() > EXCERPT_CHARS {
            quote.push_str("...");
        }
        Some(format!(
            "My story in Queen's Wardrobe: wearing [{}], \"{}\"",
            outfit.name, quote
        ))
    }
}

/// Static context for transitions
#[derive(Debug, Clone)]
pub struct GameContext {
    pub catalog: Arc<Catalog>,
    pub timings: GameTimings,
}

impl GameContext {
    pub fn new(catalog: Arc<Catalog>, timings: GameTimings) -> Self {
        Self { catalog, timings }
    }
}
