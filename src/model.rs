//! Game data types shared by the catalog, the save slot and the state machine

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix marking a player-role message as a system-authored directive
pub const DIRECTIVE_PREFIX: &str = "[System directive]:";

// ============================================================================
// Percent
// ============================================================================

/// A stat value that always lies in `[0, 100]`
///
/// Every constructor and arithmetic helper clamps, and so does
/// deserialization, so a hand-edited or legacy save cannot smuggle an
/// out-of-range value into a playthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Percent(u8);

impl Percent {
    pub const ZERO: Percent = Percent(0);
    pub const MAX: Percent = Percent(100);

    pub fn new(value: i64) -> Self {
        // Clamped into 0..=100 first, so the cast cannot truncate
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Percent(value.clamp(0, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Add `delta` points, saturating at the bounds
    #[must_use]
    pub fn raise(self, delta: i64) -> Self {
        Percent::new(i64::from(self.0) + delta)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<i64> for Percent {
    fn from(value: i64) -> Self {
        Percent::new(value)
    }
}

impl From<Percent> for u8 {
    fn from(value: Percent) -> Self {
        value.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// ============================================================================
// Catalog entries
// ============================================================================

/// The story world a playthrough takes place in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub description: String,
    pub world_setting: String,
    pub intro_text: String,
    pub goal: String,
}

/// Cosmetic talent drawn once per playthrough
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outfit {
    pub id: String,
    pub name: String,
    pub description: String,
    pub power_name: String,
    pub power_effect: String,
    pub image: String,
    pub style: String,
}

/// How a companion currently relates to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Stranger,
    Hostile,
    Consort,
    RoyalConsort,
}

impl RelationshipStatus {
    pub fn label(self) -> &'static str {
        match self {
            RelationshipStatus::Stranger => "stranger",
            RelationshipStatus::Hostile => "hostile",
            RelationshipStatus::Consort => "consort",
            RelationshipStatus::RoyalConsort => "royal consort",
        }
    }
}

/// Immutable persona of a companion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionProfile {
    pub id: String,
    pub name: String,
    pub species: String,
    pub archetype: String,
    pub appearance: String,
    pub personality: String,
    /// Sample line showing how the companion's obsession sounds
    pub obsession: String,
    pub image: String,
    /// Relationship at first meeting
    pub stance: RelationshipStatus,
}

/// Per-playthrough stats, mutated only by interaction actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionStats {
    pub favorability: Percent,
    pub pregnancy: Percent,
    pub relationship: RelationshipStatus,
}

/// A selectable companion: catalog profile plus live stats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Companion {
    #[serde(flatten)]
    pub profile: CompanionProfile,
    #[serde(flatten)]
    pub stats: CompanionStats,
}

impl Companion {
    pub fn id(&self) -> &str {
        &self.profile.id
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Author of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    /// Player text and system directives
    #[serde(rename = "user")]
    Player,
    /// Model narration
    #[serde(rename = "model")]
    Narrator,
}

/// One entry in the playthrough's message log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    /// Unix epoch milliseconds
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn player(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Player, text)
    }

    pub fn narrator(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Narrator, text)
    }

    /// Whether this entry is a system directive rather than free player text
    pub fn is_directive(&self) -> bool {
        self.role == ChatRole::Player && self.text.starts_with(DIRECTIVE_PREFIX)
    }
}
