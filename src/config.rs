//! Process configuration

use crate::llm::LlmConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Pacing of the timed phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameTimings {
    /// Warp sequence before the draw starts
    pub warp: Duration,
    /// Interval between draw ticks while rolling
    pub draw_tick: Duration,
    /// Pause between the draw stopping and the reveal
    pub reveal: Duration,
}

impl Default for GameTimings {
    fn default() -> Self {
        Self {
            warp: Duration::from_secs(3),
            draw_tick: Duration::from_millis(80),
            reveal: Duration::from_millis(600),
        }
    }
}

/// Everything the binary reads from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub save_path: PathBuf,
    /// Pre-filled credential, so the player need not type it
    pub credential: Option<String>,
    pub llm: LlmConfig,
    pub timings: GameTimings,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let save_path = std::env::var("WARDROBE_SAVE_PATH").map_or_else(
            |_| default_save_path(std::env::var("HOME").ok()),
            PathBuf::from,
        );
        Self {
            save_path,
            credential: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            llm: LlmConfig::from_env(),
            timings: GameTimings::default(),
        }
    }
}

fn default_save_path(home: Option<String>) -> PathBuf {
    let home = home.unwrap_or_else(|| "/tmp".to_string());
    PathBuf::from(home).join(".queens-wardrobe").join("save.db")
}
