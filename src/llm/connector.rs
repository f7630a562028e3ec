//! Building model clients from a player-supplied credential

use super::gemini::GeminiService;
use super::{LlmError, LlmService, LoggingService};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.9;

/// Configuration for the narration model
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    /// Alternate API root (proxy or local gateway)
    pub base_url: Option<String>,
    pub temperature: f32,
    pub request_timeout: Duration,
    /// Total attempts per turn, including the first
    pub max_attempts: u32,
    /// First backoff delay; doubles on each retry
    pub retry_base_delay: Duration,
    /// Ceiling on a server-requested retry delay
    pub max_retry_delay: Duration,
    /// Reply length limit; `None` leaves it to the model
    pub max_output_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: Duration::from_secs(120),
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(30),
            max_output_tokens: None,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: std::env::var("GEMINI_BASE_URL").ok(),
            temperature: std::env::var("WARDROBE_TEMPERATURE")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.temperature),
            max_output_tokens: std::env::var("WARDROBE_MAX_TOKENS")
                .ok()
                .and_then(|t| t.parse().ok()),
            ..defaults
        }
    }

    /// Backoff before retry number `attempt` (1-based count of the retry)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        // 1x, 2x, 4x ...
        self.retry_base_delay * (1 << attempt.saturating_sub(1).min(8))
    }

    /// Delay before retry number `attempt`, honoring but capping the server's hint
    pub fn backoff(&self, attempt: u32, server_hint: Option<Duration>) -> Duration {
        server_hint.map_or_else(
            || self.retry_delay(attempt),
            |hint| hint.min(self.max_retry_delay),
        )
    }
}

/// Creates the model client for a credential
///
/// This is the seam where tests inject a scripted client.
pub trait ClientFactory: Send + Sync {
    fn connect(&self, credential: &str) -> Result<Arc<dyn LlmService>, LlmError>;
}

/// Production factory: Gemini wrapped with request logging
pub struct GeminiConnector {
    config: LlmConfig,
}

impl GeminiConnector {
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for GeminiConnector {
    fn connect(&self, credential: &str) -> Result<Arc<dyn LlmService>, LlmError> {
        let service = GeminiService::new(
            credential.trim(),
            &self.config.model,
            self.config.base_url.as_deref(),
            self.config.request_timeout,
        )?;
        Ok(Arc::new(LoggingService::new(Arc::new(service))))
    }
}
