//! Conversation gateway
//!
//! Owns the one live model session of a playthrough. The session is created
//! by [`ConversationGateway::start`] or [`ConversationGateway::resume`],
//! replaced by the next start/resume and dropped by
//! [`ConversationGateway::tear_down`].

mod prompt;

pub use prompt::build_system_instruction;

use crate::llm::{ClientFactory, LlmConfig, LlmError, LlmMessage, LlmRequest, LlmService};
use crate::model::{ChatMessage, ChatRole, Companion, Outfit, Scenario};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Fixed first player turn of every session
pub const OPENING_TURN: &str = "The game begins. In second person, describe the scene of my \
arrival in this world and the companions who appear before me (if there are several, describe \
their tense standoff). Keep the atmosphere taut and charged.";

/// Narration used when the opening reply comes back empty
pub const OPENING_FALLBACK: &str = "The star river trembles. You have arrived...";

/// Narration used when a later reply comes back empty
pub const EMPTY_REPLY: &str = "...";

/// Notice shown when a turn could not reach the model
pub const INTERRUPTED_NOTICE: &str = "The starnet connection is unstable... (try again)";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Narration client not initialized")]
    NotInitialized,
    #[error("No active conversation session")]
    NoActiveSession,
    #[error("A turn is already in flight")]
    Busy,
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Outcome of [`ConversationGateway::send`]
#[derive(Debug, Clone)]
pub enum Reply {
    /// The model answered; empty answers are replaced by a placeholder
    Narration(String),
    /// The model could not be reached; nothing was recorded in the session
    Interrupted { notice: String, error: LlmError },
}

struct ChatSession {
    id: u64,
    client: Arc<dyn LlmService>,
    system: String,
    history: Vec<LlmMessage>,
    in_flight: bool,
}

/// Owner of the active model session
pub struct ConversationGateway {
    factory: Arc<dyn ClientFactory>,
    config: LlmConfig,
    client: Mutex<Option<Arc<dyn LlmService>>>,
    session: Mutex<Option<ChatSession>>,
    next_session_id: AtomicU64,
}

impl ConversationGateway {
    pub fn new(factory: Arc<dyn ClientFactory>, config: LlmConfig) -> Self {
        Self {
            factory,
            config,
            client: Mutex::new(None),
            session: Mutex::new(None),
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Configure the model client for `credential`.
    ///
    /// The credential itself is not verified; a bad one surfaces as an
    /// authentication error on the first model call.
    pub fn initialize(&self, credential: &str) -> Result<(), GatewayError> {
        let client = self.factory.connect(credential)?;
        tracing::info!(model = %client.model_id(), "Narration client initialized");
        *lock(&self.client) = Some(client);
        Ok(())
    }

    #[allow(dead_code)] // Inspected by tests
    pub fn has_session(&self) -> bool {
        lock(&self.session).is_some()
    }

    /// Turn history of the active session, in order (empty if none)
    #[allow(dead_code)] // Inspected by tests
    pub fn history(&self) -> Vec<LlmMessage> {
        lock(&self.session)
            .as_ref()
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    /// System instruction of the active session
    #[allow(dead_code)] // Inspected by tests
    pub fn system_instruction(&self) -> Option<String> {
        lock(&self.session).as_ref().map(|s| s.system.clone())
    }

    /// Open a fresh session and ask for the opening scene.
    ///
    /// Transport errors propagate and leave no session behind.
    pub async fn start(
        &self,
        scenario: &Scenario,
        outfit: &Outfit,
        companions: &[Companion],
    ) -> Result<String, GatewayError> {
        let client = self.current_client()?;
        let system = build_system_instruction(scenario, outfit, companions);
        let session_id = self.open_session(client, system, Vec::new());
        tracing::info!(session_id, companions = companions.len(), "Starting story session");

        match self.exchange(OPENING_TURN, OPENING_FALLBACK).await? {
            Ok(narration) => Ok(narration),
            Err(e) => {
                let mut guard = lock(&self.session);
                if guard.as_ref().is_some_and(|s| s.id == session_id) {
                    *guard = None;
                }
                Err(e.into())
            }
        }
    }

    /// Rebuild a session from a saved log without calling the model.
    ///
    /// The history is the opening turn followed by `prior` in log order, so
    /// the next [`send`](Self::send) sees exactly what an uninterrupted
    /// session would have seen.
    pub fn resume(
        &self,
        scenario: &Scenario,
        outfit: &Outfit,
        companions: &[Companion],
        prior: &[ChatMessage],
    ) -> Result<(), GatewayError> {
        let client = self.current_client()?;
        let system = build_system_instruction(scenario, outfit, companions);

        let mut history = Vec::with_capacity(prior.len() + 1);
        history.push(LlmMessage::user(OPENING_TURN));
        history.extend(prior.iter().map(|msg| match msg.role {
            ChatRole::Player => LlmMessage::user(msg.text.clone()),
            ChatRole::Narrator => LlmMessage::model(msg.text.clone()),
        }));

        let session_id = self.open_session(client, system, history);
        tracing::info!(session_id, turns = prior.len(), "Resumed story session");
        Ok(())
    }

    /// Send the next player turn.
    ///
    /// Only session-level problems are errors. Transport failures come back
    /// as [`Reply::Interrupted`] and leave the session history untouched.
    pub async fn send(&self, text: &str) -> Result<Reply, GatewayError> {
        Ok(match self.exchange(text, EMPTY_REPLY).await? {
            Ok(narration) => Reply::Narration(narration),
            Err(error) => {
                tracing::warn!(error = %error, kind = ?error.kind, "Turn interrupted");
                Reply::Interrupted {
                    notice: INTERRUPTED_NOTICE.to_string(),
                    error,
                }
            }
        })
    }

    /// Drop the active session
    pub fn tear_down(&self) {
        if let Some(session) = lock(&self.session).take() {
            tracing::info!(session_id = session.id, "Story session torn down");
        }
    }

    fn current_client(&self) -> Result<Arc<dyn LlmService>, GatewayError> {
        lock(&self.client).clone().ok_or(GatewayError::NotInitialized)
    }

    fn open_session(
        &self,
        client: Arc<dyn LlmService>,
        system: String,
        history: Vec<LlmMessage>,
    ) -> u64 {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        *lock(&self.session) = Some(ChatSession {
            id,
            client,
            system,
            history,
            in_flight: false,
        });
        id
    }

    /// One user turn against the active session.
    ///
    /// Both turns are committed only on success, and only if the session was
    /// not replaced while the request was in flight.
    async fn exchange(
        &self,
        text: &str,
        fallback: &str,
    ) -> Result<Result<String, LlmError>, GatewayError> {
        let (session_id, client, request) = {
            let mut guard = lock(&self.session);
            let session = guard.as_mut().ok_or(GatewayError::NoActiveSession)?;
            if session.in_flight {
                return Err(GatewayError::Busy);
            }
            session.in_flight = true;

            let mut messages = session.history.clone();
            messages.push(LlmMessage::user(text));
            let request = LlmRequest {
                system: session.system.clone(),
                messages,
                temperature: Some(self.config.temperature),
                max_tokens: self.config.max_output_tokens,
            };
            (session.id, session.client.clone(), request)
        };

        let result = self.complete_with_retry(client.as_ref(), &request).await;

        let mut guard = lock(&self.session);
        let session = guard.as_mut().filter(|s| s.id == session_id);
        if let Some(session) = session {
            session.in_flight = false;
            if let Ok(response) = &result {
                let narration = non_empty_or(&response.text, fallback);
                session.history.push(LlmMessage::user(text));
                session.history.push(LlmMessage::model(narration));
            }
        } else {
            tracing::debug!(session_id, "Session replaced during request; reply not recorded");
        }

        Ok(result.map(|response| non_empty_or(&response.text, fallback)))
    }

    async fn complete_with_retry(
        &self,
        client: &dyn LlmService,
        request: &LlmRequest,
    ) -> Result<crate::llm::LlmResponse, LlmError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match client.complete(request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.kind.is_retryable() && attempt < max_attempts => {
                    let delay = self.config.backoff(attempt, e.retry_after);
                    tracing::info!(
                        attempt,
                        max_attempts,
                        delay_ms = %delay.as_millis(),
                        error = %e,
                        "Retrying narration request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn non_empty_or(text: &str, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
