//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::{GameRuntime, UiEvent};
use crate::catalog::Catalog;
use crate::config::GameTimings;
use crate::gateway::ConversationGateway;
use crate::llm::{ClientFactory, LlmConfig, LlmError, LlmRequest, LlmResponse, LlmService};
use crate::state_machine::{Event, GameContext, GameState, Notice};
use crate::store::{MemoryKv, SaveStore};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::invalid_request("No mock response queued")))
    }
}

#[async_trait]
impl LlmService for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.next_response(request)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Mock LLM client that answers only after a delay (for stale reply testing)
pub struct DelayedMockLlmClient {
    pub inner: MockLlmClient,
    delay: Duration,
}

impl DelayedMockLlmClient {
    pub fn new(model_id: impl Into<String>, delay: Duration) -> Self {
        Self {
            inner: MockLlmClient::new(model_id),
            delay,
        }
    }
}

#[async_trait]
impl LlmService for DelayedMockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        tokio::time::sleep(self.delay).await;
        self.inner.next_response(request)
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

// ============================================================================
// Mock Client Factory
// ============================================================================

/// Factory that hands out one shared client, or always fails
pub struct MockClientFactory {
    client: Result<Arc<dyn LlmService>, LlmError>,
    /// Credentials passed to `connect`
    pub credentials: Mutex<Vec<String>>,
}

impl MockClientFactory {
    pub fn new<L: LlmService + 'static>(client: Arc<L>) -> Self {
        Self {
            client: Ok(client),
            credentials: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: LlmError) -> Self {
        Self {
            client: Err(error),
            credentials: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded_credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }
}

impl ClientFactory for MockClientFactory {
    fn connect(&self, credential: &str) -> Result<Arc<dyn LlmService>, LlmError> {
        self.credentials.lock().unwrap().push(credential.to_string());
        self.client.clone()
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

/// Timings short enough to run every phase in a test
pub fn fast_timings() -> GameTimings {
    GameTimings {
        warp: Duration::from_millis(1),
        draw_tick: Duration::from_millis(5),
        reveal: Duration::from_millis(1),
    }
}

/// Helper for building test runtimes with minimal boilerplate
pub struct TestRuntime {
    pub store: Arc<SaveStore<MemoryKv>>,
    pub factory: Arc<MockClientFactory>,
    pub gateway: Arc<ConversationGateway>,
    pub event_tx: mpsc::Sender<Event>,
    pub broadcast_rx: broadcast::Receiver<UiEvent>,
    pub can_resume: bool,
    _runtime_handle: tokio::task::JoinHandle<()>,
}

pub struct TestRuntimeBuilder {
    factory: MockClientFactory,
    store: SaveStore<MemoryKv>,
}

impl TestRuntime {
    /// Runtime whose model answers from `llm`
    pub fn with_llm<L: LlmService + 'static>(llm: Arc<L>) -> TestRuntimeBuilder {
        TestRuntimeBuilder {
            factory: MockClientFactory::new(llm),
            store: SaveStore::new(MemoryKv::new()),
        }
    }

    /// Runtime whose client cannot even be created
    pub fn with_failing_factory(error: LlmError) -> TestRuntimeBuilder {
        TestRuntimeBuilder {
            factory: MockClientFactory::failing(error),
            store: SaveStore::new(MemoryKv::new()),
        }
    }
}

impl TestRuntimeBuilder {
    pub fn store(mut self, store: SaveStore<MemoryKv>) -> Self {
        self.store = store;
        self
    }

    pub fn build(self) -> TestRuntime {
        let store = Arc::new(self.store);
        let factory = Arc::new(self.factory);
        let config = LlmConfig {
            retry_base_delay: Duration::ZERO,
            ..LlmConfig::default()
        };
        let gateway = Arc::new(ConversationGateway::new(factory.clone(), config));
        let context = GameContext::new(Arc::new(Catalog::builtin()), fast_timings());

        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, broadcast_rx) = broadcast::channel(1024);

        let runtime = GameRuntime::new(
            context,
            store.clone(),
            gateway.clone(),
            event_rx,
            event_tx.clone(),
            broadcast_tx,
        );
        let can_resume = runtime.can_resume();

        let handle = tokio::spawn(async move {
            runtime.run().await;
        });

        TestRuntime {
            store,
            factory,
            gateway,
            event_tx,
            broadcast_rx,
            can_resume,
            _runtime_handle: handle,
        }
    }
}

impl TestRuntime {
    pub async fn send(&self, event: Event) {
        self.event_tx
            .send(event)
            .await
            .expect("Failed to send event");
    }

    /// Wait for a broadcast state satisfying `pred`
    pub async fn wait_for_state(
        &mut self,
        timeout: Duration,
        pred: impl Fn(&GameState) -> bool,
    ) -> Option<Arc<GameState>> {
        self.wait_for(timeout, |event| match event {
            UiEvent::StateChanged { state } if pred(state.as_ref()) => Some(state),
            _ => None,
        })
        .await
    }

    /// Wait for the next return to the title screen; yields its resume answer
    pub async fn wait_for_title_screen(&mut self, timeout: Duration) -> Option<bool> {
        self.wait_for(timeout, |event| match event {
            UiEvent::TitleScreen { can_resume } => Some(can_resume),
            _ => None,
        })
        .await
    }

    pub async fn wait_for_notice(&mut self, timeout: Duration) -> Option<Notice> {
        self.wait_for(timeout, |event| match event {
            UiEvent::Notice(notice) => Some(notice),
            _ => None,
        })
        .await
    }

    pub async fn wait_for_rejection(&mut self, timeout: Duration) -> Option<String> {
        self.wait_for(timeout, |event| match event {
            UiEvent::Rejected { message } => Some(message),
            _ => None,
        })
        .await
    }

    async fn wait_for<T>(
        &mut self,
        timeout: Duration,
        pick: impl Fn(UiEvent) -> Option<T>,
    ) -> Option<T> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            match tokio::time::timeout(remaining, self.broadcast_rx.recv()).await {
                Ok(Ok(event)) => {
                    if let Some(found) = pick(event) {
                        return Some(found);
                    }
                }
                Ok(Err(RecvError::Lagged(_))) => continue,
                Ok(Err(RecvError::Closed)) | Err(_) => return None,
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{INTERRUPTED_NOTICE, OPENING_TURN};
    use crate::llm::{LlmMessage, MessageRole};
    use crate::model::{ChatMessage, ChatRole, Percent};
    use crate::state_machine::transition::{CONNECTION_FAILED, INCOMPATIBLE_SAVE};
    use crate::state_machine::effect::Directive;
    use crate::state_machine::state::PendingTurn;
    use crate::state_machine::{Action, GamePhase, NoticeKind};
    use crate::store::{KvBackend, SaveSnapshot, SAVE_KEY};
    use std::collections::BTreeMap;

    const WAIT: Duration = Duration::from_secs(2);

    fn idle_playing(state: &GameState) -> bool {
        state.phase == GamePhase::Playing { pending: None }
    }

    fn saved_game() -> SaveSnapshot {
        let catalog = Catalog::builtin();
        let mut fox = catalog.companion("ml_fox").unwrap().clone();
        fox.stats.favorability = Percent::new(35);
        SaveSnapshot {
            selected_outfit: catalog.outfits[1].clone(),
            selected_leads: vec![fox, catalog.companion("ml_wolf").unwrap().clone()],
            messages: vec![
                ChatMessage::narrator("The airlock hisses open."),
                ChatMessage::player("I step inside."),
                ChatMessage::narrator("Two figures turn toward you."),
            ],
            custom_images: BTreeMap::new(),
        }
    }

    /// Play from the title screen to the first idle turn with `companions`
    async fn reach_play(rt: &mut TestRuntime, companions: &[&str]) -> Arc<GameState> {
        rt.send(Event::StartNew {
            credential: "test-key".into(),
        })
        .await;
        rt.wait_for_state(WAIT, |s| {
            matches!(s.phase, GamePhase::TalentDraw { rolling: true, .. })
        })
        .await
        .expect("draw should start");

        rt.send(Event::StopDraw).await;
        rt.wait_for_state(WAIT, |s| s.phase == GamePhase::TalentReveal)
            .await
            .expect("talent should be revealed");

        rt.send(Event::ConfirmTalent).await;
        for id in companions {
            rt.send(Event::ToggleCompanion { id: (*id).into() }).await;
        }
        rt.send(Event::BeginPlaythrough).await;
        rt.wait_for_state(WAIT, idle_playing)
            .await
            .expect("opening should arrive")
    }

    #[tokio::test]
    async fn test_mock_llm_client() {
        let client = MockLlmClient::new("test-model");
        client.queue_response(LlmResponse::text("Hello"));

        let request = LlmRequest {
            system: String::new(),
            messages: vec![LlmMessage::user("Hi")],
            temperature: None,
            max_tokens: None,
        };
        let response = client.complete(&request).await.unwrap();
        assert_eq!(response.text, "Hello");
        assert_eq!(client.recorded_requests().len(), 1);
        assert!(client.complete(&request).await.is_err());
    }

    #[tokio::test]
    async fn test_new_game_reaches_play_with_opening() {
        let llm = Arc::new(MockLlmClient::new("test-model"));
        llm.queue_response(LlmResponse::text("You land in the throne hall."));
        let mut rt = TestRuntime::with_llm(llm.clone()).build();
        assert!(!rt.can_resume);

        let state = reach_play(&mut rt, &["ml_wolf", "ml_rabbit"]).await;
        let p = &state.playthrough;
        assert!(p.outfit.is_some());
        assert_eq!(p.companions.len(), 2);
        assert_eq!(p.messages.len(), 1);
        assert_eq!(p.messages[0].role, ChatRole::Narrator);
        assert_eq!(p.messages[0].text, "You land in the throne hall.");

        assert_eq!(rt.factory.recorded_credentials(), vec!["test-key"]);
        assert_eq!(
            llm.recorded_requests()[0].messages,
            vec![LlmMessage::user(OPENING_TURN)]
        );
        assert_eq!(rt.store.read(), state.snapshot());
    }

    #[tokio::test]
    async fn test_start_new_clears_snapshot_before_warp() {
        let store = SaveStore::new(MemoryKv::new());
        store.write(&saved_game());
        let llm = Arc::new(MockLlmClient::new("test-model"));
        let mut rt = TestRuntime::with_llm(llm).store(store).build();
        assert!(rt.can_resume);

        rt.send(Event::StartNew {
            credential: "k".into(),
        })
        .await;
        rt.wait_for_state(WAIT, |s| s.phase == GamePhase::Warp)
            .await
            .expect("should warp");
        assert!(!rt.store.has_snapshot());
    }

    #[tokio::test]
    async fn test_messages_alternate_with_replies() {
        let llm = Arc::new(MockLlmClient::new("test-model"));
        llm.queue_response(LlmResponse::text("opening"));
        llm.queue_response(LlmResponse::text("He bows."));
        let mut rt = TestRuntime::with_llm(llm.clone()).build();
        reach_play(&mut rt, &["ml_wolf"]).await;

        rt.send(Event::PlayerMessage {
            text: "Rise.".into(),
        })
        .await;
        let state = rt
            .wait_for_state(WAIT, |s| idle_playing(s) && s.playthrough.messages.len() == 3)
            .await
            .expect("reply should arrive");

        let log: Vec<_> = state
            .playthrough
            .messages
            .iter()
            .map(|m| (m.role, m.text.as_str()))
            .collect();
        assert_eq!(
            log,
            vec![
                (ChatRole::Narrator, "opening"),
                (ChatRole::Player, "Rise."),
                (ChatRole::Narrator, "He bows."),
            ]
        );
        assert_eq!(rt.store.read().unwrap().messages.len(), 3);

        // Gateway history mirrors the log after the opening turn
        let history = rt.gateway.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[2], LlmMessage::user("Rise."));
        assert_eq!(history[3].role, MessageRole::Model);
    }

    #[tokio::test]
    async fn test_failed_send_rolls_back_and_next_send_is_accepted() {
        let llm = Arc::new(MockLlmClient::new("test-model"));
        llm.queue_response(LlmResponse::text("opening"));
        llm.queue_error(LlmError::invalid_request("blocked"));
        llm.queue_response(LlmResponse::text("Second time lucky."));
        let mut rt = TestRuntime::with_llm(llm).build();
        reach_play(&mut rt, &["ml_fox"]).await;

        rt.send(Event::Interact {
            companion_id: "ml_fox".into(),
            action: Action::Favor,
        })
        .await;
        let notice = rt.wait_for_notice(WAIT).await.expect("toast expected");
        assert_eq!(notice, Notice::toast(INTERRUPTED_NOTICE));

        let state = rt
            .wait_for_state(WAIT, |s| idle_playing(s) && s.playthrough.messages.len() == 1)
            .await
            .expect("turn should be rolled back");
        // The gift itself was kept
        assert_eq!(
            state.playthrough.companion("ml_fox").unwrap().stats.favorability,
            Percent::new(10)
        );
        assert_eq!(rt.store.read().unwrap().messages.len(), 1);

        rt.send(Event::PlayerMessage {
            text: "Hello?".into(),
        })
        .await;
        let state = rt
            .wait_for_state(WAIT, |s| idle_playing(s) && s.playthrough.messages.len() == 3)
            .await
            .expect("next send should go through");
        assert_eq!(
            state.playthrough.messages[2].text,
            "Second time lucky."
        );
    }

    #[tokio::test]
    async fn test_interaction_sends_directive() {
        let llm = Arc::new(MockLlmClient::new("test-model"));
        llm.queue_response(LlmResponse::text("opening"));
        llm.queue_response(LlmResponse::text("He trembles."));
        let mut rt = TestRuntime::with_llm(llm.clone()).build();
        reach_play(&mut rt, &["ml_spider"]).await;

        rt.send(Event::Interact {
            companion_id: "ml_spider".into(),
            action: Action::Imprint,
        })
        .await;
        let state = rt
            .wait_for_state(WAIT, |s| idle_playing(s) && s.playthrough.messages.len() == 3)
            .await
            .unwrap();

        let directive = Directive::ImprintAnnounced.text("Morse");
        assert_eq!(state.playthrough.messages[1].text, directive);
        let last_request = llm.recorded_requests().pop().unwrap();
        assert_eq!(last_request.messages.last(), Some(&LlmMessage::user(directive)));
        assert_eq!(
            state.playthrough.companion("ml_spider").unwrap().stats.pregnancy,
            Percent::new(20)
        );
    }

    #[tokio::test]
    async fn test_send_while_waiting_is_rejected() {
        let llm = Arc::new(DelayedMockLlmClient::new("test-model", Duration::from_millis(50)));
        llm.inner.queue_response(LlmResponse::text("opening"));
        llm.inner.queue_response(LlmResponse::text("reply"));
        let mut rt = TestRuntime::with_llm(llm).build();
        reach_play(&mut rt, &["ml_wolf"]).await;

        rt.send(Event::PlayerMessage { text: "one".into() }).await;
        rt.send(Event::PlayerMessage { text: "two".into() }).await;
        let message = rt.wait_for_rejection(WAIT).await.expect("second send refused");
        assert!(message.contains("waiting"));

        let state = rt
            .wait_for_state(WAIT, |s| idle_playing(s) && s.playthrough.messages.len() == 3)
            .await
            .unwrap();
        assert_eq!(state.playthrough.messages[1].text, "one");
    }

    #[tokio::test]
    async fn test_late_reply_after_reset_is_discarded() {
        let llm = Arc::new(DelayedMockLlmClient::new("test-model", Duration::from_millis(100)));
        llm.inner.queue_response(LlmResponse::text("opening"));
        llm.inner.queue_response(LlmResponse::text("too late"));
        let mut rt = TestRuntime::with_llm(llm).build();
        reach_play(&mut rt, &["ml_peacock"]).await;

        rt.send(Event::PlayerMessage {
            text: "Speak.".into(),
        })
        .await;
        rt.wait_for_state(WAIT, |s| {
            matches!(
                s.phase,
                GamePhase::Playing {
                    pending: Some(PendingTurn::Narration { .. })
                }
            )
        })
        .await
        .unwrap();

        rt.send(Event::Reset).await;
        let state = rt
            .wait_for_state(WAIT, |s| s.phase == GamePhase::Intro { resuming: false })
            .await
            .unwrap();
        assert!(state.playthrough.messages.is_empty());
        assert!(!rt.gateway.has_session());

        let late = rt
            .wait_for_state(Duration::from_millis(300), |s| s.phase.is_playing())
            .await;
        assert!(late.is_none());
        // Reset keeps the save slot
        assert!(rt.store.has_snapshot());
    }

    #[tokio::test]
    async fn test_title_screen_offers_save_written_this_session() {
        let llm = Arc::new(MockLlmClient::new("test-model"));
        llm.queue_response(LlmResponse::text("opening"));
        let mut rt = TestRuntime::with_llm(llm).build();
        // Nothing saved at startup
        assert!(!rt.can_resume);

        reach_play(&mut rt, &["ml_wolf"]).await;
        assert!(rt.store.has_snapshot());

        rt.send(Event::Reset).await;
        assert_eq!(rt.wait_for_title_screen(WAIT).await, Some(true));
    }

    #[tokio::test]
    async fn test_failed_resume_returns_to_title_with_save_kept() {
        let store = SaveStore::new(MemoryKv::new());
        store.write(&saved_game());
        let mut rt = TestRuntime::with_failing_factory(LlmError::auth("bad key"))
            .store(store)
            .build();

        rt.send(Event::Resume {
            credential: "k".into(),
        })
        .await;
        assert_eq!(rt.wait_for_title_screen(WAIT).await, Some(true));
        assert!(rt.store.has_snapshot());
    }

    #[tokio::test]
    async fn test_resume_restores_saved_game_without_model_call() {
        let saved = saved_game();
        let store = SaveStore::new(MemoryKv::new());
        store.write(&saved);
        let llm = Arc::new(MockLlmClient::new("test-model"));
        llm.queue_response(LlmResponse::text("They wait for you."));
        let mut rt = TestRuntime::with_llm(llm.clone()).store(store).build();
        assert!(rt.can_resume);

        rt.send(Event::Resume {
            credential: "k".into(),
        })
        .await;
        let state = rt.wait_for_state(WAIT, idle_playing).await.unwrap();
        assert_eq!(state.snapshot(), Some(saved.clone()));
        assert!(llm.recorded_requests().is_empty());

        rt.send(Event::PlayerMessage {
            text: "Continue.".into(),
        })
        .await;
        rt.wait_for_state(WAIT, |s| idle_playing(s) && s.playthrough.messages.len() == 5)
            .await
            .unwrap();

        let request = llm.recorded_requests().pop().unwrap();
        let mut expected = vec![LlmMessage::user(OPENING_TURN)];
        expected.extend(saved.messages.iter().map(|m| match m.role {
            ChatRole::Player => LlmMessage::user(m.text.clone()),
            ChatRole::Narrator => LlmMessage::model(m.text.clone()),
        }));
        expected.push(LlmMessage::user("Continue."));
        assert_eq!(request.messages, expected);
    }

    #[tokio::test]
    async fn test_resume_with_corrupt_save_keeps_it() {
        let store = SaveStore::new(MemoryKv::new());
        store.backend().set(SAVE_KEY, "{\"selectedOutfit\":").unwrap();
        let llm = Arc::new(MockLlmClient::new("test-model"));
        let mut rt = TestRuntime::with_llm(llm).store(store).build();
        assert!(rt.can_resume);

        rt.send(Event::Resume {
            credential: "k".into(),
        })
        .await;
        let notice = rt.wait_for_notice(WAIT).await.unwrap();
        assert_eq!(notice, Notice::blocking(INCOMPATIBLE_SAVE));
        assert!(rt.store.has_snapshot());
        assert!(!rt.gateway.has_session());
    }

    #[tokio::test]
    async fn test_resume_without_save() {
        let mut rt = TestRuntime::with_llm(Arc::new(MockLlmClient::new("m"))).build();
        rt.send(Event::Resume {
            credential: "k".into(),
        })
        .await;
        let notice = rt.wait_for_notice(WAIT).await.unwrap();
        assert_eq!(notice.kind, NoticeKind::Blocking);
    }

    #[tokio::test]
    async fn test_client_setup_failure_leaves_save_alone() {
        let store = SaveStore::new(MemoryKv::new());
        store.write(&saved_game());
        let mut rt = TestRuntime::with_failing_factory(LlmError::invalid_request("bad base url"))
            .store(store)
            .build();

        rt.send(Event::StartNew {
            credential: "k".into(),
        })
        .await;
        let notice = rt.wait_for_notice(WAIT).await.unwrap();
        assert_eq!(notice.kind, NoticeKind::Blocking);
        assert!(notice.message.contains("bad base url"));
        assert!(rt.store.has_snapshot());
    }

    #[tokio::test]
    async fn test_opening_failure_returns_to_intro() {
        let llm = Arc::new(MockLlmClient::new("test-model"));
        llm.queue_error(LlmError::auth("API key not valid"));
        let mut rt = TestRuntime::with_llm(llm).build();

        rt.send(Event::StartNew {
            credential: "wrong".into(),
        })
        .await;
        rt.wait_for_state(WAIT, |s| {
            matches!(s.phase, GamePhase::TalentDraw { rolling: true, .. })
        })
        .await
        .unwrap();
        rt.send(Event::StopDraw).await;
        rt.wait_for_state(WAIT, |s| s.phase == GamePhase::TalentReveal)
            .await
            .unwrap();
        rt.send(Event::ConfirmTalent).await;
        rt.send(Event::ToggleCompanion {
            id: "ml_snake".into(),
        })
        .await;
        rt.send(Event::BeginPlaythrough).await;

        let notice = rt.wait_for_notice(WAIT).await.unwrap();
        assert_eq!(notice, Notice::blocking(CONNECTION_FAILED));
        let state = rt
            .wait_for_state(WAIT, |s| s.phase == GamePhase::Intro { resuming: false })
            .await
            .unwrap();
        assert!(state.playthrough.companions.is_empty());
        assert!(!rt.gateway.has_session());
        assert!(!rt.store.has_snapshot());
    }

    #[tokio::test]
    async fn test_invalid_event_is_rejected() {
        let mut rt = TestRuntime::with_llm(Arc::new(MockLlmClient::new("m"))).build();
        rt.send(Event::BeginPlaythrough).await;
        assert!(rt.wait_for_rejection(WAIT).await.is_some());

        rt.send(Event::StartNew {
            credential: String::new(),
        })
        .await;
        let message = rt.wait_for_rejection(WAIT).await.unwrap();
        assert!(message.contains("API key"));
    }

    #[tokio::test]
    async fn test_reset_during_draw_stops_ticker() {
        let mut rt = TestRuntime::with_llm(Arc::new(MockLlmClient::new("m"))).build();
        rt.send(Event::StartNew {
            credential: "k".into(),
        })
        .await;
        rt.wait_for_state(WAIT, |s| {
            matches!(s.phase, GamePhase::TalentDraw { rolling: true, .. })
        })
        .await
        .unwrap();

        rt.send(Event::Reset).await;
        rt.wait_for_state(WAIT, |s| s.phase == GamePhase::Intro { resuming: false })
            .await
            .unwrap();
        // No further state changes once the ticker is gone
        let next = rt.wait_for_state(Duration::from_millis(100), |_| true).await;
        assert!(next.is_none());
    }
}
