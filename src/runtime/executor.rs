//! Game runtime executor

use super::traits::SnapshotStore;
use super::UiEvent;

use crate::gateway::{ConversationGateway, Reply, INTERRUPTED_NOTICE};
use crate::state_machine::{
    transition, Effect, Event, GameContext, GamePhase, GameState, TransitionError,
};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Runs the state machine and executes its effects
pub struct GameRuntime<S>
where
    S: SnapshotStore + 'static,
{
    context: GameContext,
    state: GameState,
    store: Arc<S>,
    gateway: Arc<ConversationGateway>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<UiEvent>,
    /// Parent of every timer and draw ticker token
    timer_cancel_token: CancellationToken,
    /// Token of the running draw ticker
    ticker_cancel_token: Option<CancellationToken>,
    /// Cancels gateway calls still in flight when the session is torn down
    session_cancel_token: CancellationToken,
}

impl<S> GameRuntime<S>
where
    S: SnapshotStore + 'static,
{
    pub fn new(
        context: GameContext,
        store: Arc<S>,
        gateway: Arc<ConversationGateway>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        broadcast_tx: broadcast::Sender<UiEvent>,
    ) -> Self {
        Self {
            context,
            state: GameState::new(),
            store,
            gateway,
            event_rx,
            event_tx,
            broadcast_tx,
            timer_cancel_token: CancellationToken::new(),
            ticker_cancel_token: None,
            session_cancel_token: CancellationToken::new(),
        }
    }

    /// Whether a saved game exists to offer "continue"
    pub fn can_resume(&self) -> bool {
        self.store.has_snapshot()
    }

    pub async fn run(mut self) {
        tracing::info!(can_resume = self.can_resume(), "Starting game runtime");

        while let Some(event) = self.event_rx.recv().await {
            if let Err(e) = self.process_event(event) {
                tracing::warn!(error = %e, phase = %self.state.phase, "Event rejected");
                let _ = self.broadcast_tx.send(UiEvent::Rejected {
                    message: e.to_string(),
                });
            }
        }

        self.timer_cancel_token.cancel();
        self.session_cancel_token.cancel();
        tracing::info!("Game runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        // Effects may answer synchronously; those answers are processed here too
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = transition(&self.state, &self.context, current_event)?;

            if result.new_state.phase != self.state.phase {
                tracing::info!(
                    from = %self.state.phase,
                    to = %result.new_state.phase,
                    epoch = result.new_state.epoch,
                    "Phase changed"
                );
            }
            let changed = result.new_state != self.state;
            let entered_title = result.new_state.phase != self.state.phase
                && result.new_state.phase == GamePhase::Intro { resuming: false };
            self.state = result.new_state;

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect) {
                    events_to_process.push(generated_event);
                }
            }

            if changed {
                let _ = self.broadcast_tx.send(UiEvent::StateChanged {
                    state: Arc::new(self.state.clone()),
                });
            }
            // After the effects, so a cleared or freshly written save is seen
            if entered_title {
                let _ = self.broadcast_tx.send(UiEvent::TitleScreen {
                    can_resume: self.can_resume(),
                });
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::InitializeGateway {
                credential,
                launch,
                epoch,
            } => match self.gateway.initialize(&credential) {
                Ok(()) => Some(Event::GatewayReady { epoch, launch }),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to initialize narration client");
                    Some(Event::GatewayFailed {
                        epoch,
                        message: e.to_string(),
                    })
                }
            },

            Effect::ClearSnapshot => {
                self.store.clear();
                None
            }

            Effect::LoadSnapshot { epoch } => Some(Event::SnapshotLoaded {
                epoch,
                snapshot: self.store.read().map(Box::new),
            }),

            Effect::PersistSnapshot => {
                if let Some(snapshot) = self.state.snapshot() {
                    self.store.write(&snapshot);
                }
                None
            }

            Effect::ScheduleTimer {
                timer,
                delay,
                epoch,
            } => {
                let cancel_token = self.timer_cancel_token.child_token();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        () = cancel_token.cancelled() => {
                            tracing::debug!(?timer, epoch, "Timer cancelled");
                        }
                        () = tokio::time::sleep(delay) => {
                            let _ = event_tx.send(Event::TimerFired { epoch, timer }).await;
                        }
                    }
                });
                None
            }

            Effect::StartDrawTicker { interval, epoch } => {
                let cancel_token = self.timer_cancel_token.child_token();
                if let Some(previous) = self.ticker_cancel_token.replace(cancel_token.clone()) {
                    previous.cancel();
                }
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
                    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                    // The first tick completes immediately
                    ticker.tick().await;
                    loop {
                        tokio::select! {
                            () = cancel_token.cancelled() => break,
                            _ = ticker.tick() => {
                                if event_tx.send(Event::DrawTick { epoch }).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    tracing::debug!(epoch, "Draw ticker stopped");
                });
                None
            }

            Effect::StopDrawTicker => {
                if let Some(token) = self.ticker_cancel_token.take() {
                    token.cancel();
                }
                None
            }

            Effect::CancelTimers => {
                self.timer_cancel_token.cancel();
                self.timer_cancel_token = CancellationToken::new();
                self.ticker_cancel_token = None;
                None
            }

            Effect::RollOutfit { epoch } => {
                let count = self.context.catalog.outfits.len();
                if count == 0 {
                    tracing::error!("Outfit catalog is empty; cannot draw");
                    return None;
                }
                let index = rand::thread_rng().gen_range(0..count);
                Some(Event::DrawResolved { epoch, index })
            }

            Effect::OpenSession { epoch } => {
                let Some(outfit) = self.state.playthrough.outfit.clone() else {
                    return Some(Event::SessionOpenFailed {
                        epoch,
                        message: "no talent bound".to_string(),
                    });
                };
                let companions = self.state.playthrough.companions.clone();
                let scenario = self.context.catalog.scenario.clone();
                let gateway = self.gateway.clone();
                let event_tx = self.event_tx.clone();
                let cancel_token = self.session_cancel_token.child_token();

                tokio::spawn(async move {
                    let event = tokio::select! {
                        () = cancel_token.cancelled() => {
                            tracing::debug!(epoch, "Opening request abandoned");
                            return;
                        }
                        result = gateway.start(&scenario, &outfit, &companions) => match result {
                            Ok(narration) => Event::SessionOpened { epoch, narration },
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to open story session");
                                Event::SessionOpenFailed { epoch, message: e.to_string() }
                            }
                        }
                    };
                    let _ = event_tx.send(event).await;
                });
                None
            }

            Effect::ResumeSession { epoch } => {
                let Some(outfit) = self.state.playthrough.outfit.as_ref() else {
                    return Some(Event::SessionResumeFailed {
                        epoch,
                        message: "no talent bound".to_string(),
                    });
                };
                let playthrough = &self.state.playthrough;
                match self.gateway.resume(
                    &self.context.catalog.scenario,
                    outfit,
                    &playthrough.companions,
                    &playthrough.messages,
                ) {
                    Ok(()) => Some(Event::SessionResumed { epoch }),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to resume story session");
                        Some(Event::SessionResumeFailed {
                            epoch,
                            message: e.to_string(),
                        })
                    }
                }
            }

            Effect::RequestNarration { epoch, text } => {
                let gateway = self.gateway.clone();
                let event_tx = self.event_tx.clone();
                let cancel_token = self.session_cancel_token.child_token();

                tokio::spawn(async move {
                    let event = tokio::select! {
                        () = cancel_token.cancelled() => {
                            tracing::debug!(epoch, "Narration request abandoned");
                            return;
                        }
                        result = gateway.send(&text) => match result {
                            Ok(Reply::Narration(narration)) => Event::NarrationReceived {
                                epoch,
                                text: narration,
                            },
                            Ok(Reply::Interrupted { notice, error }) => {
                                tracing::debug!(
                                    epoch,
                                    retryable = error.kind.is_retryable(),
                                    "Turn rolled back"
                                );
                                Event::NarrationInterrupted { epoch, notice }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Narration request refused");
                                Event::NarrationInterrupted {
                                    epoch,
                                    notice: INTERRUPTED_NOTICE.to_string(),
                                }
                            }
                        }
                    };
                    let _ = event_tx.send(event).await;
                });
                None
            }

            Effect::TearDownSession => {
                self.gateway.tear_down();
                self.session_cancel_token.cancel();
                self.session_cancel_token = CancellationToken::new();
                None
            }

            Effect::Notify(notice) => {
                let _ = self.broadcast_tx.send(UiEvent::Notice(notice));
                None
            }
        }
    }
}
