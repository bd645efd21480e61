//! Session orchestrator — one active roadmap, its chat log, and the gate.
//!
//! All session state lives behind one lock inside a [`Session`] instance;
//! collaborators are injected. Network calls run with the lock released,
//! and an epoch counter discards replies that arrive after a reset.

pub mod events;

pub use events::SessionEvent;

use std::sync::{Arc, Weak};

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::api::traits::{
    Attachment, ChatApi, CompletionApi, GenerationApi, ReviewApi, RoadmapStoreApi,
};
use crate::chat::engine::ChatEngine;
use crate::chat::log::ChatLog;
use crate::chat::model::{ChatMessage, Role};
use crate::config::CoachConfig;
use crate::error::{ChatError, Error, ProgressError, Result};
use crate::progress::{self, Gate, ToggleAction};
use crate::roadmap::generate::{GenerationRequest, Generator};
use crate::roadmap::model::{Roadmap, RoadmapSummary};
use crate::roadmap::validate::validate_structure;

/// Fixed text of the synthesized turn sent after a gated completion.
pub const AUTO_ADVANCE_TEXT: &str = "Confirmed. Please proceed to the next step.";

/// The collaborators a session needs.
pub struct SessionDeps {
    pub generation: Arc<dyn GenerationApi>,
    pub chat: Arc<dyn ChatApi>,
    pub review: Arc<dyn ReviewApi>,
    pub completion: Arc<dyn CompletionApi>,
    pub store: Arc<dyn RoadmapStoreApi>,
}

impl SessionDeps {
    /// Wire every contract to one backend implementation.
    pub fn from_backend<T>(api: Arc<T>) -> Self
    where
        T: GenerationApi + ChatApi + ReviewApi + CompletionApi + RoadmapStoreApi + 'static,
    {
        Self {
            generation: api.clone(),
            chat: api.clone(),
            review: api.clone(),
            completion: api.clone(),
            store: api,
        }
    }
}

/// Read-only view of the session for the presentation layer.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub roadmap: Option<Roadmap>,
    pub messages: Vec<ChatMessage>,
    pub gate: Gate,
}

struct SessionState {
    roadmap: Option<Roadmap>,
    log: ChatLog,
    gate: Gate,
    /// Bumped on create/load/reset; a reply resolving against an older
    /// epoch is discarded instead of applied to a stale log.
    epoch: u64,
}

/// One user's active coaching session.
pub struct Session {
    deps: SessionDeps,
    engine: ChatEngine,
    state: RwLock<SessionState>,
    events: mpsc::UnboundedSender<SessionEvent>,
    auto_advance: bool,
    /// Handle to ourselves for the spawned auto-advance turn.
    me: Weak<Self>,
}

impl Session {
    /// Build a session and the receiving end of its event channel.
    pub fn new(
        config: &CoachConfig,
        deps: SessionDeps,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let engine = ChatEngine::new(Arc::clone(&deps.chat), Arc::clone(&deps.review));
        let session = Arc::new_cyclic(|me| Self {
            deps,
            engine,
            state: RwLock::new(SessionState {
                roadmap: None,
                log: ChatLog::new(),
                gate: Gate::Locked,
                epoch: 0,
            }),
            events,
            auto_advance: config.auto_advance,
            me: me.clone(),
        });
        (session, rx)
    }

    /// Current `(roadmap, log, gate)` tuple.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            roadmap: state.roadmap.clone(),
            messages: state.log.messages().to_vec(),
            gate: state.gate,
        }
    }

    /// The roadmap list for the view outside an active session.
    pub async fn list_roadmaps(&self) -> Result<Vec<RoadmapSummary>> {
        self.deps.store.list().await.map_err(Error::Api)
    }

    /// Create path: generate a roadmap, install it, and seed the chat with
    /// the welcome message. Nothing is installed on failure.
    pub async fn create(&self, request: &GenerationRequest) -> Result<Roadmap> {
        let generator = Generator::new(Arc::clone(&self.deps.generation));
        let roadmap = generator.generate(request).await?;

        let mut state = self.state.write().await;
        state.epoch += 1;
        state.gate = Gate::Locked;
        let mut log = ChatLog::new();
        log.seed_welcome(&roadmap.project_title);
        state.log = log;
        state.roadmap = Some(roadmap.clone());
        info!(title = %roadmap.project_title, "Created roadmap session");
        Ok(roadmap)
    }

    /// Load path: fetch a stored roadmap with its history and install it
    /// verbatim. The gate always comes back locked: a reload never
    /// preserves an in-flight unlock.
    pub async fn load(&self, id: i64) -> Result<Roadmap> {
        let stored = self.deps.store.get(id).await.map_err(Error::Api)?;
        validate_structure(&stored.roadmap)?;

        let mut state = self.state.write().await;
        state.epoch += 1;
        state.gate = Gate::Locked;
        state.log = ChatLog::from_history(stored.chat_history);
        state.roadmap = Some(stored.roadmap.clone());
        info!(roadmap_id = id, "Loaded roadmap session");
        Ok(stored.roadmap)
    }

    /// Reset path: discard the session and return the refreshed roadmap
    /// list. The caller is responsible for confirming with the user first.
    pub async fn reset(&self) -> Result<Vec<RoadmapSummary>> {
        {
            let mut state = self.state.write().await;
            state.epoch += 1;
            state.roadmap = None;
            state.log = ChatLog::new();
            state.gate = Gate::Locked;
        }
        info!("Session reset; returning to the roadmap list");
        self.list_roadmaps().await
    }

    /// Send one coach turn: plain text, or text plus a proof-of-work image
    /// (which routes to review). Returns the resolved model message.
    ///
    /// At most one turn may be in flight; a second call while the
    /// placeholder is pending fails with [`ChatError::TurnInFlight`].
    pub async fn send_turn(
        &self,
        text: &str,
        attachment: Option<Attachment>,
    ) -> Result<ChatMessage> {
        if text.trim().is_empty() && attachment.is_none() {
            return Err(ChatError::EmptyTurn.into());
        }

        let (placeholder_id, history, hint, roadmap_id, epoch) = {
            let mut state = self.state.write().await;
            let roadmap = state.roadmap.as_ref().ok_or(Error::NoSession)?;
            let roadmap_id = roadmap
                .id
                .ok_or(Error::Chat(ChatError::MissingRoadmapId))?;
            let hint = roadmap.context_hint()?;
            let user_message = match &attachment {
                Some(a) => ChatMessage::user_with_image(text, a.to_base64()),
                None => ChatMessage::user(text),
            };
            let placeholder_id = state.log.begin_turn(user_message).map_err(Error::Chat)?;
            let history = state.log.history_for_send();
            (placeholder_id, history, hint, roadmap_id, state.epoch)
        };

        let outcome = self
            .engine
            .run_turn(&history, &hint, roadmap_id, text, attachment.as_ref())
            .await;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            debug!("Discarding coach reply that arrived after reset");
            return Err(ChatError::SessionReset.into());
        }

        match outcome {
            Ok(outcome) => {
                // Gate first, then the visible text, under the same lock:
                // the unlock and the stripped reply land atomically.
                if outcome.mission_complete {
                    state.gate.unlock();
                    info!("Coach certified the current mission; completion unlocked");
                    let _ = self.events.send(SessionEvent::MissionVerified);
                }
                state.log.resolve_turn(
                    &placeholder_id,
                    outcome.text.clone(),
                    outcome.model_image.clone(),
                );
                let resolved = state
                    .log
                    .messages()
                    .iter()
                    .find(|m| m.id == placeholder_id)
                    .cloned()
                    .unwrap_or(ChatMessage {
                        id: placeholder_id,
                        role: Role::Model,
                        text: outcome.text,
                        image: None,
                        model_image: outcome.model_image,
                    });
                Ok(resolved)
            }
            Err(e) => {
                // The placeholder always resolves; a failed turn becomes an
                // error-flavored reply rather than a stuck pending message.
                state
                    .log
                    .resolve_turn(&placeholder_id, format!("Error: {e}"), None);
                Err(e.into())
            }
        }
    }

    /// Toggle a mission at `(week_index, mission_index)`.
    ///
    /// Forward completion requires the gate to be unlocked and consumes it;
    /// the local flag flips immediately and the remote commit runs in the
    /// background (failure is reported as [`SessionEvent::CommitFailed`],
    /// the flag is not rolled back). Un-completing is always allowed and
    /// never persisted. A successful completion also schedules the
    /// auto-advance turn when enabled.
    pub async fn toggle_mission(
        &self,
        week_index: usize,
        mission_index: usize,
    ) -> Result<ToggleAction> {
        let (action, roadmap_id) = {
            let mut state = self.state.write().await;
            let SessionState { roadmap, gate, .. } = &mut *state;
            let roadmap = roadmap.as_mut().ok_or(Error::NoSession)?;
            let roadmap_id = roadmap.id;
            let action = progress::apply_toggle(roadmap, gate, week_index, mission_index)?;
            (action, roadmap_id)
        };

        if let ToggleAction::Completed { mission_id } = &action {
            let _ = self.events.send(SessionEvent::MissionCompleted {
                mission_id: mission_id.clone(),
            });
            self.spawn_commit(roadmap_id, mission_id.clone());
            if self.auto_advance {
                self.spawn_auto_advance();
            }
        }
        Ok(action)
    }

    /// Fire-and-forget commit of a forward completion.
    fn spawn_commit(&self, roadmap_id: Option<i64>, mission_id: String) {
        let Some(roadmap_id) = roadmap_id else {
            warn!(mission = %mission_id, "Roadmap has no id; completion cannot be persisted");
            let _ = self.events.send(SessionEvent::CommitFailed {
                mission_id,
                reason: "the roadmap has not been assigned an id".to_string(),
            });
            return;
        };
        let completion = Arc::clone(&self.deps.completion);
        let events = self.events.clone();
        tokio::spawn(async move {
            match completion.commit(roadmap_id, &mission_id).await {
                Ok(()) => debug!(mission = %mission_id, "Completion committed"),
                Err(e) => {
                    let failure = ProgressError::CommitFailed {
                        mission_id: mission_id.clone(),
                        reason: e.to_string(),
                    };
                    warn!(error = %failure, "Keeping local state despite commit failure");
                    let _ = events.send(SessionEvent::CommitFailed {
                        mission_id,
                        reason: e.to_string(),
                    });
                }
            }
        });
    }

    /// Synthesize the follow-up turn after a completion. Subject to the
    /// same single-flight rule as a user turn.
    fn spawn_auto_advance(&self) {
        let Some(session) = self.me.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = session.send_turn(AUTO_ADVANCE_TEXT, None).await {
                warn!(error = %e, "Auto-advance turn failed");
                let _ = session.events.send(SessionEvent::AutoAdvanceFailed {
                    reason: e.to_string(),
                });
            }
        });
    }
}
