//! One-turn mediation over the chat and image-review collaborators.

use std::sync::Arc;

use tracing::debug;

use crate::api::traits::{Attachment, ChatApi, ReviewApi};
use crate::error::ChatError;

use super::model::ChatMessage;
use super::signal::parse_coach_reply;

/// The resolved result of one coach turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Display text, sentinel already stripped.
    pub text: String,
    pub model_image: Option<String>,
    /// Whether the coach certified the current mission in this reply.
    pub mission_complete: bool,
}

/// Mediates coach turns. Holds no log state; the session owns the log and
/// feeds a snapshot of it into each turn.
pub struct ChatEngine {
    chat: Arc<dyn ChatApi>,
    review: Arc<dyn ReviewApi>,
}

impl ChatEngine {
    pub fn new(chat: Arc<dyn ChatApi>, review: Arc<dyn ReviewApi>) -> Self {
        Self { chat, review }
    }

    /// Run one turn. An attachment routes the turn to image review, with
    /// `user_text` as the review prompt; otherwise the turn is exactly one
    /// chat call. The two paths are mutually exclusive.
    ///
    /// Image review carries no completion signal: certification only ever
    /// arrives through a chat reply.
    pub async fn run_turn(
        &self,
        history: &[ChatMessage],
        context_hint: &str,
        roadmap_id: i64,
        user_text: &str,
        attachment: Option<&Attachment>,
    ) -> Result<TurnOutcome, ChatError> {
        match attachment {
            Some(attachment) => {
                debug!(mime = %attachment.mime_type, "Routing turn to image review");
                let reply = self.review.review(attachment, user_text).await?;
                Ok(TurnOutcome {
                    text: reply.text,
                    model_image: reply.model_image,
                    mission_complete: false,
                })
            }
            None => {
                let reply = self
                    .chat
                    .converse(history, context_hint, roadmap_id)
                    .await?;
                let parsed = parse_coach_reply(&reply.text);
                Ok(TurnOutcome {
                    text: parsed.text,
                    model_image: None,
                    mission_complete: parsed.mission_complete,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::api::traits::{CoachReply, ReviewReply};
    use crate::error::ApiError;

    use super::*;

    #[derive(Default)]
    struct StubChat {
        reply: String,
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ChatApi for StubChat {
        async fn converse(
            &self,
            _history: &[ChatMessage],
            _context_hint: &str,
            _roadmap_id: i64,
        ) -> Result<CoachReply, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Timeout {
                    endpoint: "/chat".to_string(),
                });
            }
            Ok(CoachReply {
                role: "model".to_string(),
                text: self.reply.clone(),
            })
        }
    }

    #[derive(Default)]
    struct StubReview {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReviewApi for StubReview {
        async fn review(
            &self,
            _attachment: &Attachment,
            prompt: &str,
        ) -> Result<ReviewReply, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ReviewReply {
                text: format!("Reviewed: {prompt}"),
                model_image: Some("aGk=".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn text_turn_uses_chat_and_parses_sentinel() {
        let chat = Arc::new(StubChat {
            reply: "Great job! [MISSION_COMPLETE]".to_string(),
            ..Default::default()
        });
        let review = Arc::new(StubReview::default());
        let engine = ChatEngine::new(chat.clone(), review.clone());

        let outcome = engine
            .run_turn(&[], "week 1", 7, "done!", None)
            .await
            .unwrap();
        assert_eq!(outcome.text, "Great job!");
        assert!(outcome.mission_complete);
        assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
        assert_eq!(review.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn attachment_routes_to_review_and_never_certifies() {
        let chat = Arc::new(StubChat::default());
        let review = Arc::new(StubReview::default());
        let engine = ChatEngine::new(chat.clone(), review.clone());

        let attachment = Attachment::new(vec![1, 2, 3], "image/png");
        let outcome = engine
            .run_turn(
                &[],
                "week 1",
                7,
                "here is my sketch",
                Some(&attachment),
            )
            .await
            .unwrap();
        assert_eq!(outcome.text, "Reviewed: here is my sketch");
        assert_eq!(outcome.model_image.as_deref(), Some("aGk="));
        assert!(!outcome.mission_complete);
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
        assert_eq!(review.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_failure_maps_to_chat_error() {
        let chat = Arc::new(StubChat {
            fail: true,
            ..Default::default()
        });
        let engine = ChatEngine::new(chat, Arc::new(StubReview::default()));
        let err = engine
            .run_turn(&[], "week 1", 7, "hello", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
    }
}
