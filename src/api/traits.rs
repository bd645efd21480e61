//! Backend-agnostic collaborator contracts.
//!
//! One trait per remote collaborator the core consumes. `HttpApi`
//! implements all of them against the production backend; tests swap in
//! stubs.

use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;

use crate::chat::model::ChatMessage;
use crate::error::ApiError;
use crate::roadmap::generate::GenerationRequest;
use crate::roadmap::model::{Roadmap, RoadmapSummary};

/// A binary attachment: a reference document for generation or a
/// proof-of-work image for review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub filename: Option<String>,
}

impl Attachment {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            filename: None,
        }
    }

    /// Builder: set the original filename.
    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.filename = Some(name.into());
        self
    }

    /// Standard base64 of the payload, as the wire format carries images.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// One reply from the chat collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct CoachReply {
    pub role: String,
    pub text: String,
}

/// One reply from the image-review collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewReply {
    pub text: String,
    #[serde(default, rename = "modelImage")]
    pub model_image: Option<String>,
}

/// A roadmap plus its chat history, as returned by the store's detail call.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredRoadmap {
    #[serde(flatten)]
    pub roadmap: Roadmap,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

/// Generation collaborator: turns a request into a raw curriculum payload.
///
/// Returns untyped JSON on purpose: the generation contract
/// (`roadmap::validate`) owns the decision of what is acceptable.
#[async_trait]
pub trait GenerationApi: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<serde_json::Value, ApiError>;
}

/// Chat collaborator: one batched coach reply per call.
///
/// `history` must end with the user message being answered.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn converse(
        &self,
        history: &[ChatMessage],
        context_hint: &str,
        roadmap_id: i64,
    ) -> Result<CoachReply, ApiError>;
}

/// Image-review collaborator: feedback on a submitted proof-of-work image.
#[async_trait]
pub trait ReviewApi: Send + Sync {
    async fn review(&self, attachment: &Attachment, prompt: &str)
    -> Result<ReviewReply, ApiError>;
}

/// Completion-commit collaborator: durably records a forward completion.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    async fn commit(&self, roadmap_id: i64, mission_id: &str) -> Result<(), ApiError>;
}

/// Roadmap store collaborator: list and detail reads.
#[async_trait]
pub trait RoadmapStoreApi: Send + Sync {
    async fn list(&self) -> Result<Vec<RoadmapSummary>, ApiError>;

    async fn get(&self, id: i64) -> Result<StoredRoadmap, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_base64_roundtrip() {
        let attachment = Attachment::new(vec![0x89, 0x50, 0x4e, 0x47], "image/png");
        assert_eq!(attachment.to_base64(), "iVBORw==");
    }

    #[test]
    fn review_reply_accepts_missing_model_image() {
        let reply: ReviewReply =
            serde_json::from_str(r#"{"text": "Nice brush control!"}"#).unwrap();
        assert!(reply.model_image.is_none());

        let reply: ReviewReply =
            serde_json::from_str(r#"{"text": "See this", "modelImage": "aGk="}"#).unwrap();
        assert_eq!(reply.model_image.as_deref(), Some("aGk="));
    }

    #[test]
    fn stored_roadmap_flattens_roadmap_fields() {
        let stored: StoredRoadmap = serde_json::from_str(
            r#"{
                "id": 7,
                "project_title": "Learn Go",
                "curriculum": [
                    {"week": 1, "theme": "Basics", "missions": [
                        {"id": "w1_m1", "title": "Install the toolchain", "is_completed": true}
                    ]}
                ],
                "chat_history": [
                    {"id": "1", "role": "model", "text": "Welcome back!"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(stored.roadmap.id, Some(7));
        assert_eq!(stored.chat_history.len(), 1);
        assert!(stored.roadmap.curriculum[0].missions[0].is_completed);
    }
}
