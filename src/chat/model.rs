//! Chat message model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One entry in the append-only conversation log.
///
/// Field names follow the stored wire format (`modelImage`). Images ride
/// inline as base64 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Time-ordered id. New messages use UUIDv7 so ids sort in send order;
    /// history loaded from the store keeps its ids verbatim.
    pub id: String,
    pub role: Role,
    pub text: String,
    /// User-submitted image, base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Model-submitted image, base64.
    #[serde(default, rename = "modelImage", skip_serializing_if = "Option::is_none")]
    pub model_image: Option<String>,
}

/// Id of the synthesized welcome message seeding a fresh session.
pub const WELCOME_ID: &str = "init";

impl ChatMessage {
    /// A user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            role: Role::User,
            text: text.into(),
            image: None,
            model_image: None,
        }
    }

    /// A user turn carrying a proof-of-work image.
    pub fn user_with_image(text: impl Into<String>, image_base64: impl Into<String>) -> Self {
        Self {
            image: Some(image_base64.into()),
            ..Self::user(text)
        }
    }

    /// The empty model placeholder appended while a reply is pending.
    pub fn pending_model() -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            role: Role::Model,
            text: String::new(),
            image: None,
            model_image: None,
        }
    }

    /// The single welcome message seeded after roadmap creation.
    pub fn welcome(project_title: &str) -> Self {
        Self {
            id: WELCOME_ID.to_string(),
            role: Role::Model,
            text: format!(
                "Hello! I'm Grow, your AI learning coach. Your **{project_title}** \
                 roadmap is ready. Shall we get started? What would you like to know?"
            ),
            image: None,
            model_image: None,
        }
    }

    /// True for an unresolved model placeholder.
    pub fn is_pending_placeholder(&self) -> bool {
        self.role == Role::Model && self.text.is_empty() && self.model_image.is_none()
    }
}
