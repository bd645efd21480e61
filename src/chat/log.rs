//! The ordered conversation log and its single-flight invariant.
//!
//! A turn appends the user message and an empty model placeholder in one
//! step; the placeholder is patched in place exactly once when the reply
//! (or its failure text) arrives. While a placeholder is outstanding no
//! further turn may begin, so the log can never hold two consecutive empty
//! model placeholders.

use crate::error::ChatError;

use super::model::ChatMessage;

/// Append-only message log for one roadmap session.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    /// Id of the unresolved model placeholder, if a turn is in flight.
    pending: Option<String>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the log verbatim from stored history. A reload never
    /// resumes an in-flight turn.
    pub fn from_history(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            pending: None,
        }
    }

    /// Seed a fresh session with the single welcome message.
    pub fn seed_welcome(&mut self, project_title: &str) {
        debug_assert!(self.messages.is_empty());
        self.messages.push(ChatMessage::welcome(project_title));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_turn_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a turn: append `user_message` plus an empty model placeholder
    /// and return the placeholder id. Fails while another turn is pending.
    pub fn begin_turn(&mut self, user_message: ChatMessage) -> Result<String, ChatError> {
        if self.pending.is_some() {
            return Err(ChatError::TurnInFlight);
        }
        self.messages.push(user_message);
        let placeholder = ChatMessage::pending_model();
        let id = placeholder.id.clone();
        self.messages.push(placeholder);
        self.pending = Some(id.clone());
        Ok(id)
    }

    /// The history handed to the coach for the turn in flight: everything
    /// up to and including the new user message, without the placeholder.
    pub fn history_for_send(&self) -> Vec<ChatMessage> {
        let end = match self.pending {
            Some(_) => self.messages.len().saturating_sub(1),
            None => self.messages.len(),
        };
        self.messages[..end].to_vec()
    }

    /// Patch the pending placeholder with the resolved reply (or failure
    /// text). Returns `false` when `placeholder_id` is not the outstanding
    /// placeholder, meaning the reply belongs to a log that no longer exists.
    pub fn resolve_turn(
        &mut self,
        placeholder_id: &str,
        text: String,
        model_image: Option<String>,
    ) -> bool {
        if self.pending.as_deref() != Some(placeholder_id) {
            return false;
        }
        let Some(message) = self.messages.iter_mut().find(|m| m.id == placeholder_id) else {
            self.pending = None;
            return false;
        };
        message.text = text;
        message.model_image = model_image;
        self.pending = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::chat::model::Role;

    use super::*;

    #[test]
    fn begin_turn_appends_user_and_placeholder() {
        let mut log = ChatLog::new();
        let id = log.begin_turn(ChatMessage::user("hello")).unwrap();
        assert_eq!(log.messages().len(), 2);
        assert_eq!(log.messages()[0].role, Role::User);
        assert_eq!(log.messages()[1].id, id);
        assert!(log.messages()[1].is_pending_placeholder());
        assert!(log.is_turn_pending());
    }

    #[test]
    fn second_turn_while_pending_is_rejected() {
        let mut log = ChatLog::new();
        log.begin_turn(ChatMessage::user("one")).unwrap();
        let err = log.begin_turn(ChatMessage::user("two")).unwrap_err();
        assert!(matches!(err, ChatError::TurnInFlight));
        // The rejected turn must not have touched the log.
        assert_eq!(log.messages().len(), 2);
    }

    #[test]
    fn no_two_consecutive_empty_placeholders() {
        let mut log = ChatLog::new();
        let id = log.begin_turn(ChatMessage::user("one")).unwrap();
        let _ = log.begin_turn(ChatMessage::user("two"));
        log.resolve_turn(&id, "reply".to_string(), None);
        let _ = log.begin_turn(ChatMessage::user("three")).unwrap();

        let placeholders: Vec<bool> = log
            .messages()
            .iter()
            .map(ChatMessage::is_pending_placeholder)
            .collect();
        assert!(
            !placeholders.windows(2).any(|w| w[0] && w[1]),
            "log must never hold two consecutive empty model placeholders"
        );
    }

    #[test]
    fn history_for_send_excludes_placeholder() {
        let mut log = ChatLog::new();
        log.seed_welcome("Learn Rust");
        log.begin_turn(ChatMessage::user("What first?")).unwrap();
        let history = log.history_for_send();
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().text, "What first?");
    }

    #[test]
    fn resolve_patches_in_place_once() {
        let mut log = ChatLog::new();
        let id = log.begin_turn(ChatMessage::user("hi")).unwrap();
        assert!(log.resolve_turn(&id, "hello back".to_string(), None));
        assert_eq!(log.messages()[1].text, "hello back");
        assert!(!log.is_turn_pending());
        // A second resolve for the same id is a stale write.
        assert!(!log.resolve_turn(&id, "again".to_string(), None));
        assert_eq!(log.messages()[1].text, "hello back");
    }

    #[test]
    fn resolve_with_wrong_id_is_discarded() {
        let mut log = ChatLog::new();
        let _ = log.begin_turn(ChatMessage::user("hi")).unwrap();
        assert!(!log.resolve_turn("not-the-placeholder", "text".to_string(), None));
        assert!(log.is_turn_pending());
    }

    #[test]
    fn resolve_can_attach_a_model_image() {
        let mut log = ChatLog::new();
        let id = log.begin_turn(ChatMessage::user("review this")).unwrap();
        log.resolve_turn(&id, "Nice work".to_string(), Some("aGk=".to_string()));
        assert_eq!(log.messages()[1].model_image.as_deref(), Some("aGk="));
    }

    #[test]
    fn from_history_reconstructs_verbatim_without_pending() {
        let history = vec![
            ChatMessage::welcome("Learn Go"),
            ChatMessage::user("hello"),
        ];
        let log = ChatLog::from_history(history.clone());
        assert_eq!(log.messages(), history.as_slice());
        assert!(!log.is_turn_pending());
    }

    #[test]
    fn seed_welcome_is_the_only_message() {
        let mut log = ChatLog::new();
        log.seed_welcome("Learn Rust");
        assert_eq!(log.messages().len(), 1);
        assert!(log.messages()[0].text.contains("**Learn Rust**"));
    }
}
