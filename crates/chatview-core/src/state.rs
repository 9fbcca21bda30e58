//! UI-agnostic conversation state
//!
//! These types are shared between the HTTP client and any front-end, and don't
//! depend on a specific UI framework.

use serde::{Deserialize, Serialize};

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: ChatRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a turn's sender. Any label other than `user` is treated as
/// the assistant, whatever name the server gives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(other)]
    Assistant,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "Assistant",
        }
    }
}

/// Request body posted to the chat endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response body: the server's echo of the user message plus its reply
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatExchange {
    pub user_message: Turn,
    pub bot_response: Turn,
}

/// Append-only list of turns in display order.
///
/// `revision` is bumped on every append so views can tell when to follow
/// the newest turn without diffing the list.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    revision: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_exchange(&mut self, exchange: ChatExchange) {
        self.turns.push(exchange.user_message);
        self.turns.push(exchange.bot_response);
        self.revision += 1;
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_uses_lowercase_on_the_wire() {
        let json = serde_json::to_string(&Turn::assistant("hello")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hello"}"#);
    }

    #[test]
    fn test_exchange_decodes_server_payload() {
        let body = r#"{
            "user_message": {"role": "user", "content": "hi"},
            "bot_response": {"role": "assistant", "content": "hello"}
        }"#;
        let exchange: ChatExchange = serde_json::from_str(body).unwrap();
        assert_eq!(exchange.user_message, Turn::user("hi"));
        assert_eq!(exchange.bot_response, Turn::assistant("hello"));
    }

    #[test]
    fn test_non_user_roles_decode_as_assistant() {
        let body = r#"{
            "user_message": {"role": "user", "content": "hi"},
            "bot_response": {"role": "bot", "content": "hello"}
        }"#;
        let exchange: ChatExchange = serde_json::from_str(body).unwrap();
        assert_eq!(exchange.user_message.role, ChatRole::User);
        assert_eq!(exchange.bot_response, Turn::assistant("hello"));
    }

    #[test]
    fn test_transcript_appends_in_order_and_bumps_revision() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());
        assert_eq!(transcript.revision(), 0);

        transcript.push_exchange(ChatExchange {
            user_message: Turn::user("hi"),
            bot_response: Turn::assistant("hello"),
        });
        transcript.push_exchange(ChatExchange {
            user_message: Turn::user("again"),
            bot_response: Turn::assistant("sure"),
        });

        let contents: Vec<&str> = transcript.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "hello", "again", "sure"]);
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript.revision(), 2);
    }
}
