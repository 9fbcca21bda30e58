use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::ChatError;
use crate::state::{ChatExchange, ChatRequest};

pub const DEFAULT_ENDPOINT: &str = "https://customerchatbot.up.railway.app/api/chat/";

/// Anything that can turn a user message into a server-confirmed exchange
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, message: &str) -> Result<ChatExchange, ChatError>;
}

/// JSON-over-HTTP client for the remote chat endpoint.
///
/// No timeout or retry is configured: a request runs until the server
/// answers or the connection fails.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn send(&self, message: &str) -> Result<ChatExchange, ChatError> {
        let request = ChatRequest {
            message: message.to_string(),
        };

        debug!(endpoint = %self.endpoint, chars = message.chars().count(), "posting chat message");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ChatError::Status { status, body });
        }

        let exchange: ChatExchange = serde_json::from_str(&body)?;
        debug!(status = %status, "chat exchange received");
        Ok(exchange)
    }
}
