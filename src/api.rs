use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Base URL of the StudyBot backend. Fixed at build time; there is no
/// runtime configuration surface.
pub const API_URL: &str = "http://localhost:8000";

/// Substituted for the reply whenever the request itself goes wrong
/// (transport error, non-2xx status, or an unreadable body).
pub const CONNECT_FALLBACK: &str = "Sorry, I am having trouble connecting to the server.";

#[derive(Serialize)]
struct ChatRequest {
    message: String,
    thread_id: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Send one message and always come back with something displayable.
    /// Fail-soft: every error path collapses into [`CONNECT_FALLBACK`], so
    /// the chat loop never has to distinguish failure kinds.
    pub async fn send(&self, message: &str, thread_id: &str) -> String {
        match self.try_send(message, thread_id).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!("chat request failed: {err:#}");
                CONNECT_FALLBACK.to_string()
            }
        }
    }

    async fn try_send(&self, message: &str, thread_id: &str) -> Result<String> {
        let url = format!("{}/chat", self.base_url);

        let request = ChatRequest {
            message: message.to_string(),
            thread_id: thread_id.to_string(),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "chat request failed with status: {}",
                response.status()
            ));
        }

        let chat_response: ChatResponse = response.json().await?;
        Ok(chat_response.response)
    }
}
