//! Conversation adapter for the chat-completion backend
//!
//! Keeps a bounded in-memory history of prior exchanges and trades it for
//! replies. Backend failures never corrupt history: the user entry stays
//! in place and the caller receives a spoken-friendly fallback line.

use std::collections::VecDeque;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::config::ChatConfig;
use crate::{Error, Result};

/// Default chat endpoint base
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Request timeout for chat completions
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fallback reply when the backend rate-limits us
pub const FALLBACK_RATE_LIMITED: &str =
    "I'm receiving too many requests right now. Please try again in a moment.";

/// Fallback reply when the backend is unreachable
pub const FALLBACK_CONNECTION: &str =
    "I'm having trouble connecting to my servers. Please check your internet connection.";

/// Fallback reply for any other backend failure
pub const FALLBACK_GENERIC: &str =
    "I encountered an error processing your request. Please try again.";

/// Who said a conversation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person speaking to the assistant
    User,
    /// The assistant's reply
    Assistant,
}

/// One conversation entry, in strict chronological order
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChatMessage {
    /// Entry author
    pub role: Role,
    /// Entry text
    pub content: String,
}

#[derive(serde::Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(serde::Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(serde::Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(serde::Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Chat-completion client with bounded conversation history
pub struct ChatClient {
    client: reqwest::Client,
    api_key: SecretString,
    api_base: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    system_prompt: String,
    history: VecDeque<ChatMessage>,
    max_history: usize,
}

impl ChatClient {
    /// Create a new conversation adapter
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the API key is empty or the HTTP client
    /// cannot be built.
    pub fn new(api_key: SecretString, chat: &ChatConfig) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("API key required for chat".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            model: chat.model.clone(),
            max_tokens: chat.max_tokens,
            temperature: chat.temperature,
            system_prompt: chat.system_prompt.clone(),
            history: VecDeque::new(),
            max_history: chat.max_history,
        })
    }

    /// Override the API base URL (for OpenAI-compatible backends)
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Send a user utterance and return the assistant's reply.
    ///
    /// The user entry is appended to history before the request, and stays
    /// there even when the backend fails, so the exchange can be
    /// retried with context intact. Failures map onto spoken-friendly
    /// fallback lines instead of propagating.
    pub async fn respond(&mut self, user_text: &str) -> String {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            tracing::warn!("empty user message, skipping chat request");
            return String::new();
        }

        self.append(Role::User, user_text);
        tracing::info!(message = user_text, "sending chat request");

        match self.complete().await {
            Ok(reply) => {
                self.append(Role::Assistant, &reply);
                tracing::info!(reply = %reply, "chat response received");
                reply
            }
            Err(Error::Http(e)) if e.is_connect() || e.is_timeout() => {
                tracing::error!(error = %e, "chat backend unreachable");
                FALLBACK_CONNECTION.to_string()
            }
            Err(Error::Chat(msg)) if msg.starts_with("429") => {
                tracing::error!(error = %msg, "chat backend rate limited");
                FALLBACK_RATE_LIMITED.to_string()
            }
            Err(e) => {
                tracing::error!(error = %e, "chat request failed");
                FALLBACK_GENERIC.to_string()
            }
        }
    }

    /// Append an entry, evicting the oldest beyond the history bound.
    ///
    /// The system prompt lives outside the bound and is never evicted.
    pub fn append(&mut self, role: Role, content: &str) {
        self.history.push_back(ChatMessage {
            role,
            content: content.to_string(),
        });

        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }

    /// Entries currently in context, oldest first
    #[must_use]
    pub fn history(&self) -> &VecDeque<ChatMessage> {
        &self.history
    }

    /// Drop all exchanges, keeping the system prompt
    pub fn reset(&mut self) {
        self.history.clear();
        tracing::info!("conversation history reset");
    }

    /// Send the full remaining history to the backend
    async fn complete(&self) -> Result<String> {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: &self.system_prompt,
        });
        messages.extend(self.history.iter().map(|m| WireMessage {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &m.content,
        }));

        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Chat(format!("{} {body}", status.as_u16())));
        }

        let result: CompletionResponse = response.json().await?;
        let reply = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| Error::Chat("empty completion response".to_string()))?;

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChatConfig;

    fn test_client(max_history: usize) -> ChatClient {
        ChatClient::new(
            SecretString::from("sk-test"),
            &ChatConfig {
                model: "gpt-4o".to_string(),
                max_tokens: 500,
                temperature: 0.7,
                system_prompt: "test".to_string(),
                max_history,
            },
        )
        .unwrap()
    }

    #[test]
    fn history_is_bounded() {
        let mut client = test_client(10);

        // 11 exchanges: 22 entries pushed, bound is 10
        for i in 0..11 {
            client.append(Role::User, &format!("question {i}"));
            client.append(Role::Assistant, &format!("answer {i}"));
        }

        assert_eq!(client.history().len(), 10);
        // Oldest evicted first: the survivors are the 10 most recent
        assert_eq!(client.history()[0].content, "question 6");
        assert_eq!(client.history()[9].content, "answer 10");
    }

    #[test]
    fn append_preserves_order() {
        let mut client = test_client(10);
        client.append(Role::User, "first");
        client.append(Role::Assistant, "second");
        client.append(Role::User, "third");

        let roles: Vec<Role> = client.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
    }

    #[test]
    fn reset_clears_history() {
        let mut client = test_client(10);
        client.append(Role::User, "hello");
        client.reset();
        assert!(client.history().is_empty());
    }

    #[tokio::test]
    async fn failed_backend_call_keeps_user_entry() {
        // Point at a closed port so the request fails at connect
        let mut client = test_client(10).with_api_base("http://127.0.0.1:9");

        let reply = client.respond("are you there?").await;
        assert!(!reply.is_empty());

        // The user entry survives the failure; no assistant entry was added
        assert_eq!(client.history().len(), 1);
        assert_eq!(client.history()[0].role, Role::User);
        assert_eq!(client.history()[0].content, "are you there?");
    }

    #[tokio::test]
    async fn empty_message_skips_backend() {
        // Unreachable base: a network attempt would error, not return ""
        let mut client = test_client(10).with_api_base("http://127.0.0.1:9");

        let reply = client.respond("   ").await;
        assert!(reply.is_empty());
        assert!(client.history().is_empty());
    }
}
