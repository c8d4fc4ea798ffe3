//! Chat-completion proxy: token refresh and prompt submission.

use super::{endpoint_url, FetchClient, FetchError};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Bearer key and base URL of the chat-completion proxy.
#[derive(Clone)]
pub struct ChatGptCredentials {
    api_key: String,
    endpoint: String,
}

impl ChatGptCredentials {
    /// Bundle a key with the proxy's base URL.
    #[must_use]
    pub fn new(api_key: &str, endpoint: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

impl fmt::Debug for ChatGptCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatGptCredentials")
            .field("api_key", &"[MASKED]")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct PromptRequest<'a> {
    id: String,
    conversation: Option<&'a str>,
    context: &'a str,
    prompt: &'a str,
}

impl FetchClient {
    fn chatgpt(&self) -> Result<&ChatGptCredentials, FetchError> {
        self.chatgpt
            .as_ref()
            .ok_or(FetchError::MissingConfig("chatgpt_api_key / chatgpt_api_endpoint"))
    }

    /// Asks the proxy to refresh its upstream access token.
    ///
    /// Returns the HTTP status as-is; the caller decides what counts as success.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::MissingConfig` without credentials, or
    /// `FetchError::Transport` if the request cannot be sent.
    pub async fn chat_refresh_auth(&self) -> Result<StatusCode, FetchError> {
        let creds = self.chatgpt()?;
        let response = self
            .client
            .get(endpoint_url(&creds.endpoint, "refresh_auth"))
            .header("Authorization", creds.bearer())
            .send()
            .await?;

        Ok(response.status())
    }

    /// Submits a prompt, optionally continuing an existing conversation.
    ///
    /// A non-200 answer is not an error: it comes back as
    /// `{"status": "error", "error": <response body>}`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::MissingConfig` without credentials,
    /// `FetchError::Transport` on network failures and `FetchError::Decode`
    /// if a 200 response is not JSON.
    pub async fn chat_prompt(
        &self,
        prompt: &str,
        context: &str,
        conversation: Option<&str>,
    ) -> Result<Value, FetchError> {
        let creds = self.chatgpt()?;
        let body = PromptRequest {
            id: Uuid::new_v4().to_string(),
            conversation,
            context,
            prompt,
        };
        debug!(id = %body.id, conversation = ?conversation, "Submitting chat prompt");

        let response = self
            .client
            .post(endpoint_url(&creds.endpoint, "prompt"))
            .header("Authorization", creds.bearer())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if status != StatusCode::OK {
            debug!(status = %status, "Chat prompt rejected");
            return Ok(json!({
                "status": "error",
                "error": text,
            }));
        }

        Ok(serde_json::from_str(&text)?)
    }
}
