//! OpenAI chat-completion client implementation.

use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::{AiClient, AiClientMetadata, AiError};

/// Default public OpenAI endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI API request message
#[derive(Serialize, Debug)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// OpenAI API request body
#[derive(Serialize, Debug)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

/// OpenAI API response choice
#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

/// OpenAI API response message
#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI API response
#[derive(Deserialize, Debug)]
struct OpenAiResponse {
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<Usage>,
}

/// OpenAI API usage statistics
#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

/// OpenAI chat-completion client.
pub struct OpenAiAiClient {
    /// HTTP client for API requests
    client: Client,
    /// API key sent as a bearer token
    api_key: String,
    /// Model identifier
    model: String,
    /// Fully resolved `/v1/chat/completions` endpoint
    endpoint: Url,
}

impl OpenAiAiClient {
    /// Creates a client for the API rooted at `base_url`.
    pub fn new(model: String, api_key: String, base_url: &str) -> Result<Self> {
        let endpoint = chat_completions_url(base_url)?;
        debug!(base_url, endpoint = %endpoint, "Constructed chat completions URL");

        Ok(Self {
            client: super::build_http_client()?,
            api_key,
            model,
            endpoint,
        })
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AiError> {
        let request = OpenAiRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        debug!(
            system_prompt_len = system_prompt.len(),
            user_prompt_len = user_prompt.len(),
            model = %self.model,
            "Built chat completion payload"
        );
        info!(url = %self.endpoint, model = %self.model, "Sending request to OpenAI API");

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::from_status(status, body));
        }

        let completion: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        debug!(
            choice_count = completion.choices.len(),
            model = ?completion.model,
            usage = ?completion.usage,
            "Received OpenAI API response"
        );

        let text = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::InvalidResponse("No choices in response".to_string()))?
            .message
            .content
            .ok_or_else(|| AiError::InvalidResponse("Choice has no message content".to_string()))?;

        debug!(response_content = %text, "OpenAI raw response");
        Ok(text)
    }
}

/// Resolves the chat completions endpoint below `base_url`.
fn chat_completions_url(base_url: &str) -> Result<Url> {
    let base = base_url.trim_end_matches('/');
    Url::parse(&format!("{base}/v1/chat/completions"))
        .with_context(|| format!("Invalid OpenAI base URL: {base_url}"))
}

impl AiClient for OpenAiAiClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, AiError>> + Send + 'a>> {
        Box::pin(self.complete(system_prompt, user_prompt))
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: "OpenAI".to_string(),
            model: self.model.clone(),
        }
    }
}
