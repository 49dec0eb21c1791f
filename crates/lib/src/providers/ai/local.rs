use super::{sse, AiProvider, TextStream};
use crate::errors::ProviderError;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

// --- OpenAI-compatible request and response structures ---

#[derive(Serialize)]
struct LocalAiRequest<'a> {
    messages: Vec<LocalAiMessage<'a>>,
    #[serde(skip_serializing_if = "str::is_empty")]
    model: &'a str,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct LocalAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct LocalAiResponse {
    choices: Vec<LocalAiChoice>,
}

#[derive(Deserialize, Debug)]
struct LocalAiChoice {
    message: LocalAiResponseMessage,
}

#[derive(Deserialize, Debug)]
struct LocalAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct LocalAiChunk {
    #[serde(default)]
    choices: Vec<LocalAiChunkChoice>,
}

#[derive(Deserialize, Debug)]
struct LocalAiChunkChoice {
    #[serde(default)]
    delta: LocalAiDelta,
}

#[derive(Deserialize, Debug, Default)]
struct LocalAiDelta {
    #[serde(default)]
    content: Option<String>,
}

fn parse_stream_chunk(payload: &str) -> Result<Option<String>, ProviderError> {
    let chunk: LocalAiChunk = serde_json::from_str(payload)
        .map_err(|e| ProviderError::AiDeserialization(e.to_string()))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content))
}

// --- Local Provider implementation ---

/// A provider for a local or OpenAI-compatible chat completions API.
///
/// These servers have no web-search tool, so the `use_search` flag is ignored.
#[derive(Clone)]
pub struct LocalAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
}

impl fmt::Debug for LocalAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalAiProvider")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl LocalAiProvider {
    /// Creates a new `LocalAiProvider` posting to the full `api_url`.
    pub fn new(api_url: String, api_key: Option<String>) -> Result<Self, ProviderError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(ProviderError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }

    async fn send(
        &self,
        model: &str,
        prompt: &str,
        stream: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let request_body = LocalAiRequest {
            messages: vec![LocalAiMessage {
                role: "user",
                content: prompt,
            }],
            model,
            temperature: 0.2,
            stream,
        };

        let mut request_builder = self.client.post(&self.api_url);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ProviderError::AiRequest(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AiApi { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl AiProvider for LocalAiProvider {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        use_search: bool,
    ) -> Result<String, ProviderError> {
        if use_search {
            debug!("Local provider has no search tool; ignoring use_search");
        }
        info!(model, "--> Sending prompt to local AI provider");
        let response = self.send(model, prompt, false).await?;

        let local_ai_response: LocalAiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::AiDeserialization(e.without_url().to_string()))?;

        let raw_response = local_ai_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        debug!("<-- Response from local AI provider: {}", raw_response);
        Ok(raw_response)
    }

    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        use_search: bool,
    ) -> Result<TextStream, ProviderError> {
        if use_search {
            debug!("Local provider has no search tool; ignoring use_search");
        }
        info!(model, "--> Opening local AI provider stream");
        let response = self.send(model, prompt, true).await?;
        Ok(sse::text_stream(response.bytes_stream(), parse_stream_chunk))
    }
}
