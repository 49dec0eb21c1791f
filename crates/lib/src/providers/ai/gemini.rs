use super::{sse, AiProvider, TextStream};
use crate::errors::ProviderError;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// The public Gemini REST endpoint, without the trailing `/models/...` path.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Header carrying the API key. Keeps the key out of URLs, which transport
/// errors and access logs echo.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

// --- Gemini-specific request and response structures ---

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Deserialize, Debug, Default)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<GeminiApiError>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<ContentResponse>,
}

#[derive(Deserialize, Debug)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize, Debug)]
struct PartResponse {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GeminiApiError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

impl GeminiResponse {
    /// Concatenates the text parts of the first candidate, if any.
    fn text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Parses one streamed event into its text, surfacing in-band API errors.
fn parse_stream_event(payload: &str) -> Result<Option<String>, ProviderError> {
    let event: GeminiResponse = serde_json::from_str(payload)
        .map_err(|e| ProviderError::AiDeserialization(e.to_string()))?;
    if let Some(error) = event.error {
        return Err(ProviderError::AiApi {
            status: error.code,
            body: error.message,
        });
    }
    Ok(event.text())
}

// --- Gemini Provider implementation ---

/// A provider for interacting with the Google Gemini API.
#[derive(Clone)]
pub struct GeminiProvider {
    client: ReqwestClient,
    api_base: String,
    api_key: String,
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider`.
    ///
    /// `api_base` is the versioned API root, e.g. [`DEFAULT_GEMINI_API_BASE`].
    pub fn new(api_base: String, api_key: String) -> Result<Self, ProviderError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(ProviderError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{model}:{method}", self.api_base)
    }

    fn request_body<'a>(prompt: &'a str, use_search: bool) -> GeminiRequest<'a> {
        let tools = if use_search {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };
        GeminiRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            tools,
        }
    }

    async fn send(
        &self,
        url: String,
        query: &[(&str, &str)],
        prompt: &str,
        use_search: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .query(query)
            .json(&Self::request_body(prompt, use_search))
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
impl AiProvider for GeminiProvider {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        use_search: bool,
    ) -> Result<String, ProviderError> {
        info!(model, use_search, "--> Sending prompt to Gemini");
        let url = self.endpoint(model, "generateContent");
        let response = self.send(url, &[], prompt, use_search).await?;

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::AiRequest(e.without_url()))?;
        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::AiDeserialization(e.to_string()))?;

        let text = gemini_response.text().unwrap_or_else(|| {
            warn!("Gemini response contained no text parts");
            String::new()
        });
        debug!("<-- Response from Gemini: {}", text);
        Ok(text)
    }

    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        use_search: bool,
    ) -> Result<TextStream, ProviderError> {
        info!(model, use_search, "--> Opening Gemini stream");
        let url = self.endpoint(model, "streamGenerateContent");
        let response = self
            .send(url, &[("alt", "sse")], prompt, use_search)
            .await?;
        Ok(sse::text_stream(
            response.bytes_stream(),
            parse_stream_event,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_accepts_prefixed_model_names() {
        let provider = GeminiProvider::new("http://host/v1beta/".into(), "k".into()).unwrap();
        assert_eq!(
            provider.endpoint("models/gemini-2.5-flash", "generateContent"),
            "http://host/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            provider.endpoint("gemini-2.5-flash", "streamGenerateContent"),
            "http://host/v1beta/models/gemini-2.5-flash:streamGenerateContent"
        );
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let provider =
            GeminiProvider::new("http://host/v1beta".into(), "SECRETKEY123".into()).unwrap();
        let rendered = format!("{provider:?}");
        assert!(!rendered.contains("SECRETKEY123"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn request_body_attaches_search_tool_only_when_enabled() {
        let with_search = serde_json::to_value(GeminiProvider::request_body("hi", true)).unwrap();
        assert_eq!(with_search["tools"][0]["google_search"], serde_json::json!({}));

        let without = serde_json::to_value(GeminiProvider::request_body("hi", false)).unwrap();
        assert!(without.get("tools").is_none());
        assert_eq!(without["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn stream_event_without_text_is_skipped() {
        let payload = r#"{"candidates":[{"content":{"parts":[{"functionCall":{}}]}}]}"#;
        assert_eq!(parse_stream_event(payload).unwrap(), None);

        let payload = r#"{"candidates":[{"finishReason":"STOP"}]}"#;
        assert_eq!(parse_stream_event(payload).unwrap(), None);
    }

    #[test]
    fn stream_event_error_becomes_api_error() {
        let payload = r#"{"error":{"code":429,"message":"quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        match parse_stream_event(payload) {
            Err(ProviderError::AiApi { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("expected AiApi error, got {other:?}"),
        }
    }
}
