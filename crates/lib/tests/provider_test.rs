//! # Provider Adapter Tests
//!
//! Exercises the Gemini and local adapters against `wiremock` servers.

use consultkit::errors::ProviderError;
use consultkit::providers::ai::{gemini::GeminiProvider, local::LocalAiProvider, AiProvider};
use consultkit_test_utils::setup_tracing;
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse_body(events: &[serde_json::Value]) -> String {
    events
        .iter()
        .map(|event| format!("data: {event}\r\n\r\n"))
        .collect()
}

fn gemini_chunk(text: &str) -> serde_json::Value {
    json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
}

#[tokio::test]
async fn test_gemini_generate_sends_search_tool_and_returns_text() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "Hello"}]}],
            "tools": [{"google_search": {}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_chunk("Hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(server.uri(), "test-key".to_string()).unwrap();
    let text = provider
        .generate("models/gemini-2.5-flash", "Hello", true)
        .await
        .unwrap();
    assert_eq!(text, "Hi there");
}

#[tokio::test]
async fn test_gemini_stream_relays_fragments_in_order_and_skips_textless_chunks() {
    setup_tracing();
    let server = MockServer::start().await;
    let body = sse_body(&[
        gemini_chunk("Hello "),
        json!({"candidates": [{"content": {"role": "model", "parts": []}}]}),
        gemini_chunk("World"),
    ]);
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(server.uri(), "test-key".to_string()).unwrap();
    let stream = provider
        .generate_stream("gemini-2.5-flash", "Hello", true)
        .await
        .unwrap();
    let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;
    assert_eq!(fragments, vec!["Hello ", "World"]);
}

#[tokio::test]
async fn test_gemini_non_success_status_is_a_provider_error() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(server.uri(), "test-key".to_string()).unwrap();
    let err = provider
        .generate_stream("gemini-2.5-flash", "Hello", true)
        .await
        .err()
        .expect("status 429 must fail");
    match err {
        ProviderError::AiApi { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("quota exceeded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_gemini_transport_failure_does_not_reveal_api_key() {
    setup_tracing();
    // Nothing listens on port 1, so the request fails before any response.
    let provider =
        GeminiProvider::new("http://127.0.0.1:1/v1beta".to_string(), "SECRETKEY123".to_string())
            .unwrap();

    let err = provider
        .generate("gemini-2.5-flash", "Hello", true)
        .await
        .expect_err("unreachable host must fail");
    assert!(matches!(err, ProviderError::AiRequest(_)));
    assert!(!err.to_string().contains("SECRETKEY123"), "{err}");
    assert!(!format!("{err:?}").contains("SECRETKEY123"), "{err:?}");

    let err = provider
        .generate_stream("gemini-2.5-flash", "Hello", true)
        .await
        .err()
        .expect("unreachable host must fail");
    assert!(!err.to_string().contains("SECRETKEY123"), "{err}");
}

#[tokio::test]
async fn test_local_provider_streams_chat_completion_deltas() {
    setup_tracing();
    let server = MockServer::start().await;
    let body = format!(
        "{}data: [DONE]\n\n",
        sse_body(&[
            json!({"choices": [{"delta": {"role": "assistant"}}]}),
            json!({"choices": [{"delta": {"content": "Draft"}}]}),
            json!({"choices": [{"delta": {"content": " ready"}}]}),
        ])
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let provider =
        LocalAiProvider::new(format!("{}/v1/chat/completions", server.uri()), None).unwrap();
    let stream = provider
        .generate_stream("local-model", "Hello", true)
        .await
        .unwrap();
    let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;
    assert_eq!(fragments, vec!["Draft", " ready"]);
}

#[tokio::test]
async fn test_local_provider_generate_returns_message_content() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "{2020: 1, 2021: 2, 2022: 3}"}}]
        })))
        .mount(&server)
        .await;

    let provider =
        LocalAiProvider::new(format!("{}/v1/chat/completions", server.uri()), None).unwrap();
    let text = provider.generate("", "Hello", false).await.unwrap();
    assert_eq!(text, "{2020: 1, 2021: 2, 2022: 3}");
}
