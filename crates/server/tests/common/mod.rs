//! # Common Test Utilities
//!
//! `TestApp` spawns the real server on a random port, configured through a
//! temporary `config.yml` whose Gemini endpoint points at an
//! `httpmock::MockServer`.

// Allow unused code because this is a test utility module, and not all
// functions might be used by every test file that includes it.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use consultkit::providers::ai::AiProvider;
use consultkit_server::{
    config, router,
    state::{build_app_state, build_app_state_with_provider, AppState},
};
use httpmock::{Method, Mock, MockServer};
use reqwest::Client;
use serde_json::json;
use std::{fs, net::SocketAddr};
use tempfile::{tempdir, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

pub const MOCK_MODEL: &str = "gemini-2.5-flash";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub app_state: AppState,
    _config_dir: Option<TempDir>,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server with a Gemini provider aimed at the mock server.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_files(None).await
    }

    /// Like [`TestApp::spawn`], additionally writing `prompt_yml` next to the config.
    pub async fn spawn_with_files(prompt_yml: Option<&str>) -> Result<Self> {
        let mock_server = MockServer::start();

        let config_dir = tempdir()?;
        let config_path = config_dir.path().join("config.yml");
        let config_content = format!(
            r#"
port: 0
model:
  provider: "gemini"
  api_url: "{}"
  api_key: "test-key"
  model_name: "{MOCK_MODEL}"
export:
  pandoc_path: "/nonexistent/pandoc"
"#,
            mock_server.base_url()
        );
        fs::write(&config_path, config_content)?;
        if let Some(prompts) = prompt_yml {
            fs::write(config_dir.path().join("prompt.yml"), prompts)?;
        }

        let config = config::get_config(Some(config_path.to_str().unwrap()))?;
        let app_state = build_app_state(config)?;

        let mut app = TestApp::spawn_with_state(app_state, mock_server).await?;
        app._config_dir = Some(config_dir);
        Ok(app)
    }

    /// Spawns the server around an injected provider (e.g. `MockAiProvider`).
    pub async fn spawn_with_provider(ai_provider: Box<dyn AiProvider>) -> Result<Self> {
        let config_dir = tempdir()?;
        let config_path = config_dir.path().join("config.yml");
        fs::write(
            &config_path,
            "port: 0\nmodel:\n  provider: \"local\"\n  api_url: \"http://127.0.0.1:9/unused\"\n",
        )?;
        let config = config::get_config(Some(config_path.to_str().unwrap()))?;
        let app_state = build_app_state_with_provider(config, ai_provider)?;

        let mut app = TestApp::spawn_with_state(app_state, MockServer::start()).await?;
        app._config_dir = Some(config_dir);
        Ok(app)
    }

    pub async fn spawn_with_state(app_state: AppState, mock_server: MockServer) -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            app_state: app_state_for_harness,
            _config_dir: None,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.address)
    }

    /// Mocks `streamGenerateContent` for prompts containing `prompt_contains`,
    /// answering with one SSE event per fragment.
    pub fn mock_gemini_stream(&self, prompt_contains: &str, fragments: &[&str]) -> Mock<'_> {
        let body: String = fragments
            .iter()
            .map(|text| {
                let event = json!({
                    "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
                });
                format!("data: {event}\r\n\r\n")
            })
            .collect();
        self.mock_server.mock(|when, then| {
            when.method(Method::POST)
                .path(format!("/models/{MOCK_MODEL}:streamGenerateContent"))
                .query_param("alt", "sse")
                .header("x-goog-api-key", "test-key")
                .body_contains(prompt_contains);
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(body);
        })
    }

    /// Mocks `generateContent` for prompts containing `prompt_contains`.
    pub fn mock_gemini_generate(&self, prompt_contains: &str, text: &str) -> Mock<'_> {
        self.mock_server.mock(|when, then| {
            when.method(Method::POST)
                .path(format!("/models/{MOCK_MODEL}:generateContent"))
                .header("x-goog-api-key", "test-key")
                .body_contains(prompt_contains);
            then.status(200).json_body(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
            }));
        })
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
