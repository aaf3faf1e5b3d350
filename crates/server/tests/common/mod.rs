//! # Common Test Utilities
//!
//! `TestApp` spawns the real router on a random port over an in-memory
//! database seeded with the CPI fixtures. The AI provider is a `local`
//! provider pointed at an `httpmock::MockServer`, so each test decides what
//! SQL the "model" returns.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use cpiquery_server::{
    config,
    router,
    state::{build_app_state_with_provider, AppState},
};
use cpiquery_test_utils::seeded_provider;
use httpmock::{Method::POST, Mock, MockServer};
use reqwest::Client;
use serde_json::json;
use std::{fs::File, io::Write};
use tempfile::{tempdir, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

pub const CHAT_PATH: &str = "/v1/chat/completions";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub app_state: AppState,
    _config_dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the server with the gate open.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_config("").await
    }

    /// Spawns the server with extra top-level YAML appended to the base config.
    pub async fn spawn_with_config(extra_yaml: &str) -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let mock_server = MockServer::start_async().await;

        let config_dir = tempdir()?;
        let config_path = config_dir.path().join("config.yml");
        let config_content = format!(
            r#"
port: 0
db_url: ":memory:"
providers:
  mock_local:
    provider: "local"
    api_url: "{}"
    api_key: null
    model_name: "mock-chat-model"
tasks:
  query_generation:
    provider: "mock_local"
{extra_yaml}
"#,
            mock_server.url(CHAT_PATH)
        );
        let mut file = File::create(&config_path)?;
        file.write_all(config_content.as_bytes())?;

        let config = config::get_config(Some(config_path.to_str().unwrap()))?;
        let app_state = build_app_state_with_provider(config, seeded_provider().await?).await?;
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = format!("http://{}", listener.local_addr()?);

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
            _config_dir: config_dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Programs the mock model to answer every chat request with `content`.
    pub async fn mock_model_reply(&self, content: &str) -> Mock<'_> {
        self.mock_server
            .mock_async(|when, then| {
                when.method(POST).path(CHAT_PATH);
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": content}}]
                }));
            })
            .await
    }

    /// Issues `GET /query` with the given query-string pairs.
    pub async fn get_query(&self, params: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .get(format!("{}/query", self.address))
            .query(params)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
