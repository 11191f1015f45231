//! Helpers shared by the in-crate test modules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::config::{GeminiConfig, ResponseShape};
use crate::llm_client::LlmClient;
use crate::models::post::{NewPost, Post};
use crate::posts::store::{PostStore, StoreError};
use crate::state::AppState;

/// A recorded request to the mock AI service.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub api_key: Option<String>,
    pub body: Value,
}

/// A local stand-in for the AI service that answers every request with a fixed reply.
pub struct MockUpstream {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<RecordedRequest>>>,
}

impl MockUpstream {
    pub async fn start(status: StatusCode, reply: Value) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let last_request = Arc::new(Mutex::new(None));

        let app = {
            let hits = hits.clone();
            let last_request = last_request.clone();
            Router::new().fallback(move |headers: HeaderMap, body: String| {
                let hits = hits.clone();
                let last_request = last_request.clone();
                let reply = reply.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let recorded = RecordedRequest {
                        api_key: headers
                            .get("x-goog-api-key")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string),
                        body: serde_json::from_str(&body).unwrap_or(Value::Null),
                    };
                    *last_request.lock().unwrap() = Some(recorded);
                    (status, Json(reply))
                }
            })
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/v1beta"),
            hits,
            last_request,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.last_request.lock().unwrap().clone()
    }

    pub fn client(&self) -> LlmClient {
        LlmClient::new(&GeminiConfig {
            api_key: "test-key".to_string(),
            api_base: self.base_url.clone(),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }
}

/// Wraps generated text the way the AI service does.
pub fn envelope_with_text(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {
                "parts": [{"text": text}],
                "role": "model"
            },
            "finishReason": "STOP"
        }],
        "usageMetadata": {"totalTokenCount": 42}
    })
}

pub fn state_with(
    upstream: &MockUpstream,
    store: Arc<dyn PostStore>,
    response_shape: ResponseShape,
) -> AppState {
    AppState {
        llm: upstream.client(),
        store,
        response_shape,
    }
}

/// A store whose database is always unreachable.
pub struct UnreachableStore;

#[async_trait]
impl PostStore for UnreachableStore {
    async fn save(&self, _post: NewPost) -> Result<Post, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}
