pub mod prompts;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::core::llm::LlmProvider;
use crate::core::signature;
use crate::core::store::types::{CallbackOutcome, TaskKind};

/// Shared state of the relay service: the provider boundary, an HTTP client
/// for callbacks, and the optional callback-signing secret.
#[derive(Clone)]
pub struct RelayState {
    pub provider: Arc<dyn LlmProvider>,
    pub client: reqwest::Client,
    pub webhook_secret: String,
}

impl RelayState {
    pub fn new(provider: Arc<dyn LlmProvider>, webhook_secret: String) -> Self {
        Self {
            provider,
            client: reqwest::Client::new(),
            webhook_secret,
        }
    }
}

/// One task as received from the website dispatcher.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentTaskRequest {
    pub request_id: String,
    pub kind: TaskKind,
    pub payload: String,
    pub webhook_url: String,
}

#[derive(Debug, Serialize)]
struct CompletionCallback<'a> {
    request_id: &'a str,
    outcome: CallbackOutcome,
    result: &'a str,
}

pub fn build_relay_router(state: RelayState) -> Router {
    Router::new()
        .route("/agent/process", post(process_endpoint))
        .route("/agent/health", get(health_endpoint))
        .with_state(state)
}

/// Ack immediately, do the work in a spawned task. The website never waits
/// on the provider round trip.
async fn process_endpoint(
    State(state): State<RelayState>,
    Json(task): Json<AgentTaskRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    info!(
        "Accepted {} task {} (callback: {})",
        task.kind, task.request_id, task.webhook_url
    );

    tokio::spawn(async move {
        process_task(state, task).await;
    });

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "success": true, "status": "accepted" })),
    )
}

async fn health_endpoint() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "fyssa-relay" }))
}

/// Run one task through the provider and report the outcome. Each task is
/// independent; there is no queueing or cross-task state.
pub async fn process_task(state: RelayState, task: AgentTaskRequest) {
    let messages = prompts::messages_for(task.kind, &task.payload);

    let (outcome, text) = match state.provider.generate(&messages).await {
        Ok(text) => (CallbackOutcome::Completed, text),
        Err(e) => {
            error!("Provider call failed for task {}: {}", task.request_id, e);
            (CallbackOutcome::Failed, format!("provider error: {e}"))
        }
    };

    post_callback(&state, &task, outcome, &text).await;
}

/// Single-shot callback delivery. A lost callback leaves the website record
/// pending; that reconciliation lives outside this service.
async fn post_callback(state: &RelayState, task: &AgentTaskRequest, outcome: CallbackOutcome, result: &str) {
    let callback = CompletionCallback {
        request_id: &task.request_id,
        outcome,
        result,
    };
    let body = match serde_json::to_string(&callback) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to encode callback for {}: {}", task.request_id, e);
            return;
        }
    };

    let mut req = state
        .client
        .post(&task.webhook_url)
        .header("content-type", "application/json")
        .body(body.clone());
    if !state.webhook_secret.is_empty() {
        req = req.header("x-signature", signature::sign(&state.webhook_secret, &body));
    }

    match req.send().await {
        Ok(res) if res.status().is_success() => {
            info!("Callback delivered for task {}", task.request_id);
        }
        Ok(res) => {
            error!(
                "Webhook rejected callback for task {}: {}",
                task.request_id,
                res.status()
            );
        }
        Err(e) => {
            error!("Webhook unreachable for task {}: {}", task.request_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::llm::ScriptedProvider;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use std::sync::Mutex;
    use tower::util::ServiceExt;

    fn scripted_state(replies: Vec<&str>) -> RelayState {
        RelayState::new(
            Arc::new(ScriptedProvider::new(
                replies.into_iter().map(String::from).collect(),
            )),
            String::new(),
        )
    }

    /// Webhook sink that records (raw body, signature header) pairs.
    async fn capture_webhook() -> (String, Arc<Mutex<Vec<(String, Option<String>)>>>) {
        let seen: Arc<Mutex<Vec<(String, Option<String>)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_handler = seen.clone();
        let app = Router::new().route(
            "/hook",
            post(
                move |headers: axum::http::HeaderMap, body: String| {
                    let seen = seen_handler.clone();
                    async move {
                        let sig = headers
                            .get("x-signature")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        seen.lock().unwrap().push((body, sig));
                        Json(serde_json::json!({ "success": true }))
                    }
                },
            ),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/hook"), seen)
    }

    #[tokio::test]
    async fn process_posts_completed_callback() {
        let (hook_url, seen) = capture_webhook().await;
        let state = scripted_state(vec!["hi there"]);

        process_task(
            state,
            AgentTaskRequest {
                request_id: "task-1".into(),
                kind: TaskKind::Chat,
                payload: "hello".into(),
                webhook_url: hook_url,
            },
        )
        .await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let body: serde_json::Value = serde_json::from_str(&seen[0].0).unwrap();
        assert_eq!(body["request_id"], "task-1");
        assert_eq!(body["outcome"], "completed");
        assert_eq!(body["result"], "hi there");
        assert!(seen[0].1.is_none());
    }

    #[tokio::test]
    async fn provider_failure_posts_failed_callback() {
        let (hook_url, seen) = capture_webhook().await;
        let state = RelayState::new(
            Arc::new(ScriptedProvider::failing("model overloaded")),
            String::new(),
        );

        process_task(
            state,
            AgentTaskRequest {
                request_id: "task-2".into(),
                kind: TaskKind::Grading,
                payload: "{}".into(),
                webhook_url: hook_url,
            },
        )
        .await;

        let seen = seen.lock().unwrap();
        let body: serde_json::Value = serde_json::from_str(&seen[0].0).unwrap();
        assert_eq!(body["outcome"], "failed");
        assert!(body["result"].as_str().unwrap().contains("model overloaded"));
    }

    #[tokio::test]
    async fn callback_is_signed_when_secret_set() {
        let (hook_url, seen) = capture_webhook().await;
        let state = RelayState::new(
            Arc::new(ScriptedProvider::new(vec!["ok".into()])),
            "shared-secret".into(),
        );

        process_task(
            state,
            AgentTaskRequest {
                request_id: "task-3".into(),
                kind: TaskKind::Chat,
                payload: "hi".into(),
                webhook_url: hook_url,
            },
        )
        .await;

        let seen = seen.lock().unwrap();
        let (raw, sig) = &seen[0];
        // Signature covers the exact wire body.
        assert!(sig.is_some());
        assert!(signature::verify("shared-secret", raw, sig.as_ref().unwrap()));
    }

    #[tokio::test]
    async fn process_endpoint_acks_with_202() {
        let (hook_url, _seen) = capture_webhook().await;
        let app = build_relay_router(scripted_state(vec!["ok"]));

        let req = Request::builder()
            .method(Method::POST)
            .uri("/agent/process")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "request_id": "task-4",
                    "kind": "chat",
                    "payload": "hello",
                    "webhook_url": hook_url,
                })
                .to_string(),
            ))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn health_endpoint_reports_healthy() {
        let app = build_relay_router(scripted_state(vec![]));
        let req = Request::builder()
            .method(Method::GET)
            .uri("/agent/health")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
