//! Full round trips through both services: website submit → relay (scripted
//! provider) → webhook callback → terminal record. Both services listen on
//! ephemeral ports; the test drives them over real HTTP like the browser and
//! the workflow engine would.

use std::sync::Arc;
use std::time::Duration;

use fyssa::config::WebsiteConfig;
use fyssa::core::dispatcher::TaskDispatcher;
use fyssa::core::llm::{LlmProvider, ScriptedProvider};
use fyssa::core::relay::{RelayState, build_relay_router};
use fyssa::core::store::RequestStore;
use fyssa::interfaces::web::{AppState, build_api_router};

async fn spawn_relay(provider: Arc<dyn LlmProvider>, webhook_secret: &str) -> String {
    let app = build_relay_router(RelayState::new(provider, webhook_secret.to_string()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/agent/process")
}

async fn spawn_website(agent_endpoint: &str, webhook_secret: &str) -> (String, RequestStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = RequestStore::open(dir.path().join("fyssa.db")).unwrap();
    // Keep the scratch dir alive for the whole process.
    std::mem::forget(dir);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = format!("http://{addr}");

    let config = WebsiteConfig {
        agent_endpoint: agent_endpoint.to_string(),
        public_base_url: Some(base.clone()),
        webhook_secret: webhook_secret.to_string(),
        ..WebsiteConfig::default()
    };
    let state = AppState {
        store: store.clone(),
        dispatcher: TaskDispatcher::new(store.clone(), &config),
        webhook_secret: config.webhook_secret.clone(),
    };
    let app = build_api_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base, store)
}

async fn wait_for_terminal(
    client: &reqwest::Client,
    base: &str,
    request_id: &str,
) -> serde_json::Value {
    for _ in 0..100 {
        let res: serde_json::Value = client
            .get(format!("{base}/api/requests/{request_id}/"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if res["request"]["status"] != "pending" {
            return res["request"].clone();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("request {request_id} never left pending");
}

#[tokio::test]
async fn chat_round_trip_completes_request() {
    let relay = spawn_relay(Arc::new(ScriptedProvider::new(vec!["hi there".into()])), "").await;
    let (base, store) = spawn_website(&relay, "").await;
    let client = reqwest::Client::new();

    let res: serde_json::Value = client
        .post(format!("{base}/api/send-message/"))
        .json(&serde_json::json!({ "session_id": "u-1", "message": "hello" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(res["success"], true);
    let id = res["request_id"].as_str().unwrap();

    let request = wait_for_terminal(&client, &base, id).await;
    assert_eq!(request["status"], "completed");
    assert_eq!(request["result"], "hi there");

    let stored = store.get_request(id).await.unwrap().unwrap();
    assert_eq!(stored.result.as_deref(), Some("hi there"));
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn provider_failure_marks_request_failed() {
    let relay = spawn_relay(Arc::new(ScriptedProvider::failing("model overloaded")), "").await;
    let (base, _store) = spawn_website(&relay, "").await;
    let client = reqwest::Client::new();

    let res: serde_json::Value = client
        .post(format!("{base}/api/request-exam/"))
        .json(&serde_json::json!({ "requester": "u-2", "course": "FY5" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = res["request_id"].as_str().unwrap();

    let request = wait_for_terminal(&client, &base, id).await;
    assert_eq!(request["status"], "failed");
    assert!(request["result"].is_null());
    assert!(
        request["error"]
            .as_str()
            .unwrap()
            .contains("model overloaded")
    );
}

#[tokio::test]
async fn signed_round_trip_with_shared_secret() {
    let secret = "integration-secret";
    let relay = spawn_relay(
        Arc::new(ScriptedProvider::new(vec!["graded".into()])),
        secret,
    )
    .await;
    let (base, _store) = spawn_website(&relay, secret).await;
    let client = reqwest::Client::new();

    let res: serde_json::Value = client
        .post(format!("{base}/api/submit-exam/"))
        .json(&serde_json::json!({ "requester": "u-3", "answers": [{ "order": 0, "answer": "F = ma" }] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = res["request_id"].as_str().unwrap();

    let request = wait_for_terminal(&client, &base, id).await;
    assert_eq!(request["status"], "completed");
    assert_eq!(request["result"], "graded");
}

#[tokio::test]
async fn second_callback_after_round_trip_is_rejected() {
    let relay = spawn_relay(Arc::new(ScriptedProvider::new(vec!["answer".into()])), "").await;
    let (base, _store) = spawn_website(&relay, "").await;
    let client = reqwest::Client::new();

    let res: serde_json::Value = client
        .post(format!("{base}/api/send-message/"))
        .json(&serde_json::json!({ "message": "q" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = res["request_id"].as_str().unwrap();
    wait_for_terminal(&client, &base, id).await;

    // Replay the callback by hand; the first result must stick.
    let replay = client
        .post(format!("{base}/api/ai-webhook/{id}/"))
        .json(&serde_json::json!({ "outcome": "failed", "result": "late duplicate" }))
        .send()
        .await
        .unwrap();
    assert_eq!(replay.status(), reqwest::StatusCode::CONFLICT);

    let res: serde_json::Value = client
        .get(format!("{base}/api/requests/{id}/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(res["request"]["status"], "completed");
    assert_eq!(res["request"]["result"], "answer");
}
