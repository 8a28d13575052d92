use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, header},
    middleware,
    middleware::Next,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::AppState;
use super::handlers::{tasks, webhooks};

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

pub fn build_api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/send-message/", post(tasks::send_message_endpoint))
        .route("/api/request-exam/", post(tasks::request_exam_endpoint))
        .route("/api/submit-exam/", post(tasks::submit_exam_endpoint))
        .route(
            "/api/grading-webhook/",
            post(webhooks::grading_webhook_endpoint),
        )
        .route(
            "/api/exam-webhook/{request_id}/",
            post(webhooks::exam_webhook_endpoint),
        )
        .route(
            "/api/ai-webhook/{request_id}/",
            post(webhooks::ai_webhook_endpoint),
        )
        .route(
            "/api/requests/{request_id}/",
            get(tasks::request_status_endpoint),
        )
        .route("/api/health", get(tasks::health_endpoint))
        .layer(middleware::from_fn(security_headers))
        .layer(build_cors())
        .with_state(state)
}

async fn security_headers(req: Request<Body>, next: Next) -> axum::response::Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    response
}
