//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (one session per connection)
/// - REST-ish API under `/api/v1/...` (server-held sessions by id)
/// - Static SPA from `static_dir` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>, static_dir: &str) -> Router {
    let static_service = ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{}/index.html", static_dir)));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/session", post(http::http_create_session))
        .route(
            "/api/v1/session/:id",
            get(http::http_get_session).delete(http::http_delete_session),
        )
        .route("/api/v1/session/:id/initialize", post(http::http_initialize))
        .route("/api/v1/session/:id/exercise", post(http::http_new_exercise))
        .route("/api/v1/session/:id/answer", post(http::http_submit_answer))
        .route("/api/v1/session/:id/reveal", post(http::http_reveal_answer))
        .route("/api/v1/session/:id/reset", post(http::http_reset))
        .route("/api/v1/session/:id/level", post(http::http_select_level))
        .route("/api/v1/session/:id/vocabulary", get(http::http_vocabulary))
        .route("/api/v1/translate", post(http::http_translate))
        .route("/api/v1/speech", post(http::http_speech))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::TutorConfig;
    use crate::services::mock::{EchoSpeech, FixedSimilarity};
    use crate::services::Services;

    fn app() -> Router {
        let mut services = Services::disabled();
        services.similarity = Arc::new(FixedSimilarity::new(0.2));
        services.speech = Arc::new(EchoSpeech);
        let state = AppState::with_services(TutorConfig::default(), services, Some(3));
        build_router(Arc::new(state), "./static")
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    #[tokio::test]
    async fn health_lists_backends() {
        let (status, body) = call(&app(), Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["translator"], "disabled");
        assert_eq!(body["speech"], "echo");
    }

    #[tokio::test]
    async fn session_flow_over_http() {
        let app = app();
        let (status, created) = call(&app, Method::POST, "/api/v1/session", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["session"]["phase"], "uninitialized");
        let id = created["sessionId"].as_str().unwrap().to_string();

        let (status, body) = call(&app, Method::POST, &format!("/api/v1/session/{id}/exercise"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("not initialized"));

        let (status, snap) = call(
            &app,
            Method::POST,
            &format!("/api/v1/session/{id}/initialize"),
            Some(json!({ "language": "spanish", "level": "beginner" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snap["phase"], "ready");
        assert_eq!(snap["levelTotal"], 10);

        let (status, ex) = call(&app, Method::POST, &format!("/api/v1/session/{id}/exercise"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(ex["exercise"].get("expected").is_none());
        assert_eq!(ex["session"]["phase"], "exercise_active");

        let (status, answer) = call(
            &app,
            Method::POST,
            &format!("/api/v1/session/{id}/answer"),
            Some(json!({ "answer": "definitely wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(answer["correct"], false);
        assert_eq!(answer["session"]["phase"], "answer_checked");

        let (status, revealed) = call(&app, Method::POST, &format!("/api/v1/session/{id}/reveal"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(revealed["answer"].as_str().is_some());
        assert_eq!(revealed["speech"]["status"], "ok");

        let (status, snap) = call(&app, Method::POST, &format!("/api/v1/session/{id}/reset"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snap["phase"], "ready");
        assert_eq!(snap["score"], 0);
        assert_eq!(snap["exercisesCompleted"], 0);

        let (status, vocab) = call(&app, Method::GET, &format!("/api/v1/session/{id}/vocabulary"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(vocab["categories"][0]["category"], "greetings");

        let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/session/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::GET, &format!("/api/v1/session/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_json_is_a_json_bad_request() {
        let app = app();
        let (_, created) = call(&app, Method::POST, "/api/v1/session", None).await;
        let id = created["sessionId"].as_str().unwrap().to_string();

        let req = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/session/{id}/initialize"))
            .header("content-type", "application/json")
            .body(Body::from("{\"language\": "))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("bad request"));

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/session/{id}/level"),
            Some(json!({ "level": "expert" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn translate_falls_back_to_vocabulary() {
        let (status, body) = call(
            &app(),
            Method::POST,
            "/api/v1/translate",
            Some(json!({ "text": "goodbye", "language": "french" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translation"], "au revoir");
        assert_eq!(body["speech"]["status"], "ok");
    }
}
