// Router construction
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{health_check, home, latest_temperature, post_temperature};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/healthz", get(health_check))
        .route("/temperature", get(latest_temperature).post(post_temperature))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_service::DashboardService;
    use crate::application::ingest_service::IngestService;
    use crate::application::reading_repository::ReadingRepository;
    use crate::domain::reading::{Reading, StoredTime};
    use crate::infrastructure::config::DisplaySettings;
    use crate::infrastructure::memory_repository::MemoryRepository;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::{Duration, TimeZone, Utc};
    use futures::TryStreamExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(repository: MemoryRepository) -> Router {
        let repository: Arc<dyn ReadingRepository> = Arc::new(repository);
        let display = DisplaySettings {
            timezone: chrono_tz::Asia::Seoul,
            window: 100,
        };
        build_router(Arc::new(AppState {
            ingest_service: IngestService::new(repository.clone()),
            dashboard_service: DashboardService::new(repository, display),
        }))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/temperature")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request should build")
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (status, String::from_utf8(bytes.to_vec()).expect("body should be utf-8"))
    }

    #[tokio::test]
    async fn test_post_records_latest_and_history() {
        let repository = MemoryRepository::new();
        let app = app(repository.clone());

        let (status, body) = send(&app, post_json(r#"{"temperature": 25.5}"#)).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({"success": true, "message": "Temperature recorded successfully."}));

        assert_eq!(repository.get_latest().await.unwrap().unwrap().value, 25.5);
        let history: Vec<Reading> = repository.stream_all().try_collect().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].value, 25.5);
    }

    #[tokio::test]
    async fn test_post_rejects_invalid_payloads() {
        let repository = MemoryRepository::new();
        let app = app(repository.clone());

        for payload in [r#"{}"#, r#"{"temperature": "warm"}"#, r#"{"temperature": null}"#, "not json"] {
            let (status, body) = send(&app, post_json(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
            let body: Value = serde_json::from_str(&body).unwrap();
            assert_eq!(body["success"], json!(false));
            assert!(!body["message"].as_str().unwrap().is_empty());
        }

        assert!(repository.get_latest().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_post_without_json_content_type_is_rejected() {
        let app = app(MemoryRepository::new());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/temperature")
            .body(Body::from(r#"{"temperature": 1.0}"#))
            .unwrap();

        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_post_store_failure_is_service_unavailable() {
        let repository = MemoryRepository::new();
        repository.set_unavailable(true).await;
        let app = app(repository);

        let (status, body) = send(&app, post_json(r#"{"temperature": 20.0}"#)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_two_posts_then_dashboard() {
        let app = app(MemoryRepository::new());
        send(&app, post_json(r#"{"temperature": 20.0}"#)).await;
        send(&app, post_json(r#"{"temperature": 21.5}"#)).await;

        let (status, html) = send(&app, get("/")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(r#"<span id="temperature">21.5</span>"#));
        assert_eq!(html.matches("<circle").count(), 2);
        let first = html.find(": 20.0</title>").unwrap();
        let second = html.find(": 21.5</title>").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn test_dashboard_windows_large_history() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let history = (0..150)
            .map(|i| Reading::new(format!("r{i}"), i as f64, StoredTime::Instant(base + Duration::minutes(i))))
            .collect();
        let app = app(MemoryRepository::with_history(history));

        let (status, html) = send(&app, get("/")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(html.matches("<circle").count(), 100);
        assert!(html.contains(r#"<span id="temperature">149.0</span>"#));
        assert!(html.contains(r#"<span id="updated-time">2024-01-01 11:29:00</span>"#));
        assert!(!html.contains(": 49.0</title>"));
    }

    #[tokio::test]
    async fn test_empty_dashboard_shows_no_data() {
        let app = app(MemoryRepository::new());

        let (status, html) = send(&app, get("/")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(r#"<span id="temperature">No data</span>"#));
        assert!(html.contains(r#"<span id="updated-time">No data</span>"#));
        assert!(html.contains("<svg"));
    }

    #[tokio::test]
    async fn test_dashboard_store_failure_is_server_error() {
        let repository = MemoryRepository::new();
        repository.set_unavailable(true).await;
        let app = app(repository);

        let (status, body) = send(&app, get("/")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("offline"));
    }

    #[tokio::test]
    async fn test_latest_endpoint() {
        let app = app(MemoryRepository::new());

        let (status, _) = send(&app, get("/temperature")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(&app, post_json(r#"{"temperature": 18.25}"#)).await;
        let (status, body) = send(&app, get("/temperature")).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["value"], json!(18.25));
        assert_eq!(body["time"].as_str().unwrap().len(), "2024-01-01 00:00:00".len());
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = app(MemoryRepository::new());
        let (status, body) = send(&app, get("/healthz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
