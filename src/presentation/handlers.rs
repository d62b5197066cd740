// HTTP request handlers
use crate::application::dashboard_service::DashboardError;
use crate::application::ingest_service::IngestError;
use crate::domain::dashboard::NO_DATA;
use crate::domain::timestamp::format_display;
use crate::infrastructure::svg_chart::render_svg;
use crate::presentation::app_state::AppState;
use askama::Template;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

pub const RECORDED_MESSAGE: &str = "Temperature recorded successfully.";

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    temperature: String,
    updated_time: String,
    chart: String,
}

#[derive(Debug, Error)]
enum PageError {
    #[error(transparent)]
    Dashboard(#[from] DashboardError),
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

/// Body of every `/temperature` write response
#[derive(Debug, Serialize)]
pub struct Acknowledgement {
    pub success: bool,
    pub message: String,
}

impl Acknowledgement {
    fn success(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LatestReading {
    pub value: f64,
    pub time: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Dashboard page: headline plus chart of the most recent readings
pub async fn home(State(state): State<Arc<AppState>>) -> Response {
    match render_home(&state).await {
        Ok(page) => page.into_response(),
        Err(e) => {
            tracing::error!("Error rendering dashboard: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

async fn render_home(state: &AppState) -> Result<Html<String>, PageError> {
    let dashboard = state.dashboard_service.get_dashboard().await?;
    let template = IndexTemplate {
        temperature: dashboard.headline.value,
        updated_time: dashboard.headline.time,
        chart: render_svg(&dashboard.chart),
    };
    Ok(Html(template.render()?))
}

/// Record a temperature posted by a device
pub async fn post_temperature(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<Acknowledgement>) {
    let result = match payload {
        Ok(Json(body)) => state.ingest_service.record(&body).await,
        Err(rejection) => Err(IngestError::Validation(rejection.body_text())),
    };

    match result {
        Ok(_) => (StatusCode::OK, Json(Acknowledgement::success(RECORDED_MESSAGE))),
        Err(e) => {
            let status = ingest_status(&e);
            match &e {
                IngestError::Validation(_) => tracing::warn!("Rejected temperature: {}", e),
                IngestError::Store(_) => tracing::error!("Failed to record temperature: {}", e),
            }
            (status, Json(Acknowledgement::failure(e.to_string())))
        }
    }
}

/// The latest slot as JSON
pub async fn latest_temperature(State(state): State<Arc<AppState>>) -> Response {
    match state.dashboard_service.latest().await {
        Ok(Some(point)) => Json(LatestReading {
            value: point.value,
            time: format_display(&point.time),
        })
        .into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(Acknowledgement::failure(NO_DATA))).into_response(),
        Err(e) => {
            tracing::error!("Error fetching latest temperature: {}", e);
            let (status, message) = match e {
                DashboardError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "Reading store unavailable"),
                DashboardError::Timestamp(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Stored reading is malformed"),
            };
            (status, Json(Acknowledgement::failure(message))).into_response()
        }
    }
}

fn ingest_status(error: &IngestError) -> StatusCode {
    match error {
        IngestError::Validation(_) => StatusCode::BAD_REQUEST,
        IngestError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

