//! Liveness and model introspection.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::disease::{LoadState, ModelInfo};

/// Classes echoed by `/model_info`.
const MODEL_INFO_CLASSES: usize = 10;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
    pub predictor_available: bool,
    pub predictor_state: LoadState,
    pub model_loaded: bool,
    pub classes_loaded: usize,
    pub model_type: &'static str,
    pub supports_tta: bool,
    pub soil_model_available: bool,
}

/// `GET /health` — 200 when the disease predictor is ready, 503 otherwise.
pub async fn check(State(ctx): State<ApiContext>) -> impl IntoResponse {
    let predictor = ctx.predictor.get().ok();
    let body = HealthResponse {
        status: if predictor.is_some() { "healthy" } else { "degraded" },
        timestamp: chrono::Local::now()
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string(),
        version: crate::config::APP_VERSION,
        predictor_available: predictor.is_some(),
        predictor_state: ctx.predictor.state(),
        model_loaded: predictor.is_some(),
        classes_loaded: predictor.as_ref().map_or(0, |p| p.class_names().len()),
        model_type: predictor.as_ref().map_or("none", |p| p.variant().as_str()),
        supports_tta: predictor.as_ref().is_some_and(|p| p.variant().supports_tta()),
        soil_model_available: ctx.soil.is_some(),
    };

    let status = if body.predictor_available {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
pub struct ModelInfoResponse {
    #[serde(flatten)]
    pub info: ModelInfo,
    pub classes: Vec<String>,
    pub total_classes: usize,
}

/// `GET /model_info`
pub async fn model_info(
    State(ctx): State<ApiContext>,
) -> Result<Json<ModelInfoResponse>, ApiError> {
    let predictor = ctx.predictor()?;
    let classes = predictor.class_names();
    Ok(Json(ModelInfoResponse {
        info: predictor.model_info(),
        classes: classes.iter().take(MODEL_INFO_CLASSES).cloned().collect(),
        total_classes: classes.len(),
    }))
}

/// `GET /favicon.ico`
pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}
