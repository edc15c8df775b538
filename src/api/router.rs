//! HTTP router.
//!
//! Disease routes sit at the root (`/predict`, `/batch_predict`,
//! `/model_info`, `/health`); crop routes are nested under `/api/`.
//! Every route is CORS-permissive and bodies are capped at 32 MB.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::{ApiContext, MAX_BODY_BYTES};

/// Build the full router around a shared `ApiContext`.
pub fn api_router(ctx: ApiContext) -> Router {
    let crop_routes = Router::new()
        .route("/crop-list", get(endpoints::crops::crop_list))
        .route("/crop-soil-analysis", post(endpoints::crops::soil_analysis))
        .route(
            "/soil-to-crop-prediction",
            post(endpoints::crops::soil_to_crop),
        )
        .route(
            "/generate-crop-report",
            post(endpoints::reports::crop_report),
        )
        .route("/generate-ai-report", post(endpoints::reports::ai_report));

    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/model_info", get(endpoints::health::model_info))
        .route("/favicon.ico", get(endpoints::health::favicon))
        .route("/predict", post(endpoints::predict::predict))
        .route("/batch_predict", post(endpoints::predict::batch_predict))
        .nest("/api", crop_routes)
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
}
