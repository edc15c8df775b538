//! Crop tables and soil-based crop recommendation.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Success};
use crate::crop::{analyze_crop, crop_names, CropAnalysis, SoilParameters, SoilRecommendation};

#[derive(Serialize)]
pub struct CropListResponse {
    pub crops: Vec<String>,
}

/// `GET /api/crop-list`
pub async fn crop_list() -> Json<CropListResponse> {
    Json(CropListResponse {
        crops: crop_names(),
    })
}

#[derive(Debug, Deserialize)]
pub struct CropRequest {
    #[serde(default)]
    pub crop: String,
}

/// `POST /api/crop-soil-analysis` — `{"crop": "rice"}`.
pub async fn soil_analysis(
    payload: Result<Json<CropRequest>, JsonRejection>,
) -> Result<Json<Success<CropAnalysis>>, ApiError> {
    let Json(request) = payload?;
    let analysis = analyze_crop(&request.crop)?;
    Ok(Json(Success::new(analysis)))
}

/// Parse and rank one soil reading on a blocking worker.
pub(crate) async fn recommend(
    ctx: &ApiContext,
    body: &Value,
) -> Result<SoilRecommendation, ApiError> {
    let recommender = ctx.soil()?;
    let params = SoilParameters::from_json(body)?;
    let recommendation =
        tokio::task::spawn_blocking(move || recommender.recommend(&params)).await??;
    Ok(recommendation)
}

/// `POST /api/soil-to-crop-prediction` — seven numeric soil/climate fields.
pub async fn soil_to_crop(
    State(ctx): State<ApiContext>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Success<SoilRecommendation>>, ApiError> {
    let Json(body) = payload?;
    let recommendation = recommend(&ctx, &body).await?;
    Ok(Json(Success::new(recommendation)))
}
