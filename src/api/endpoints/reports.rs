//! PDF report downloads.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::crop::analyze_crop;
use crate::report::{ai_report_filename, crop_report_filename};

use super::crops::{recommend, CropRequest};

fn pdf_attachment(bytes: Vec<u8>, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// `POST /api/generate-crop-report` — `{"crop": "rice"}` → PDF.
pub async fn crop_report(
    State(ctx): State<ApiContext>,
    payload: Result<Json<CropRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let analysis = analyze_crop(&request.crop)?;
    let filename = crop_report_filename(&analysis.crop, chrono::Local::now().naive_local());
    let generator = ctx.reports;
    let bytes =
        tokio::task::spawn_blocking(move || generator.generate_crop_report(&analysis)).await??;

    tracing::info!(%filename, bytes = bytes.len(), "Crop report served");
    Ok(pdf_attachment(bytes, &filename))
}

/// `POST /api/generate-ai-report` — soil parameters → PDF.
pub async fn ai_report(
    State(ctx): State<ApiContext>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    let recommendation = recommend(&ctx, &body).await?;
    let filename = ai_report_filename(chrono::Local::now().naive_local());
    let generator = ctx.reports;
    let bytes = tokio::task::spawn_blocking(move || {
        generator.generate_ai_prediction_report(&recommendation)
    })
    .await??;

    tracing::info!(%filename, bytes = bytes.len(), "AI prediction report served");
    Ok(pdf_attachment(bytes, &filename))
}
