//! Plant disease prediction from multipart image uploads.

use std::collections::HashMap;

use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{allowed_file, parse_flag, ApiContext, Success, MAX_BATCH_FILES};
use crate::disease::{BatchItem, BatchRecord, ImageInput, PredictOptions, PredictionResult, MAX_TOP_N};

const DEFAULT_TOP_N: usize = 5;
const BATCH_TOP_N: usize = 3;
const INVALID_TYPE: &str =
    "Invalid file type. Please upload PNG, JPG, JPEG, GIF, BMP, TIFF, or WebP files.";

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// File parts under one field name plus every text field.
struct UploadForm {
    files: Vec<Upload>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Upload exceeds the 32 MB limit".into())
    } else {
        ApiError::BadRequest(format!("Malformed upload: {e}"))
    }
}

async fn read_form(multipart: &mut Multipart, file_field: &str) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm {
        files: Vec::new(),
        fields: HashMap::new(),
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        if name == file_field {
            let filename = field.file_name().unwrap_or("").to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            form.files.push(Upload {
                filename,
                bytes: bytes.to_vec(),
            });
        } else if !name.is_empty() {
            let value = field.text().await.map_err(multipart_error)?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

/// `top_n` form value, capped at [`MAX_TOP_N`].
fn parse_top_n(value: Option<&str>) -> Result<usize, ApiError> {
    match value {
        None => Ok(DEFAULT_TOP_N),
        Some(v) => v
            .trim()
            .parse::<i64>()
            .map(|n| n.clamp(1, MAX_TOP_N as i64) as usize)
            .map_err(|_| ApiError::BadRequest("Invalid value for top_n. Must be a number.".into())),
    }
}

// ═══════════════════════════════════════════════════════════
// POST /predict
// ═══════════════════════════════════════════════════════════

#[derive(Serialize)]
pub struct ProcessingOptions {
    pub use_tta: bool,
    pub enhance_image: bool,
    pub top_n: usize,
}

#[derive(Serialize)]
pub struct PredictResults {
    #[serde(flatten)]
    pub prediction: PredictionResult,
    pub processing_options: ProcessingOptions,
}

#[derive(Serialize)]
pub struct PredictResponse {
    pub results: PredictResults,
}

/// `POST /predict` — multipart `file` plus optional `use_tta`,
/// `enhance_image`, `top_n`.
pub async fn predict(
    State(ctx): State<ApiContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Success<PredictResponse>>, ApiError> {
    let mut multipart = multipart?;
    let predictor = ctx.predictor()?;
    let form = read_form(&mut multipart, "file").await?;

    let use_tta = parse_flag(form.field("use_tta"), true);
    let enhance_image = parse_flag(form.field("enhance_image"), true);
    let top_n = parse_top_n(form.field("top_n"))?;

    let upload = form
        .files
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))?;
    if upload.filename.is_empty() {
        return Err(ApiError::BadRequest("No file selected".into()));
    }
    if !allowed_file(&upload.filename) {
        return Err(ApiError::BadRequest(INVALID_TYPE.into()));
    }

    tracing::info!(
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        use_tta,
        enhance_image,
        top_n,
        "Prediction request"
    );

    let options = PredictOptions {
        top_n,
        use_tta,
        enhance: enhance_image,
        with_preview: true,
    };
    let input = ImageInput::Bytes(upload.bytes);
    let prediction =
        tokio::task::spawn_blocking(move || predictor.predict(&input, &options)).await??;

    Ok(Json(Success::new(PredictResponse {
        results: PredictResults {
            prediction,
            processing_options: ProcessingOptions {
                use_tta,
                enhance_image,
                top_n,
            },
        },
    })))
}

// ═══════════════════════════════════════════════════════════
// POST /batch_predict
// ═══════════════════════════════════════════════════════════

#[derive(Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchRecord>,
    pub processed_count: usize,
}

/// `POST /batch_predict` — up to ten `files`; TTA off unless `use_tta=true`.
pub async fn batch_predict(
    State(ctx): State<ApiContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Success<BatchResponse>>, ApiError> {
    let mut multipart = multipart?;
    let predictor = ctx.predictor()?;
    let form = read_form(&mut multipart, "files").await?;

    if form.files.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".into()));
    }
    if form.files.len() > MAX_BATCH_FILES {
        return Err(ApiError::BadRequest(format!(
            "Maximum {MAX_BATCH_FILES} files allowed in batch mode"
        )));
    }

    let use_tta = parse_flag(form.field("use_tta"), false);
    let items: Vec<BatchItem> = form
        .files
        .into_iter()
        .filter(|u| !u.filename.is_empty() && allowed_file(&u.filename))
        .map(|u| BatchItem {
            filename: u.filename,
            input: ImageInput::Bytes(u.bytes),
        })
        .collect();

    tracing::info!(files = items.len(), use_tta, "Batch prediction request");

    let options = PredictOptions {
        top_n: BATCH_TOP_N,
        use_tta,
        enhance: true,
        with_preview: true,
    };
    let results =
        tokio::task::spawn_blocking(move || predictor.predict_batch(&items, &options)).await?;

    Ok(Json(Success::new(BatchResponse {
        processed_count: results.len(),
        results,
    })))
}
