//! Shared types for the HTTP layer.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::crop::SoilRecommender;
use crate::disease::{PredictionService, PredictorSlot};
use crate::report::CropReportGenerator;

use super::error::ApiError;

/// Upload extensions accepted by `/predict` and `/batch_predict`.
pub const ALLOWED_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

/// Files accepted per `/batch_predict` request.
pub const MAX_BATCH_FILES: usize = 10;

/// Whole-request cap, multipart overhead included.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

// ═══════════════════════════════════════════════════════════
// API context — shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes. The soil recommender is optional; the
/// disease predictor carries its own load state.
#[derive(Clone)]
pub struct ApiContext {
    pub predictor: Arc<PredictorSlot>,
    pub soil: Option<Arc<SoilRecommender>>,
    pub reports: CropReportGenerator,
}

impl ApiContext {
    pub fn new(predictor: Arc<PredictorSlot>, soil: Option<Arc<SoilRecommender>>) -> Self {
        Self {
            predictor,
            soil,
            reports: CropReportGenerator::new(),
        }
    }

    pub fn predictor(&self) -> Result<Arc<PredictionService>, ApiError> {
        self.predictor.get().map_err(|e| {
            tracing::debug!(reason = %e, "Predictor requested while unavailable");
            ApiError::ServiceUnavailable("Prediction service unavailable".into())
        })
    }

    pub fn soil(&self) -> Result<Arc<SoilRecommender>, ApiError> {
        self.soil.clone().ok_or_else(|| {
            ApiError::ServiceUnavailable("ML model not available. Please train the model first.".into())
        })
    }
}

/// `{"success": true, ...payload}`
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

/// Extension allow-list check, case-insensitive.
pub fn allowed_file(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Form flags: only a case-insensitive `"true"` is true.
pub fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value {
        Some(v) => v.trim().eq_ignore_ascii_case("true"),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allow_list() {
        assert!(allowed_file("leaf.JPG"));
        assert!(allowed_file("scan.tiff"));
        assert!(allowed_file("a.b.webp"));
        assert!(!allowed_file("notes.txt"));
        assert!(!allowed_file("noext"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn flags_default_and_parse() {
        assert!(parse_flag(None, true));
        assert!(!parse_flag(None, false));
        assert!(parse_flag(Some("TRUE"), false));
        assert!(!parse_flag(Some("1"), true));
        assert!(!parse_flag(Some("false"), true));
    }

    #[test]
    fn success_flattens_payload() {
        #[derive(Serialize)]
        struct Payload {
            crops: Vec<&'static str>,
        }
        let json = serde_json::to_value(Success::new(Payload { crops: vec!["Rice"] })).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["crops"][0], "Rice");
    }
}
