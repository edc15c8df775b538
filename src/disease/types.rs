use std::fmt;

use ndarray::Array3;
use serde::Serialize;

/// Normalized image laid out H×W×3, values in `[0, 1]`.
pub type ImageTensor = Array3<f32>;

/// Confidence strictly above this is `High`.
pub const HIGH_CONFIDENCE: f32 = 0.8;
/// Confidence strictly above this (and not `High`) is `Medium`.
pub const MEDIUM_CONFIDENCE: f32 = 0.5;

/// Hard cap on the number of ranked classes returned per image.
pub const MAX_TOP_N: usize = 10;

// ═══════════════════════════════════════════════════════════
// Model shape
// ═══════════════════════════════════════════════════════════

/// Spatial input size the model declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputSize {
    pub width: u32,
    pub height: u32,
}

impl InputSize {
    pub const fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

impl fmt::Display for InputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Input size of the advanced (EfficientNet-style) model.
pub const ADVANCED_INPUT: InputSize = InputSize::square(300);
/// Input size assumed for the basic model when the graph leaves it dynamic.
pub const BASIC_INPUT: InputSize = InputSize::square(224);

/// Model variant, decided once at load time from the declared input size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// 300×300 input; test-time augmentation available.
    Advanced,
    /// Any other input size; TTA requests are ignored.
    Basic,
}

impl ModelVariant {
    pub fn from_input_size(size: InputSize) -> Self {
        if size == ADVANCED_INPUT {
            ModelVariant::Advanced
        } else {
            ModelVariant::Basic
        }
    }

    pub fn supports_tta(self) -> bool {
        matches!(self, ModelVariant::Advanced)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelVariant::Advanced => "advanced",
            ModelVariant::Basic => "basic",
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Request side
// ═══════════════════════════════════════════════════════════

/// What the caller hands to `PredictionService::predict`.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Encoded image file (PNG, JPEG, WebP, ...).
    Bytes(Vec<u8>),
    /// In-memory H×W×3 pixel array, either `[0,1]` floats or `[0,255]` values.
    Array(ImageTensor),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictOptions {
    pub top_n: usize,
    pub use_tta: bool,
    /// Contrast/sharpness enhancement. Only applies to `ImageInput::Bytes`.
    pub enhance: bool,
    /// Attach a base64 JPEG copy of the input for display.
    pub with_preview: bool,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            top_n: 5,
            use_tta: true,
            enhance: true,
            with_preview: false,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Result side
// ═══════════════════════════════════════════════════════════

/// Coarse confidence bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence > HIGH_CONFIDENCE {
            ConfidenceLevel::High
        } else if confidence > MEDIUM_CONFIDENCE {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Agronomic guidance attached to the top prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiseaseInfo {
    pub severity: &'static str,
    pub description: &'static str,
    pub treatment: &'static str,
    pub prevention: &'static str,
}

/// One ranked class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassPrediction {
    pub plant: String,
    pub disease: String,
    pub full_name: String,
    pub confidence: f32,
    pub confidence_percentage: String,
    pub is_healthy: bool,
}

/// Facts about the decoded upload, echoed back to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub format: Option<String>,
    pub mode: String,
    pub size: [u32; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Full response for one image.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub top_prediction: String,
    pub confidence: f32,
    pub confidence_percentage: String,
    pub confidence_level: ConfidenceLevel,
    pub plant: String,
    pub disease: String,
    pub is_healthy: bool,
    pub model_type: ModelVariant,
    pub used_tta: bool,
    pub enhanced_image: bool,
    pub timestamp: String,
    pub disease_info: DiseaseInfo,
    pub all_predictions: Vec<ClassPrediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_info: Option<ImageInfo>,
}

/// Introspection for health/status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_type: ModelVariant,
    pub model_path: String,
    pub input_size: String,
    pub num_classes: usize,
    pub supports_tta: bool,
}

/// One file in a batch request.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub filename: String,
    pub input: ImageInput,
}

/// Outcome of one batch item. A failure never aborts the rest of the batch.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchRecord {
    Prediction(Box<PredictionResult>),
    Failed { error: String, filename: String },
}

impl BatchRecord {
    pub fn is_error(&self) -> bool {
        matches!(self, BatchRecord::Failed { .. })
    }
}
