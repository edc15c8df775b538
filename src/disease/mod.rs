//! Plant disease classification from leaf photographs.
//!
//! Flow: `PredictionService::predict` → preprocess → (TTA ensemble) →
//! model inference → result formatting joined with the disease table.

pub mod augment;
pub mod formatter;
pub mod knowledge;
pub mod model;
pub mod preprocess;
pub mod service;
pub mod types;

pub use augment::TtaEnsembler;
pub use formatter::{format_results, FormatOptions};
pub use knowledge::lookup_disease_info;
pub use model::{default_loader, ImageClassifier, ModelLoader};
pub use preprocess::ImagePreprocessor;
pub use service::{LoadState, PredictionService, PredictorSlot, ServiceConfig};
pub use types::*;

use std::path::PathBuf;

use thiserror::Error;

/// Why the model or its class list could not be brought up.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("No model file found (tried {primary} and {fallback})")]
    NotFound { primary: PathBuf, fallback: PathBuf },

    #[error("Failed to decompress {path}: {reason}")]
    Decompress { path: PathBuf, reason: String },

    #[error("Model backend error: {0}")]
    Backend(String),

    #[error("Class list unreadable at {path}: {reason}")]
    ClassList { path: PathBuf, reason: String },

    #[error("Class list at {0} contains no labels")]
    EmptyClassList(PathBuf),

    #[error("No inference backend compiled in (enable the `onnx` feature)")]
    BackendUnavailable,
}

#[derive(Error, Debug)]
pub enum DiseaseError {
    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Model load failed: {0}")]
    ModelLoad(#[from] ModelLoadError),

    #[error("Class list has {classes} labels but the model outputs {outputs} scores")]
    ShapeMismatch { classes: usize, outputs: usize },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Predictor not ready: {0}")]
    NotReady(String),
}
