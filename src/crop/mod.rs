//! Crop agronomy: static crop/fertilizer tables, per-crop analysis, and
//! soil-parameter based crop recommendation.

pub mod analysis;
pub mod data;
pub mod recommend;

pub use analysis::{analyze_crop, CropAnalysis};
pub use data::{crop_names, find_crop, find_fertilizer, title_case, CropProfile, SoilParameter};
pub use recommend::{SoilClassifier, SoilParameters, SoilRecommendation, SoilRecommender};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropError {
    #[error("Invalid crop selection: {0}")]
    UnknownCrop(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for {0}. Must be a number.")]
    InvalidParameter(&'static str),

    #[error("Soil model load failed: {0}")]
    ModelLoad(String),

    #[error("Soil model inference failed: {0}")]
    Inference(String),
}
