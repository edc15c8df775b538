//! Soil-to-crop recommendation: seven soil/climate readings in, ranked
//! crops with class probabilities out.

use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::info;

use super::data::{find_crop, title_case, SoilParameter, SoilRequirements};
use super::CropError;

/// Number of ranked crops returned per request.
pub const TOP_RECOMMENDATIONS: usize = 5;

// ═══════════════════════════════════════════════════════════
// Input
// ═══════════════════════════════════════════════════════════

/// One set of soil test and climate readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilParameters {
    pub n: f32,
    pub p: f32,
    pub k: f32,
    pub temperature: f32,
    pub humidity: f32,
    pub ph: f32,
    pub rainfall: f32,
}

impl SoilParameters {
    /// Parse from a JSON object. Values may be numbers or numeric strings.
    pub fn from_json(body: &Value) -> Result<Self, CropError> {
        let read = |param: SoilParameter| -> Result<f32, CropError> {
            let key = param.key();
            let raw = body.get(key).ok_or(CropError::MissingParameter(key))?;
            let value = match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            value
                .filter(|v| v.is_finite())
                .map(|v| v as f32)
                .ok_or(CropError::InvalidParameter(key))
        };

        Ok(Self {
            n: read(SoilParameter::Nitrogen)?,
            p: read(SoilParameter::Phosphorus)?,
            k: read(SoilParameter::Potassium)?,
            temperature: read(SoilParameter::Temperature)?,
            humidity: read(SoilParameter::Humidity)?,
            ph: read(SoilParameter::Ph)?,
            rainfall: read(SoilParameter::Rainfall)?,
        })
    }

    pub fn get(&self, param: SoilParameter) -> f32 {
        match param {
            SoilParameter::Nitrogen => self.n,
            SoilParameter::Phosphorus => self.p,
            SoilParameter::Potassium => self.k,
            SoilParameter::Temperature => self.temperature,
            SoilParameter::Humidity => self.humidity,
            SoilParameter::Ph => self.ph,
            SoilParameter::Rainfall => self.rainfall,
        }
    }

    /// Feature vector in the given column order.
    pub fn features(&self, order: &[SoilParameter]) -> Vec<f32> {
        order.iter().map(|&p| self.get(p)).collect()
    }
}

impl Serialize for SoilParameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(SoilParameter::ALL.len()))?;
        for param in SoilParameter::ALL {
            map.serialize_entry(param.key(), &self.get(param))?;
        }
        map.end()
    }
}

// ═══════════════════════════════════════════════════════════
// Classifier seam
// ═══════════════════════════════════════════════════════════

/// A trained tabular classifier exposing class probabilities.
pub trait SoilClassifier: Send + Sync {
    /// Crop label per output index (lowercase table keys).
    fn labels(&self) -> &[String];

    /// Column order the model expects.
    fn feature_order(&self) -> &[SoilParameter];

    /// Importance per feature, aligned with `feature_order`.
    fn feature_importances(&self) -> &[f32];

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, CropError>;
}

/// Sidecar JSON shipped next to the soil model.
#[derive(Debug, Clone, Deserialize)]
pub struct SoilModelMetadata {
    pub feature_columns: Vec<String>,
    pub crop_labels: Vec<String>,
    pub feature_importances: Vec<f32>,
}

impl SoilModelMetadata {
    pub fn from_file(path: &Path) -> Result<Self, CropError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CropError::ModelLoad(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| CropError::ModelLoad(format!("{}: {e}", path.display())))
    }

    /// Map column names to parameters and check the vectors line up.
    pub fn feature_order(&self) -> Result<Vec<SoilParameter>, CropError> {
        let order = self
            .feature_columns
            .iter()
            .map(|c| {
                SoilParameter::from_key(c)
                    .ok_or_else(|| CropError::ModelLoad(format!("unknown feature column {c}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if order.len() != SoilParameter::ALL.len() {
            return Err(CropError::ModelLoad(format!(
                "expected {} feature columns, got {}",
                SoilParameter::ALL.len(),
                order.len()
            )));
        }
        if self.feature_importances.len() != order.len() {
            return Err(CropError::ModelLoad(
                "feature_importances length does not match feature_columns".into(),
            ));
        }
        if self.crop_labels.is_empty() {
            return Err(CropError::ModelLoad("crop_labels is empty".into()));
        }
        Ok(order)
    }
}

// ═══════════════════════════════════════════════════════════
// ONNX backend — behind `onnx` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx")]
mod onnx {
    use super::{CropError, SoilClassifier, SoilModelMetadata, SoilParameter};
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    /// Tree-ensemble classifier exported to ONNX with tensor (non-ZipMap)
    /// probability output.
    pub struct OnnxSoilClassifier {
        session: Mutex<Session>,
        probability_output: usize,
        labels: Vec<String>,
        order: Vec<SoilParameter>,
        importances: Vec<f32>,
    }

    impl OnnxSoilClassifier {
        pub fn load(model_path: &Path, metadata: SoilModelMetadata) -> Result<Self, CropError> {
            let order = metadata.feature_order()?;
            let session = Session::builder()
                .map_err(|e: ort::Error| CropError::ModelLoad(e.to_string()))?
                .with_intra_threads(1)
                .map_err(|e: ort::Error| CropError::ModelLoad(e.to_string()))?
                .commit_from_file(model_path)
                .map_err(|e: ort::Error| CropError::ModelLoad(format!("ONNX load failed: {e}")))?;

            let probability_output = session
                .outputs
                .iter()
                .position(|o| o.name.contains("prob"))
                .unwrap_or(session.outputs.len().saturating_sub(1));

            tracing::info!(
                path = %model_path.display(),
                crops = metadata.crop_labels.len(),
                "ONNX soil classifier loaded"
            );

            Ok(Self {
                session: Mutex::new(session),
                probability_output,
                labels: metadata.crop_labels,
                order,
                importances: metadata.feature_importances,
            })
        }
    }

    impl SoilClassifier for OnnxSoilClassifier {
        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn feature_order(&self) -> &[SoilParameter] {
            &self.order
        }

        fn feature_importances(&self) -> &[f32] {
            &self.importances
        }

        fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, CropError> {
            use ort::value::TensorRef;

            let input = ndarray::Array2::from_shape_vec((1, features.len()), features.to_vec())
                .map_err(|e| CropError::Inference(e.to_string()))?;
            let tensor = TensorRef::from_array_view(&input)
                .map_err(|e| CropError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| CropError::Inference("Session lock poisoned".to_string()))?;
            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| CropError::Inference(format!("ONNX inference failed: {e}")))?;

            let (_, data) = outputs[self.probability_output]
                .try_extract_tensor::<f32>()
                .map_err(|e| CropError::Inference(format!("Output extraction: {e}")))?;
            Ok(data.to_vec())
        }
    }
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxSoilClassifier;

/// Fixed-output classifier for tests and for running without weights.
pub struct MockSoilClassifier {
    labels: Vec<String>,
    probabilities: Vec<f32>,
    importances: Vec<f32>,
}

impl MockSoilClassifier {
    pub fn new(labels: &[&str], probabilities: Vec<f32>) -> Self {
        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            probabilities,
            importances: vec![1.0 / SoilParameter::ALL.len() as f32; SoilParameter::ALL.len()],
        }
    }
}

impl SoilClassifier for MockSoilClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn feature_order(&self) -> &[SoilParameter] {
        &SoilParameter::ALL
    }

    fn feature_importances(&self) -> &[f32] {
        &self.importances
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, CropError> {
        if features.len() != SoilParameter::ALL.len() {
            return Err(CropError::Inference(format!(
                "expected {} features, got {}",
                SoilParameter::ALL.len(),
                features.len()
            )));
        }
        Ok(self.probabilities.clone())
    }
}

// ═══════════════════════════════════════════════════════════
// Output
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct CropDetails {
    pub soil_requirements: SoilRequirements,
    pub growing_season: &'static str,
    pub growth_duration: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CropRecommendation {
    pub crop: String,
    /// `"87.5%"`
    pub confidence: String,
    pub probability: f32,
    /// `None` when the model knows a crop the tables don't.
    pub details: Option<CropDetails>,
}

impl CropRecommendation {
    pub fn suitability(&self) -> Suitability {
        Suitability::from_probability(self.probability)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Suitability {
    Excellent,
    Good,
    Fair,
}

impl Suitability {
    pub fn from_probability(probability: f32) -> Self {
        if probability > 0.7 {
            Suitability::Excellent
        } else if probability > 0.4 {
            Suitability::Good
        } else {
            Suitability::Fair
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Suitability::Excellent => "Excellent",
            Suitability::Good => "Good",
            Suitability::Fair => "Fair",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SoilModelInfo {
    pub total_crops: usize,
    /// Feature → importance, in model column order.
    #[serde(serialize_with = "serialize_ordered_map")]
    pub feature_importance: Vec<(&'static str, f32)>,
}

fn serialize_ordered_map<S: Serializer>(
    entries: &[(&'static str, f32)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in entries {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

#[derive(Debug, Clone, Serialize)]
pub struct SoilRecommendation {
    pub input_parameters: SoilParameters,
    pub best_crop: String,
    pub recommendations: Vec<CropRecommendation>,
    pub model_info: SoilModelInfo,
}

// ═══════════════════════════════════════════════════════════
// SoilRecommender
// ═══════════════════════════════════════════════════════════

pub struct SoilRecommender {
    classifier: Box<dyn SoilClassifier>,
}

impl SoilRecommender {
    pub fn new(classifier: Box<dyn SoilClassifier>) -> Self {
        Self { classifier }
    }

    /// Load the production backend from a model file and its metadata JSON.
    pub fn load(model_path: &Path, metadata_path: &Path) -> Result<Self, CropError> {
        if !model_path.exists() {
            return Err(CropError::ModelLoad(format!(
                "soil model not found at {}",
                model_path.display()
            )));
        }
        let metadata = SoilModelMetadata::from_file(metadata_path)?;

        #[cfg(feature = "onnx")]
        {
            let classifier = OnnxSoilClassifier::load(model_path, metadata)?;
            Ok(Self::new(Box::new(classifier)))
        }
        #[cfg(not(feature = "onnx"))]
        {
            metadata.feature_order()?;
            Err(CropError::ModelLoad(
                "no inference backend compiled in (enable the `onnx` feature)".into(),
            ))
        }
    }

    pub fn total_crops(&self) -> usize {
        self.classifier.labels().len()
    }

    /// Rank crops for one set of readings.
    pub fn recommend(&self, params: &SoilParameters) -> Result<SoilRecommendation, CropError> {
        let order = self.classifier.feature_order();
        let labels = self.classifier.labels();
        let probabilities = self.classifier.predict_proba(&params.features(order))?;

        if probabilities.len() != labels.len() {
            return Err(CropError::Inference(format!(
                "model returned {} probabilities for {} crops",
                probabilities.len(),
                labels.len()
            )));
        }

        let mut ranked: Vec<usize> = (0..probabilities.len()).collect();
        ranked.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));
        ranked.truncate(TOP_RECOMMENDATIONS);

        let recommendations: Vec<CropRecommendation> = ranked
            .into_iter()
            .map(|idx| {
                let label = &labels[idx];
                let probability = probabilities[idx];
                CropRecommendation {
                    crop: title_case(label),
                    confidence: format!("{:.1}%", probability * 100.0),
                    probability,
                    details: find_crop(label).map(|profile| CropDetails {
                        soil_requirements: profile.soil,
                        growing_season: profile.season,
                        growth_duration: profile.growth_duration,
                    }),
                }
            })
            .collect();

        let best_crop = recommendations
            .first()
            .map(|r| r.crop.clone())
            .ok_or_else(|| CropError::Inference("model returned no probabilities".into()))?;

        let feature_importance = order
            .iter()
            .zip(self.classifier.feature_importances())
            .map(|(param, importance)| (param.key(), *importance))
            .collect();

        info!(best_crop = %best_crop, candidates = labels.len(), "Soil recommendation complete");

        Ok(SoilRecommendation {
            input_parameters: *params,
            best_crop,
            recommendations,
            model_info: SoilModelInfo {
                total_crops: labels.len(),
                feature_importance,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_body() -> Value {
        json!({
            "N": 90, "P": 42, "K": 43,
            "temperature": 25, "humidity": 80,
            "ph": "6.5", "rainfall": 200.0
        })
    }

    fn recommender() -> SoilRecommender {
        SoilRecommender::new(Box::new(MockSoilClassifier::new(
            &["rice", "maize", "jute", "coffee", "lentil", "apple", "wheat"],
            vec![0.05, 0.10, 0.60, 0.02, 0.03, 0.05, 0.15],
        )))
    }

    #[test]
    fn parses_numbers_and_numeric_strings() {
        let params = SoilParameters::from_json(&sample_body()).unwrap();
        assert_eq!(params.n, 90.0);
        assert_eq!(params.ph, 6.5);
        assert_eq!(params.rainfall, 200.0);
    }

    #[test]
    fn missing_parameter_is_named() {
        let mut body = sample_body();
        body.as_object_mut().unwrap().remove("humidity");
        let err = SoilParameters::from_json(&body).unwrap_err();
        assert_eq!(err.to_string(), "Missing parameter: humidity");
    }

    #[test]
    fn non_numeric_parameter_is_invalid() {
        let mut body = sample_body();
        body["K"] = json!("lots");
        assert!(matches!(
            SoilParameters::from_json(&body),
            Err(CropError::InvalidParameter("K"))
        ));

        body["K"] = json!(null);
        assert!(matches!(
            SoilParameters::from_json(&body),
            Err(CropError::InvalidParameter("K"))
        ));
    }

    #[test]
    fn features_follow_requested_order() {
        let params = SoilParameters::from_json(&sample_body()).unwrap();
        assert_eq!(
            params.features(&SoilParameter::ALL),
            vec![90.0, 42.0, 43.0, 25.0, 80.0, 6.5, 200.0]
        );
    }

    #[test]
    fn returns_top_five_sorted() {
        let params = SoilParameters::from_json(&sample_body()).unwrap();
        let result = recommender().recommend(&params).unwrap();

        assert_eq!(result.recommendations.len(), 5);
        assert_eq!(result.best_crop, "Jute");
        for pair in result.recommendations.windows(2) {
            assert!(pair[0].probability >= pair[1].probability);
        }
        assert_eq!(result.recommendations[0].confidence, "60.0%");
        assert_eq!(result.model_info.total_crops, 7);
    }

    #[test]
    fn crops_missing_from_tables_have_no_details() {
        let params = SoilParameters::from_json(&sample_body()).unwrap();
        let result = recommender().recommend(&params).unwrap();
        let wheat = result
            .recommendations
            .iter()
            .find(|r| r.crop == "Wheat")
            .unwrap();
        assert!(wheat.details.is_none());
        assert!(result.recommendations[0].details.is_some());
    }

    #[test]
    fn fewer_classes_than_five() {
        let rec = SoilRecommender::new(Box::new(MockSoilClassifier::new(
            &["rice", "maize"],
            vec![0.3, 0.7],
        )));
        let params = SoilParameters::from_json(&sample_body()).unwrap();
        let result = rec.recommend(&params).unwrap();
        assert_eq!(result.recommendations.len(), 2);
        assert_eq!(result.best_crop, "Maize");
    }

    #[test]
    fn probability_count_mismatch_is_an_error() {
        let rec = SoilRecommender::new(Box::new(MockSoilClassifier::new(
            &["rice", "maize"],
            vec![1.0],
        )));
        let params = SoilParameters::from_json(&sample_body()).unwrap();
        assert!(matches!(rec.recommend(&params), Err(CropError::Inference(_))));
    }

    #[test]
    fn suitability_thresholds() {
        assert_eq!(Suitability::from_probability(0.71), Suitability::Excellent);
        assert_eq!(Suitability::from_probability(0.7), Suitability::Good);
        assert_eq!(Suitability::from_probability(0.41), Suitability::Good);
        assert_eq!(Suitability::from_probability(0.4), Suitability::Fair);
    }

    #[test]
    fn response_serializes_ordered_importances() {
        let params = SoilParameters::from_json(&sample_body()).unwrap();
        let json = serde_json::to_value(recommender().recommend(&params).unwrap()).unwrap();
        assert_eq!(json["input_parameters"]["N"], 90.0);
        let importance = json["model_info"]["feature_importance"].as_object().unwrap();
        assert_eq!(importance.len(), 7);
        assert!(importance.contains_key("rainfall"));
        assert!(json["recommendations"][0]["details"]["soil_requirements"]["N"].is_object());
    }

    #[test]
    fn metadata_validation() {
        let good = SoilModelMetadata {
            feature_columns: ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            crop_labels: vec!["rice".into()],
            feature_importances: vec![0.1; 7],
        };
        assert_eq!(good.feature_order().unwrap(), SoilParameter::ALL.to_vec());

        let mut bad = good.clone();
        bad.feature_columns[0] = "nitrogen".into();
        assert!(bad.feature_order().is_err());

        let mut short = good.clone();
        short.feature_importances.pop();
        assert!(short.feature_order().is_err());
    }

    #[test]
    fn metadata_reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        std::fs::write(
            &path,
            r#"{"feature_columns":["N","P","K","temperature","humidity","ph","rainfall"],
                "crop_labels":["rice","maize"],
                "feature_importances":[0.1,0.1,0.1,0.2,0.2,0.1,0.2]}"#,
        )
        .unwrap();
        let meta = SoilModelMetadata::from_file(&path).unwrap();
        assert_eq!(meta.crop_labels.len(), 2);
    }

    #[test]
    fn load_without_model_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = SoilRecommender::load(&dir.path().join("m.onnx"), &dir.path().join("m.json"));
        assert!(matches!(result, Err(CropError::ModelLoad(_))));
    }
}
