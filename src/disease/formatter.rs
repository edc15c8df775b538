//! Result shaping: top-N selection, label splitting, confidence tiers and
//! the disease-guidance join. No I/O.

use chrono::NaiveDateTime;

use super::knowledge::lookup_disease_info;
use super::types::{
    ClassPrediction, ConfidenceLevel, ModelVariant, PredictionResult, MAX_TOP_N,
};
use super::DiseaseError;

/// Separator between plant and condition in a class label.
const LABEL_DELIMITER: &str = "___";
const UNKNOWN_COMPONENT: &str = "Unknown";

#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    pub top_n: usize,
    pub model_type: ModelVariant,
    pub used_tta: bool,
    pub enhanced_image: bool,
    pub timestamp: NaiveDateTime,
}

/// Build the full result for one probability vector.
///
/// `top_n` is clamped to `1..=10` and to the class count. Ties keep the
/// original class order.
pub fn format_results(
    probabilities: &[f32],
    classes: &[String],
    options: &FormatOptions,
) -> Result<PredictionResult, DiseaseError> {
    if probabilities.len() != classes.len() {
        return Err(DiseaseError::ShapeMismatch {
            classes: classes.len(),
            outputs: probabilities.len(),
        });
    }
    if classes.is_empty() {
        return Err(DiseaseError::Inference("empty probability vector".into()));
    }

    let ranked = top_indices(probabilities, clamp_top_n(options.top_n, classes.len()));

    let all_predictions: Vec<ClassPrediction> = ranked
        .iter()
        .map(|&idx| {
            let label = &classes[idx];
            let (plant, disease) = split_label(label);
            let confidence = probabilities[idx];
            ClassPrediction {
                plant: plant.to_string(),
                disease: disease.to_string(),
                full_name: label.clone(),
                confidence,
                confidence_percentage: format_percentage(confidence),
                is_healthy: is_healthy(disease),
            }
        })
        .collect();

    let top = &all_predictions[0];

    Ok(PredictionResult {
        top_prediction: top.full_name.clone(),
        confidence: top.confidence,
        confidence_percentage: top.confidence_percentage.clone(),
        confidence_level: ConfidenceLevel::from_confidence(top.confidence),
        plant: top.plant.clone(),
        disease: top.disease.clone(),
        is_healthy: top.is_healthy,
        model_type: options.model_type,
        used_tta: options.used_tta,
        enhanced_image: options.enhanced_image,
        timestamp: options
            .timestamp
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string(),
        disease_info: lookup_disease_info(&top.full_name),
        all_predictions,
        original_image: None,
        image_info: None,
    })
}

pub fn clamp_top_n(requested: usize, class_count: usize) -> usize {
    requested.clamp(1, MAX_TOP_N).min(class_count)
}

/// Indices of the `n` largest values, descending, stable for ties.
fn top_indices(values: &[f32], n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    indices.truncate(n);
    indices
}

/// `"Tomato___Late_blight"` → `("Tomato", "Late_blight")`; a label with no
/// delimiter keeps itself as the plant and gets `"Unknown"` as condition.
pub fn split_label(label: &str) -> (&str, &str) {
    let mut parts = label.split(LABEL_DELIMITER);
    let plant = parts.next().unwrap_or(UNKNOWN_COMPONENT);
    let disease = parts.next().unwrap_or(UNKNOWN_COMPONENT);
    (plant, disease)
}

pub fn is_healthy(condition: &str) -> bool {
    condition.to_lowercase().contains("healthy")
}

fn format_percentage(confidence: f32) -> String {
    format!("{:.2}%", confidence * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disease::types::DiseaseInfo;

    fn options(top_n: usize) -> FormatOptions {
        FormatOptions {
            top_n,
            model_type: ModelVariant::Advanced,
            used_tta: true,
            enhanced_image: false,
            timestamp: chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        }
    }

    fn classes(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn three_class_top_two() {
        let labels = classes(&["A___healthy", "B___blight", "C___rust"]);
        let result = format_results(&[0.1, 0.7, 0.2], &labels, &options(2)).unwrap();

        assert_eq!(result.all_predictions.len(), 2);
        assert_eq!(result.all_predictions[0].full_name, "B___blight");
        assert_eq!(result.all_predictions[0].confidence, 0.7);
        assert_eq!(result.confidence_level, ConfidenceLevel::Medium);
        assert_eq!(result.all_predictions[1].full_name, "C___rust");
        assert_eq!(result.top_prediction, "B___blight");
        assert_eq!(result.plant, "B");
        assert_eq!(result.disease, "blight");
        assert!(!result.is_healthy);
    }

    #[test]
    fn output_is_non_increasing() {
        let labels = classes(&["a", "b", "c", "d", "e", "f"]);
        let probs = [0.05, 0.3, 0.05, 0.4, 0.1, 0.1];
        let result = format_results(&probs, &labels, &options(6)).unwrap();
        for pair in result.all_predictions.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn ties_keep_index_order() {
        let labels = classes(&["X___one", "X___two", "X___three"]);
        let result = format_results(&[0.25, 0.5, 0.25], &labels, &options(3)).unwrap();
        let names: Vec<_> = result
            .all_predictions
            .iter()
            .map(|p| p.full_name.as_str())
            .collect();
        assert_eq!(names, ["X___two", "X___one", "X___three"]);
    }

    #[test]
    fn top_n_clamped_to_class_count_and_ten() {
        assert_eq!(clamp_top_n(5, 3), 3);
        assert_eq!(clamp_top_n(0, 3), 1);
        assert_eq!(clamp_top_n(50, 38), 10);

        let labels = classes(&["a", "b"]);
        let result = format_results(&[0.4, 0.6], &labels, &options(8)).unwrap();
        assert_eq!(result.all_predictions.len(), 2);
    }

    #[test]
    fn label_without_delimiter_has_unknown_condition() {
        assert_eq!(split_label("Background_without_leaves"), ("Background_without_leaves", "Unknown"));
        assert_eq!(split_label("Corn___Common_rust"), ("Corn", "Common_rust"));
    }

    #[test]
    fn healthy_flag_is_case_insensitive() {
        assert!(is_healthy("healthy"));
        assert!(is_healthy("Healthy_leaf"));
        assert!(is_healthy("HEALTHY"));
        assert!(!is_healthy("Late_blight"));
        assert!(!is_healthy("Unknown"));
    }

    #[test]
    fn metadata_join_for_top_class_only() {
        let labels = classes(&["Potato___Late_blight", "Peach___healthy"]);
        let result = format_results(&[0.9, 0.1], &labels, &options(2)).unwrap();
        assert_eq!(result.disease_info.severity, "Critical");
        assert_eq!(result.confidence_level, ConfidenceLevel::High);

        let result = format_results(&[0.1, 0.9], &labels, &options(2)).unwrap();
        assert_eq!(result.disease_info, DiseaseInfo::UNKNOWN);
        assert!(result.is_healthy);
    }

    #[test]
    fn percentage_uses_two_decimals() {
        let labels = classes(&["A___x", "B___y"]);
        let result = format_results(&[0.123456, 0.876544], &labels, &options(2)).unwrap();
        assert_eq!(result.confidence_percentage, "87.65%");
        assert_eq!(result.all_predictions[1].confidence_percentage, "12.35%");
    }

    #[test]
    fn annotations_and_timestamp_carried() {
        let labels = classes(&["A___x"]);
        let result = format_results(&[1.0], &labels, &options(1)).unwrap();
        assert!(result.used_tta);
        assert!(!result.enhanced_image);
        assert_eq!(result.model_type, ModelVariant::Advanced);
        assert_eq!(result.timestamp, "2024-03-01T10:30:00.000000");
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let labels = classes(&["A___x", "B___y"]);
        let err = format_results(&[0.2, 0.3, 0.5], &labels, &options(2)).unwrap_err();
        assert!(matches!(
            err,
            DiseaseError::ShapeMismatch { classes: 2, outputs: 3 }
        ));
    }

    #[test]
    fn serialized_shape() {
        let labels = classes(&["Apple___Apple_scab", "Apple___healthy"]);
        let result = format_results(&[0.6, 0.4], &labels, &options(2)).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["model_type"], "advanced");
        assert_eq!(json["confidence_level"], "Medium");
        assert_eq!(json["disease_info"]["severity"], "Moderate");
        assert_eq!(json["all_predictions"][1]["is_healthy"], true);
        assert!(json.get("original_image").is_none());
    }
}
