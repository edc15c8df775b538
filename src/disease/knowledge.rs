//! Static disease guidance keyed by exact class label (`<Plant>___<Condition>`).

use super::types::DiseaseInfo;

impl DiseaseInfo {
    /// Returned for any label without a table entry.
    pub const UNKNOWN: DiseaseInfo = DiseaseInfo {
        severity: "Unknown",
        description: "Information not available",
        treatment: "Consult agricultural expert",
        prevention: "Follow general plant care guidelines",
    };
}

const DISEASE_TABLE: &[(&str, DiseaseInfo)] = &[
    (
        "Apple___Apple_scab",
        DiseaseInfo {
            severity: "Moderate",
            description: "Fungal disease causing dark spots on leaves and fruit",
            treatment: "Apply fungicides, remove infected leaves, improve air circulation",
            prevention: "Plant resistant varieties, avoid overhead watering",
        },
    ),
    (
        "Apple___Cedar_apple_rust",
        DiseaseInfo {
            severity: "Moderate",
            description: "Fungal disease causing orange spots on leaves",
            treatment: "Remove nearby cedar trees, apply fungicides in spring",
            prevention: "Plant resistant varieties, maintain distance from cedar trees",
        },
    ),
    (
        "Tomato___Early_blight",
        DiseaseInfo {
            severity: "High",
            description: "Fungal disease causing brown spots with concentric rings",
            treatment: "Apply copper-based fungicides, remove affected leaves",
            prevention: "Rotate crops, mulch soil, avoid overhead watering",
        },
    ),
    (
        "Tomato___Late_blight",
        DiseaseInfo {
            severity: "Critical",
            description: "Highly destructive fungal disease, can kill entire plants",
            treatment: "Remove infected plants immediately, apply fungicides preventively",
            prevention: "Use resistant varieties, ensure good ventilation, avoid wet conditions",
        },
    ),
    (
        "Potato___Early_blight",
        DiseaseInfo {
            severity: "Moderate",
            description: "Fungal disease causing dark spots on leaves",
            treatment: "Apply fungicides, remove infected foliage",
            prevention: "Rotate crops, plant certified seed potatoes",
        },
    ),
    (
        "Potato___Late_blight",
        DiseaseInfo {
            severity: "Critical",
            description: "Devastating disease that caused Irish Potato Famine",
            treatment: "Destroy infected plants, apply preventive fungicides",
            prevention: "Use resistant varieties, avoid planting in wet conditions",
        },
    ),
];

/// Look up guidance for a class label. Never fails: a miss yields
/// [`DiseaseInfo::UNKNOWN`].
pub fn lookup_disease_info(label: &str) -> DiseaseInfo {
    DISEASE_TABLE
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, info)| *info)
        .unwrap_or(DiseaseInfo::UNKNOWN)
}

/// Labels with dedicated guidance.
pub fn known_labels() -> impl Iterator<Item = &'static str> {
    DISEASE_TABLE.iter().map(|(key, _)| *key)
}
