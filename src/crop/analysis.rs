use serde::Serialize;

use super::data::{
    find_crop, find_fertilizer, CropProfile, FertilizerProfile, IndianLocations, SoilRequirements,
};
use super::CropError;

#[derive(Debug, Clone, Serialize)]
pub struct FertilizerRecommendation {
    pub name: &'static str,
    pub details: FertilizerProfile,
}

/// Location block; crops without curated data get a fixed message.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LocationInfo {
    Known(IndianLocations),
    Unavailable { message: &'static str },
}

impl LocationInfo {
    pub fn known(&self) -> Option<&IndianLocations> {
        match self {
            LocationInfo::Known(locations) => Some(locations),
            LocationInfo::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CropAnalysis {
    pub crop: String,
    pub soil_requirements: SoilRequirements,
    pub fertilizer_recommendations: Vec<FertilizerRecommendation>,
    pub fertilizer_schedule: &'static str,
    pub recommended_soil_types: &'static [&'static str],
    pub growing_season: &'static str,
    pub growth_duration: &'static str,
    pub indian_locations: LocationInfo,
}

/// Everything known about one crop, by case-insensitive name.
pub fn analyze_crop(name: &str) -> Result<CropAnalysis, CropError> {
    let profile =
        find_crop(name).ok_or_else(|| CropError::UnknownCrop(name.trim().to_string()))?;
    Ok(CropAnalysis::from_profile(profile))
}

impl CropAnalysis {
    pub fn from_profile(profile: &CropProfile) -> Self {
        let fertilizer_recommendations = profile
            .recommended_fertilizers
            .iter()
            .filter_map(|name| find_fertilizer(name))
            .map(|details| FertilizerRecommendation {
                name: details.name,
                details: *details,
            })
            .collect();

        let indian_locations = match profile.indian_locations {
            Some(locations) => LocationInfo::Known(locations),
            None => LocationInfo::Unavailable {
                message: "Location data not available for this crop",
            },
        };

        Self {
            crop: profile.display_name(),
            soil_requirements: profile.soil,
            fertilizer_recommendations,
            fertilizer_schedule: profile.fertilizer_schedule,
            recommended_soil_types: profile.soil_types,
            growing_season: profile.season,
            growth_duration: profile.growth_duration,
            indian_locations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rice_analysis_is_complete() {
        let analysis = analyze_crop("rice").unwrap();
        assert_eq!(analysis.crop, "Rice");
        assert_eq!(analysis.fertilizer_recommendations.len(), 3);
        assert_eq!(analysis.fertilizer_recommendations[0].name, "Urea");
        assert_eq!(analysis.growing_season, "Kharif (monsoon season)");
        assert_eq!(analysis.recommended_soil_types, ["Clayey", "Loamy"]);
        assert!(analysis.indian_locations.known().is_some());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(analyze_crop("CoFfEe").unwrap().crop, "Coffee");
    }

    #[test]
    fn unknown_crop_is_rejected() {
        assert!(matches!(analyze_crop("wheat"), Err(CropError::UnknownCrop(_))));
        assert!(matches!(analyze_crop(""), Err(CropError::UnknownCrop(_))));
    }

    #[test]
    fn missing_locations_serialize_as_message() {
        let json = serde_json::to_value(analyze_crop("jute").unwrap()).unwrap();
        assert_eq!(
            json["indian_locations"]["message"],
            "Location data not available for this crop"
        );
    }

    #[test]
    fn serialized_shape_matches_api_field_names() {
        let json = serde_json::to_value(analyze_crop("cotton").unwrap()).unwrap();
        assert_eq!(json["crop"], "Cotton");
        assert_eq!(json["soil_requirements"]["K"]["optimal"][1], 100.0);
        assert_eq!(
            json["fertilizer_recommendations"][0]["details"]["composition"],
            "46% Nitrogen"
        );
        assert!(json["fertilizer_recommendations"][0]["details"]
            .get("name")
            .is_none());
        assert_eq!(json["indian_locations"]["best_regions"]["bt_cotton"][0], "Gujarat");
    }
}
