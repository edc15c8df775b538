//! Crop and fertilizer agronomy tables.
//!
//! Static, read-only for the process lifetime. Crop keys are lowercase
//! (`"rice"`, `"kidneybeans"`); lookups are case-insensitive.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// The seven soil/climate inputs, in model feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoilParameter {
    Nitrogen,
    Phosphorus,
    Potassium,
    Temperature,
    Humidity,
    Ph,
    Rainfall,
}

impl SoilParameter {
    /// Feature order the soil classifier was trained with.
    pub const ALL: [SoilParameter; 7] = [
        SoilParameter::Nitrogen,
        SoilParameter::Phosphorus,
        SoilParameter::Potassium,
        SoilParameter::Temperature,
        SoilParameter::Humidity,
        SoilParameter::Ph,
        SoilParameter::Rainfall,
    ];

    /// Order used when listing requirements (N, P, K, pH, climate).
    pub const DISPLAY_ORDER: [SoilParameter; 7] = [
        SoilParameter::Nitrogen,
        SoilParameter::Phosphorus,
        SoilParameter::Potassium,
        SoilParameter::Ph,
        SoilParameter::Temperature,
        SoilParameter::Humidity,
        SoilParameter::Rainfall,
    ];

    /// Request/feature key.
    pub fn key(self) -> &'static str {
        match self {
            SoilParameter::Nitrogen => "N",
            SoilParameter::Phosphorus => "P",
            SoilParameter::Potassium => "K",
            SoilParameter::Temperature => "temperature",
            SoilParameter::Humidity => "humidity",
            SoilParameter::Ph => "ph",
            SoilParameter::Rainfall => "rainfall",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SoilParameter::Nitrogen => "Nitrogen (N)",
            SoilParameter::Phosphorus => "Phosphorus (P)",
            SoilParameter::Potassium => "Potassium (K)",
            SoilParameter::Temperature => "Temperature",
            SoilParameter::Humidity => "Humidity",
            SoilParameter::Ph => "pH Level",
            SoilParameter::Rainfall => "Rainfall",
        }
    }

    /// Unit of a measured soil test value (as entered by the user).
    pub fn input_unit(self) -> &'static str {
        match self {
            SoilParameter::Nitrogen | SoilParameter::Phosphorus | SoilParameter::Potassium => {
                "mg/kg"
            }
            SoilParameter::Temperature => "°C",
            SoilParameter::Humidity => "%",
            SoilParameter::Ph => "",
            SoilParameter::Rainfall => "mm",
        }
    }
}

/// Optimal band for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterRange {
    pub optimal: [f32; 2],
    pub unit: &'static str,
    pub description: &'static str,
}

impl ParameterRange {
    pub fn min(&self) -> f32 {
        self.optimal[0]
    }

    pub fn max(&self) -> f32 {
        self.optimal[1]
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min()..=self.max()).contains(&value)
    }
}

const fn range(
    min: f32,
    max: f32,
    unit: &'static str,
    description: &'static str,
) -> ParameterRange {
    ParameterRange {
        optimal: [min, max],
        unit,
        description,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SoilRequirements {
    #[serde(rename = "N")]
    pub n: ParameterRange,
    #[serde(rename = "P")]
    pub p: ParameterRange,
    #[serde(rename = "K")]
    pub k: ParameterRange,
    pub ph: ParameterRange,
    pub temperature: ParameterRange,
    pub humidity: ParameterRange,
    pub rainfall: ParameterRange,
}

impl SoilRequirements {
    pub fn get(&self, parameter: SoilParameter) -> &ParameterRange {
        match parameter {
            SoilParameter::Nitrogen => &self.n,
            SoilParameter::Phosphorus => &self.p,
            SoilParameter::Potassium => &self.k,
            SoilParameter::Temperature => &self.temperature,
            SoilParameter::Humidity => &self.humidity,
            SoilParameter::Ph => &self.ph,
            SoilParameter::Rainfall => &self.rainfall,
        }
    }

    /// Parameters in display order.
    pub fn iter(&self) -> impl Iterator<Item = (SoilParameter, &ParameterRange)> + '_ {
        SoilParameter::DISPLAY_ORDER
            .into_iter()
            .map(move |p| (p, self.get(p)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndianLocations {
    pub major_states: &'static [&'static str],
    pub top_districts: &'static [&'static str],
    pub agro_climatic_zones: &'static [&'static str],
    pub production_share: &'static str,
    /// Category (`high_yield`, `export_quality`, ...) → regions.
    #[serde(serialize_with = "serialize_regions")]
    pub best_regions: &'static [(&'static str, &'static [&'static str])],
}

fn serialize_regions<S: Serializer>(
    regions: &&'static [(&'static str, &'static [&'static str])],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(regions.len()))?;
    for (category, places) in regions.iter() {
        map.serialize_entry(category, places)?;
    }
    map.end()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropProfile {
    pub name: &'static str,
    pub soil: SoilRequirements,
    pub recommended_fertilizers: &'static [&'static str],
    pub fertilizer_schedule: &'static str,
    pub soil_types: &'static [&'static str],
    pub season: &'static str,
    pub growth_duration: &'static str,
    pub indian_locations: Option<IndianLocations>,
}

impl CropProfile {
    pub fn display_name(&self) -> String {
        title_case(self.name)
    }
}

/// Serializes without `name`; callers pair it with the name themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FertilizerProfile {
    #[serde(skip_serializing)]
    pub name: &'static str,
    pub composition: &'static str,
    pub benefits: &'static str,
    pub application_rate: &'static str,
    pub best_for: &'static str,
}

// ═══════════════════════════════════════════════════════════
// Lookups
// ═══════════════════════════════════════════════════════════

pub fn find_crop(name: &str) -> Option<&'static CropProfile> {
    let needle = name.trim();
    CROPS.iter().find(|c| c.name.eq_ignore_ascii_case(needle))
}

pub fn find_fertilizer(name: &str) -> Option<&'static FertilizerProfile> {
    FERTILIZERS.iter().find(|f| f.name == name)
}

/// Title-cased crop names, sorted.
pub fn crop_names() -> Vec<String> {
    let mut names: Vec<String> = CROPS.iter().map(|c| c.display_name()).collect();
    names.sort();
    names
}

/// Capitalize the first letter of every alphabetic run, lowercase the rest
/// (`"kidneybeans"` → `"Kidneybeans"`, `"high_yield"` → `"High_Yield"`).
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════
// Tables
// ═══════════════════════════════════════════════════════════

pub static CROPS: &[CropProfile] = &[
    CropProfile {
        name: "rice",
        soil: SoilRequirements {
            n: range(80.0, 120.0, "kg/ha", "High nitrogen for vegetative growth"),
            p: range(40.0, 60.0, "kg/ha", "Moderate phosphorus for root development"),
            k: range(40.0, 60.0, "kg/ha", "Potassium for grain filling"),
            ph: range(5.5, 7.0, "", "Slightly acidic to neutral"),
            temperature: range(20.0, 35.0, "°C", "Warm tropical climate"),
            humidity: range(80.0, 95.0, "%", "High humidity for paddy cultivation"),
            rainfall: range(150.0, 300.0, "mm", "High water requirement"),
        },
        recommended_fertilizers: &["Urea", "DAP", "14:35:14"],
        fertilizer_schedule: "Apply 50% nitrogen at transplanting, 25% at tillering, 25% at panicle initiation",
        soil_types: &["Clayey", "Loamy"],
        season: "Kharif (monsoon season)",
        growth_duration: "120-150 days",
        indian_locations: Some(IndianLocations {
            major_states: &["West Bengal", "Uttar Pradesh", "Punjab", "Odisha", "Andhra Pradesh", "Tamil Nadu"],
            top_districts: &["Bardhaman (WB)", "Thanjavur (TN)", "East Godavari (AP)", "Cuttack (Odisha)", "Ludhiana (Punjab)"],
            agro_climatic_zones: &["Lower Gangetic Plains", "East Coast Plains", "Upper Gangetic Plains", "Trans-Gangetic Plains"],
            production_share: "West Bengal (15%), Uttar Pradesh (12%), Punjab (11%), Odisha (8%), Andhra Pradesh (7%)",
            best_regions: &[
                ("high_yield", &["Punjab", "Haryana", "Tamil Nadu"]),
                ("largest_area", &["West Bengal", "Uttar Pradesh", "Odisha"]),
                ("quality_rice", &["Basmati belt (Punjab, Haryana, UP)", "Gobindobhog (West Bengal)"]),
            ],
        }),
    },
    CropProfile {
        name: "maize",
        soil: SoilRequirements {
            n: range(120.0, 180.0, "kg/ha", "Very high nitrogen requirement"),
            p: range(60.0, 90.0, "kg/ha", "High phosphorus for root and ear development"),
            k: range(40.0, 80.0, "kg/ha", "Potassium for stalk strength"),
            ph: range(6.0, 7.5, "", "Neutral to slightly alkaline"),
            temperature: range(21.0, 27.0, "°C", "Moderate temperature"),
            humidity: range(60.0, 70.0, "%", "Moderate humidity"),
            rainfall: range(50.0, 100.0, "mm", "Moderate water requirement"),
        },
        recommended_fertilizers: &["Urea", "DAP", "17:17:17"],
        fertilizer_schedule: "Apply 30% nitrogen at sowing, 40% at knee-high stage, 30% at tasseling",
        soil_types: &["Loamy", "Black"],
        season: "Kharif or Rabi",
        growth_duration: "90-120 days",
        indian_locations: Some(IndianLocations {
            major_states: &["Karnataka", "Rajasthan", "Maharashtra", "Uttar Pradesh", "Madhya Pradesh", "Bihar"],
            top_districts: &["Davanagere (Karnataka)", "Udaipur (Rajasthan)", "Ahmednagar (Maharashtra)", "Muzaffarpur (Bihar)"],
            agro_climatic_zones: &["Northern Plains", "Central Plateau", "Western Plateau", "Southern Plateau"],
            production_share: "Karnataka (16%), Rajasthan (9%), Maharashtra (8%), Uttar Pradesh (7%), Madhya Pradesh (7%)",
            best_regions: &[
                ("high_yield", &["Punjab", "Haryana", "Karnataka"]),
                ("largest_area", &["Karnataka", "Rajasthan", "Maharashtra"]),
                ("quality_maize", &["Karnataka (sweet corn)", "Rajasthan (fodder maize)", "Maharashtra (popcorn)"]),
            ],
        }),
    },
    CropProfile {
        name: "chickpea",
        soil: SoilRequirements {
            n: range(20.0, 40.0, "kg/ha", "Low nitrogen due to nitrogen fixation"),
            p: range(40.0, 60.0, "kg/ha", "High phosphorus requirement"),
            k: range(20.0, 40.0, "kg/ha", "Moderate potassium"),
            ph: range(6.5, 7.5, "", "Neutral to slightly alkaline"),
            temperature: range(20.0, 30.0, "°C", "Cool to moderate temperature"),
            humidity: range(60.0, 70.0, "%", "Moderate humidity"),
            rainfall: range(30.0, 40.0, "mm", "Low water requirement"),
        },
        recommended_fertilizers: &["DAP", "MOP", "14:35:14"],
        fertilizer_schedule: "Apply full dose at sowing, minimal nitrogen top-dressing",
        soil_types: &["Black", "Loamy"],
        season: "Rabi (winter season)",
        growth_duration: "95-120 days",
        indian_locations: Some(IndianLocations {
            major_states: &["Madhya Pradesh", "Rajasthan", "Maharashtra", "Uttar Pradesh", "Karnataka", "Andhra Pradesh"],
            top_districts: &["Sehore (MP)", "Jalore (Rajasthan)", "Latur (Maharashtra)", "Jhansi (UP)", "Gulbarga (Karnataka)"],
            agro_climatic_zones: &["Central Plateau", "Western Plateau", "Northern Plains", "Southern Plateau"],
            production_share: "Madhya Pradesh (40%), Rajasthan (15%), Maharashtra (12%), Uttar Pradesh (8%)",
            best_regions: &[
                ("high_yield", &["Punjab", "Haryana", "Madhya Pradesh"]),
                ("largest_area", &["Madhya Pradesh", "Rajasthan", "Maharashtra"]),
                ("quality_chickpea", &["Kabuli: Maharashtra, Karnataka", "Desi: Madhya Pradesh, Rajasthan"]),
            ],
        }),
    },
    CropProfile {
        name: "kidneybeans",
        soil: SoilRequirements {
            n: range(25.0, 40.0, "kg/ha", "Moderate nitrogen, nitrogen-fixing crop"),
            p: range(50.0, 70.0, "kg/ha", "High phosphorus for nodulation"),
            k: range(30.0, 50.0, "kg/ha", "Moderate potassium"),
            ph: range(6.0, 7.0, "", "Slightly acidic to neutral"),
            temperature: range(15.0, 27.0, "°C", "Cool to moderate temperature"),
            humidity: range(65.0, 75.0, "%", "Moderate humidity"),
            rainfall: range(60.0, 120.0, "mm", "Moderate water requirement"),
        },
        recommended_fertilizers: &["DAP", "MOP", "20:20"],
        fertilizer_schedule: "Apply full dose at planting, light nitrogen topdressing if needed",
        soil_types: &["Loamy", "Sandy"],
        season: "Kharif or Rabi",
        growth_duration: "60-90 days",
        indian_locations: None,
    },
    CropProfile {
        name: "pigeonpeas",
        soil: SoilRequirements {
            n: range(20.0, 30.0, "kg/ha", "Low nitrogen, nitrogen-fixing legume"),
            p: range(50.0, 80.0, "kg/ha", "High phosphorus for root nodules"),
            k: range(20.0, 40.0, "kg/ha", "Moderate potassium"),
            ph: range(6.5, 7.5, "", "Neutral to slightly alkaline"),
            temperature: range(26.0, 30.0, "°C", "Warm temperature"),
            humidity: range(60.0, 65.0, "%", "Moderate humidity"),
            rainfall: range(60.0, 65.0, "mm", "Moderate rainfall"),
        },
        recommended_fertilizers: &["DAP", "MOP"],
        fertilizer_schedule: "Apply full dose at sowing, no nitrogen top-dressing needed",
        soil_types: &["Black", "Red"],
        season: "Kharif",
        growth_duration: "150-180 days",
        indian_locations: None,
    },
    CropProfile {
        name: "mothbeans",
        soil: SoilRequirements {
            n: range(15.0, 25.0, "kg/ha", "Very low nitrogen requirement"),
            p: range(40.0, 50.0, "kg/ha", "Moderate phosphorus"),
            k: range(20.0, 30.0, "kg/ha", "Low potassium requirement"),
            ph: range(7.0, 8.5, "", "Alkaline soil tolerant"),
            temperature: range(27.0, 35.0, "°C", "High temperature tolerance"),
            humidity: range(60.0, 75.0, "%", "Moderate humidity"),
            rainfall: range(40.0, 50.0, "mm", "Low water requirement"),
        },
        recommended_fertilizers: &["DAP", "MOP"],
        fertilizer_schedule: "Apply at sowing, drought-tolerant crop",
        soil_types: &["Sandy", "Loamy"],
        season: "Kharif",
        growth_duration: "60-90 days",
        indian_locations: None,
    },
    CropProfile {
        name: "mungbean",
        soil: SoilRequirements {
            n: range(15.0, 25.0, "kg/ha", "Low nitrogen, nitrogen-fixing"),
            p: range(40.0, 60.0, "kg/ha", "Moderate phosphorus"),
            k: range(20.0, 30.0, "kg/ha", "Low potassium"),
            ph: range(6.2, 7.2, "", "Neutral pH preferred"),
            temperature: range(28.0, 35.0, "°C", "Warm temperature"),
            humidity: range(65.0, 75.0, "%", "Moderate humidity"),
            rainfall: range(60.0, 75.0, "mm", "Moderate rainfall"),
        },
        recommended_fertilizers: &["DAP", "MOP", "20:20"],
        fertilizer_schedule: "Apply full dose at sowing",
        soil_types: &["Loamy", "Sandy"],
        season: "Kharif or Summer",
        growth_duration: "60-75 days",
        indian_locations: None,
    },
    CropProfile {
        name: "blackgram",
        soil: SoilRequirements {
            n: range(15.0, 20.0, "kg/ha", "Very low nitrogen"),
            p: range(40.0, 50.0, "kg/ha", "Moderate phosphorus"),
            k: range(15.0, 25.0, "kg/ha", "Low potassium"),
            ph: range(6.5, 7.5, "", "Neutral pH"),
            temperature: range(25.0, 35.0, "°C", "Warm temperature"),
            humidity: range(65.0, 75.0, "%", "Moderate humidity"),
            rainfall: range(60.0, 100.0, "mm", "Moderate rainfall"),
        },
        recommended_fertilizers: &["DAP", "MOP"],
        fertilizer_schedule: "Apply full dose at sowing",
        soil_types: &["Black", "Loamy"],
        season: "Kharif or Rabi",
        growth_duration: "70-90 days",
        indian_locations: None,
    },
    CropProfile {
        name: "lentil",
        soil: SoilRequirements {
            n: range(15.0, 25.0, "kg/ha", "Low nitrogen requirement"),
            p: range(50.0, 70.0, "kg/ha", "High phosphorus"),
            k: range(20.0, 30.0, "kg/ha", "Low potassium"),
            ph: range(6.0, 7.5, "", "Slightly acidic to neutral"),
            temperature: range(18.0, 30.0, "°C", "Cool to moderate temperature"),
            humidity: range(60.0, 70.0, "%", "Moderate humidity"),
            rainfall: range(25.0, 40.0, "mm", "Low water requirement"),
        },
        recommended_fertilizers: &["DAP", "MOP", "14:35:14"],
        fertilizer_schedule: "Apply full dose at sowing",
        soil_types: &["Loamy", "Black"],
        season: "Rabi",
        growth_duration: "95-110 days",
        indian_locations: None,
    },
    CropProfile {
        name: "pomegranate",
        soil: SoilRequirements {
            n: range(100.0, 150.0, "kg/ha", "High nitrogen for fruit trees"),
            p: range(50.0, 80.0, "kg/ha", "Moderate phosphorus"),
            k: range(100.0, 150.0, "kg/ha", "High potassium for fruit quality"),
            ph: range(6.5, 7.5, "", "Neutral pH"),
            temperature: range(15.0, 35.0, "°C", "Wide temperature range"),
            humidity: range(35.0, 60.0, "%", "Low to moderate humidity"),
            rainfall: range(50.0, 70.0, "mm", "Moderate rainfall"),
        },
        recommended_fertilizers: &["Urea", "DAP", "MOP"],
        fertilizer_schedule: "Split application: 4 times per year during growing season",
        soil_types: &["Red", "Black"],
        season: "Perennial",
        growth_duration: "Perennial fruit tree",
        indian_locations: None,
    },
    CropProfile {
        name: "banana",
        soil: SoilRequirements {
            n: range(200.0, 300.0, "kg/ha", "Very high nitrogen requirement"),
            p: range(50.0, 100.0, "kg/ha", "Moderate phosphorus"),
            k: range(300.0, 500.0, "kg/ha", "Very high potassium for fruit development"),
            ph: range(6.0, 7.5, "", "Slightly acidic to neutral"),
            temperature: range(26.0, 30.0, "°C", "Warm tropical climate"),
            humidity: range(75.0, 85.0, "%", "High humidity"),
            rainfall: range(100.0, 180.0, "mm", "High water requirement"),
        },
        recommended_fertilizers: &["Urea", "MOP", "17:17:17"],
        fertilizer_schedule: "Monthly applications throughout the year",
        soil_types: &["Loamy", "Red"],
        season: "Year-round",
        growth_duration: "12-15 months",
        indian_locations: None,
    },
    CropProfile {
        name: "mango",
        soil: SoilRequirements {
            n: range(100.0, 200.0, "kg/ha", "High nitrogen for tree growth"),
            p: range(50.0, 100.0, "kg/ha", "Moderate phosphorus"),
            k: range(100.0, 200.0, "kg/ha", "High potassium for fruit quality"),
            ph: range(5.5, 7.5, "", "Slightly acidic to neutral"),
            temperature: range(24.0, 30.0, "°C", "Warm tropical climate"),
            humidity: range(50.0, 60.0, "%", "Moderate humidity"),
            rainfall: range(75.0, 125.0, "mm", "Moderate to high rainfall"),
        },
        recommended_fertilizers: &["Urea", "DAP", "MOP"],
        fertilizer_schedule: "3-4 split applications during growing season",
        soil_types: &["Red", "Loamy"],
        season: "Perennial",
        growth_duration: "Perennial fruit tree",
        indian_locations: Some(IndianLocations {
            major_states: &["Uttar Pradesh", "Andhra Pradesh", "Karnataka", "Tamil Nadu", "Gujarat", "Maharashtra"],
            top_districts: &["Lucknow (UP)", "Chittoor (AP)", "Bangalore Rural (Karnataka)", "Dharmapuri (TN)", "Junagadh (Gujarat)"],
            agro_climatic_zones: &["Northern Plains", "Southern Plateau", "East Coast Plains", "West Coast Plains"],
            production_share: "Uttar Pradesh (23%), Andhra Pradesh (20%), Karnataka (11%), Tamil Nadu (9%), Gujarat (7%)",
            best_regions: &[
                ("famous_varieties", &["Alphonso (Maharashtra, Gujarat)", "Dasheri (UP)", "Kesar (Gujarat)", "Banganapalli (AP)"]),
                ("largest_area", &["Uttar Pradesh", "Andhra Pradesh", "Karnataka"]),
                ("export_quality", &["Maharashtra (Alphonso)", "Gujarat (Kesar)", "Karnataka (Totapuri)"]),
            ],
        }),
    },
    CropProfile {
        name: "grapes",
        soil: SoilRequirements {
            n: range(80.0, 120.0, "kg/ha", "Moderate nitrogen"),
            p: range(40.0, 80.0, "kg/ha", "Moderate phosphorus"),
            k: range(80.0, 150.0, "kg/ha", "High potassium for fruit quality"),
            ph: range(6.0, 8.0, "", "Neutral to slightly alkaline"),
            temperature: range(15.0, 25.0, "°C", "Cool to moderate temperature"),
            humidity: range(60.0, 70.0, "%", "Moderate humidity"),
            rainfall: range(50.0, 75.0, "mm", "Moderate rainfall"),
        },
        recommended_fertilizers: &["Urea", "DAP", "MOP"],
        fertilizer_schedule: "Split application: pre-bloom, fruit set, veraison",
        soil_types: &["Red", "Black"],
        season: "Perennial",
        growth_duration: "Perennial vine",
        indian_locations: None,
    },
    CropProfile {
        name: "watermelon",
        soil: SoilRequirements {
            n: range(100.0, 150.0, "kg/ha", "High nitrogen for vine growth"),
            p: range(50.0, 80.0, "kg/ha", "Moderate phosphorus"),
            k: range(150.0, 200.0, "kg/ha", "High potassium for fruit development"),
            ph: range(6.0, 7.0, "", "Slightly acidic to neutral"),
            temperature: range(24.0, 35.0, "°C", "Warm temperature"),
            humidity: range(65.0, 75.0, "%", "Moderate humidity"),
            rainfall: range(50.0, 75.0, "mm", "Moderate rainfall"),
        },
        recommended_fertilizers: &["Urea", "DAP", "MOP"],
        fertilizer_schedule: "Split application: planting, flowering, fruit development",
        soil_types: &["Sandy", "Loamy"],
        season: "Summer",
        growth_duration: "80-100 days",
        indian_locations: None,
    },
    CropProfile {
        name: "muskmelon",
        soil: SoilRequirements {
            n: range(80.0, 120.0, "kg/ha", "Moderate to high nitrogen"),
            p: range(40.0, 60.0, "kg/ha", "Moderate phosphorus"),
            k: range(100.0, 150.0, "kg/ha", "High potassium for sweetness"),
            ph: range(6.0, 7.0, "", "Neutral pH"),
            temperature: range(24.0, 30.0, "°C", "Warm temperature"),
            humidity: range(60.0, 70.0, "%", "Moderate humidity"),
            rainfall: range(50.0, 70.0, "mm", "Moderate rainfall"),
        },
        recommended_fertilizers: &["Urea", "DAP", "MOP"],
        fertilizer_schedule: "Split application throughout growing season",
        soil_types: &["Sandy", "Loamy"],
        season: "Summer",
        growth_duration: "90-110 days",
        indian_locations: None,
    },
    CropProfile {
        name: "apple",
        soil: SoilRequirements {
            n: range(150.0, 200.0, "kg/ha", "High nitrogen for tree growth"),
            p: range(60.0, 100.0, "kg/ha", "Moderate to high phosphorus"),
            k: range(150.0, 250.0, "kg/ha", "High potassium for fruit quality"),
            ph: range(6.0, 7.0, "", "Slightly acidic to neutral"),
            temperature: range(15.0, 25.0, "°C", "Cool to moderate temperature"),
            humidity: range(60.0, 70.0, "%", "Moderate humidity"),
            rainfall: range(100.0, 125.0, "mm", "High rainfall"),
        },
        recommended_fertilizers: &["Urea", "DAP", "MOP"],
        fertilizer_schedule: "Split application: spring, summer, fall",
        soil_types: &["Loamy", "Red"],
        season: "Perennial",
        growth_duration: "Perennial fruit tree",
        indian_locations: Some(IndianLocations {
            major_states: &["Jammu & Kashmir", "Himachal Pradesh", "Uttarakhand", "Arunachal Pradesh"],
            top_districts: &["Baramulla (J&K)", "Shimla (HP)", "Chamoli (Uttarakhand)", "West Kameng (Arunachal)"],
            agro_climatic_zones: &["Western Himalayas", "Eastern Himalayas", "Hill Regions"],
            production_share: "Jammu & Kashmir (77%), Himachal Pradesh (19%), Uttarakhand (2%), Others (2%)",
            best_regions: &[
                ("quality_varieties", &["Kashmir (Red Delicious)", "Himachal (Royal Delicious)", "Uttarakhand (Gala)"]),
                ("high_altitude", &["Leh-Ladakh (organic)", "Kinnaur (HP)", "Kashmir Valley"]),
                ("export_quality", &["Kashmir Valley", "Shimla Hills", "Kullu Valley"]),
            ],
        }),
    },
    CropProfile {
        name: "orange",
        soil: SoilRequirements {
            n: range(150.0, 250.0, "kg/ha", "High nitrogen requirement"),
            p: range(50.0, 80.0, "kg/ha", "Moderate phosphorus"),
            k: range(150.0, 200.0, "kg/ha", "High potassium for fruit quality"),
            ph: range(6.0, 7.5, "", "Slightly acidic to neutral"),
            temperature: range(15.0, 30.0, "°C", "Moderate to warm temperature"),
            humidity: range(55.0, 65.0, "%", "Moderate humidity"),
            rainfall: range(100.0, 120.0, "mm", "High rainfall"),
        },
        recommended_fertilizers: &["Urea", "DAP", "MOP"],
        fertilizer_schedule: "Split application: 3-4 times per year",
        soil_types: &["Red", "Loamy"],
        season: "Perennial",
        growth_duration: "Perennial citrus tree",
        indian_locations: None,
    },
    CropProfile {
        name: "papaya",
        soil: SoilRequirements {
            n: range(200.0, 300.0, "kg/ha", "Very high nitrogen requirement"),
            p: range(50.0, 100.0, "kg/ha", "Moderate phosphorus"),
            k: range(200.0, 300.0, "kg/ha", "Very high potassium"),
            ph: range(6.0, 7.0, "", "Neutral pH"),
            temperature: range(25.0, 30.0, "°C", "Warm tropical climate"),
            humidity: range(70.0, 80.0, "%", "High humidity"),
            rainfall: range(100.0, 150.0, "mm", "High rainfall"),
        },
        recommended_fertilizers: &["Urea", "MOP", "17:17:17"],
        fertilizer_schedule: "Monthly applications throughout the year",
        soil_types: &["Loamy", "Red"],
        season: "Year-round",
        growth_duration: "10-12 months",
        indian_locations: None,
    },
    CropProfile {
        name: "coconut",
        soil: SoilRequirements {
            n: range(100.0, 150.0, "kg/ha", "Moderate to high nitrogen"),
            p: range(40.0, 60.0, "kg/ha", "Moderate phosphorus"),
            k: range(140.0, 200.0, "kg/ha", "High potassium for nut development"),
            ph: range(5.2, 8.0, "", "Wide pH tolerance"),
            temperature: range(27.0, 35.0, "°C", "High temperature tolerance"),
            humidity: range(80.0, 90.0, "%", "Very high humidity"),
            rainfall: range(150.0, 250.0, "mm", "Very high rainfall"),
        },
        recommended_fertilizers: &["Urea", "MOP", "DAP"],
        fertilizer_schedule: "Quarterly applications throughout the year",
        soil_types: &["Sandy", "Loamy"],
        season: "Perennial",
        growth_duration: "Perennial palm tree",
        indian_locations: None,
    },
    CropProfile {
        name: "cotton",
        soil: SoilRequirements {
            n: range(120.0, 180.0, "kg/ha", "High nitrogen for fiber development"),
            p: range(60.0, 80.0, "kg/ha", "Moderate to high phosphorus"),
            k: range(60.0, 100.0, "kg/ha", "High potassium for fiber quality"),
            ph: range(5.8, 8.0, "", "Slightly acidic to alkaline"),
            temperature: range(21.0, 30.0, "°C", "Warm temperature"),
            humidity: range(50.0, 60.0, "%", "Moderate humidity"),
            rainfall: range(50.0, 100.0, "mm", "Moderate rainfall"),
        },
        recommended_fertilizers: &["Urea", "DAP", "MOP"],
        fertilizer_schedule: "Split application: planting, squaring, flowering",
        soil_types: &["Black", "Red"],
        season: "Kharif",
        growth_duration: "150-180 days",
        indian_locations: Some(IndianLocations {
            major_states: &["Gujarat", "Maharashtra", "Telangana", "Karnataka", "Andhra Pradesh", "Rajasthan"],
            top_districts: &["Surendranagar (Gujarat)", "Yavatmal (Maharashtra)", "Adilabad (Telangana)", "Raichur (Karnataka)"],
            agro_climatic_zones: &["Western Plateau", "Central Plateau", "Southern Plateau", "Western Plains"],
            production_share: "Gujarat (33%), Maharashtra (26%), Telangana (12%), Karnataka (8%), Andhra Pradesh (6%)",
            best_regions: &[
                ("bt_cotton", &["Gujarat", "Maharashtra", "Telangana"]),
                ("organic_cotton", &["Madhya Pradesh", "Odisha", "Rajasthan"]),
                ("quality_fiber", &["Gujarat (long staple)", "Maharashtra (medium staple)", "Punjab (extra long)"]),
            ],
        }),
    },
    CropProfile {
        name: "jute",
        soil: SoilRequirements {
            n: range(80.0, 120.0, "kg/ha", "High nitrogen for fiber growth"),
            p: range(40.0, 60.0, "kg/ha", "Moderate phosphorus"),
            k: range(40.0, 60.0, "kg/ha", "Moderate potassium"),
            ph: range(6.0, 7.5, "", "Neutral pH"),
            temperature: range(24.0, 35.0, "°C", "Warm temperature"),
            humidity: range(70.0, 80.0, "%", "High humidity"),
            rainfall: range(150.0, 250.0, "mm", "High rainfall"),
        },
        recommended_fertilizers: &["Urea", "DAP", "MOP"],
        fertilizer_schedule: "Split application during vegetative growth",
        soil_types: &["Clayey", "Loamy"],
        season: "Kharif",
        growth_duration: "120-150 days",
        indian_locations: None,
    },
    CropProfile {
        name: "coffee",
        soil: SoilRequirements {
            n: range(200.0, 300.0, "kg/ha", "Very high nitrogen for perennial crop"),
            p: range(80.0, 120.0, "kg/ha", "High phosphorus"),
            k: range(200.0, 300.0, "kg/ha", "Very high potassium for bean development"),
            ph: range(6.0, 6.5, "", "Slightly acidic"),
            temperature: range(15.0, 25.0, "°C", "Cool to moderate temperature"),
            humidity: range(70.0, 80.0, "%", "High humidity"),
            rainfall: range(150.0, 200.0, "mm", "High rainfall"),
        },
        recommended_fertilizers: &["Urea", "DAP", "MOP"],
        fertilizer_schedule: "Split application: pre-monsoon, post-monsoon, post-harvest",
        soil_types: &["Red", "Loamy"],
        season: "Perennial",
        growth_duration: "Perennial shrub",
        indian_locations: None,
    },
];

pub static FERTILIZERS: &[FertilizerProfile] = &[
    FertilizerProfile {
        name: "Urea",
        composition: "46% Nitrogen",
        benefits: "Rapid nitrogen supply, promotes vegetative growth",
        application_rate: "100-200 kg/ha",
        best_for: "Leafy crops, cereals, fruit trees",
    },
    FertilizerProfile {
        name: "DAP",
        composition: "18% Nitrogen, 46% Phosphorus",
        benefits: "Root development, flowering, energy transfer",
        application_rate: "100-150 kg/ha",
        best_for: "All crops during planting",
    },
    FertilizerProfile {
        name: "MOP",
        composition: "60% Potassium",
        benefits: "Disease resistance, water regulation, fruit quality",
        application_rate: "50-100 kg/ha",
        best_for: "Fruit crops, root crops",
    },
    FertilizerProfile {
        name: "14:35:14",
        composition: "14% N, 35% P, 14% K",
        benefits: "Balanced nutrition with high phosphorus",
        application_rate: "150-200 kg/ha",
        best_for: "Legumes, root crops",
    },
    FertilizerProfile {
        name: "17:17:17",
        composition: "17% N, 17% P, 17% K",
        benefits: "Complete balanced nutrition",
        application_rate: "200-250 kg/ha",
        best_for: "General purpose fertilizer",
    },
    FertilizerProfile {
        name: "20:20",
        composition: "20% N, 20% P",
        benefits: "High nitrogen and phosphorus",
        application_rate: "150-200 kg/ha",
        best_for: "Early growth stages",
    },
    FertilizerProfile {
        name: "28:28",
        composition: "28% N, 28% P",
        benefits: "High concentration N-P fertilizer",
        application_rate: "100-150 kg/ha",
        best_for: "Intensive farming",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_have_expected_sizes() {
        assert_eq!(CROPS.len(), 22);
        assert_eq!(FERTILIZERS.len(), 7);
    }

    #[test]
    fn every_recommended_fertilizer_is_described() {
        for crop in CROPS {
            for name in crop.recommended_fertilizers {
                assert!(
                    find_fertilizer(name).is_some(),
                    "{} recommends unknown fertilizer {name}",
                    crop.name
                );
            }
        }
    }

    #[test]
    fn every_range_is_ordered() {
        for crop in CROPS {
            for (param, range) in crop.soil.iter() {
                assert!(
                    range.min() <= range.max(),
                    "{} {} has min > max",
                    crop.name,
                    param.key()
                );
            }
        }
    }

    #[test]
    fn crop_lookup_ignores_case_and_whitespace() {
        assert_eq!(find_crop("Rice").unwrap().name, "rice");
        assert_eq!(find_crop(" MAIZE ").unwrap().name, "maize");
        assert!(find_crop("wheat").is_none());
    }

    #[test]
    fn crop_names_are_sorted_and_title_cased() {
        let names = crop_names();
        assert_eq!(names.len(), 22);
        assert_eq!(names.first().map(String::as_str), Some("Apple"));
        assert!(names.contains(&"Kidneybeans".to_string()));
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("rice"), "Rice");
        assert_eq!(title_case("high_yield"), "High_Yield");
        assert_eq!(title_case("14:35:14"), "14:35:14");
        assert_eq!(title_case("BT cotton"), "Bt Cotton");
    }

    #[test]
    fn six_crops_have_location_data() {
        let with_locations: Vec<_> = CROPS
            .iter()
            .filter(|c| c.indian_locations.is_some())
            .map(|c| c.name)
            .collect();
        assert_eq!(
            with_locations,
            ["rice", "maize", "chickpea", "mango", "apple", "cotton"]
        );
    }

    #[test]
    fn requirements_serialize_with_short_nutrient_keys() {
        let json = serde_json::to_value(find_crop("rice").unwrap().soil).unwrap();
        assert_eq!(json["N"]["optimal"][0], 80.0);
        assert_eq!(json["ph"]["optimal"][1], 7.0);
        assert_eq!(json["temperature"]["unit"], "°C");
    }

    #[test]
    fn best_regions_serialize_as_map() {
        let locations = find_crop("apple").unwrap().indian_locations.unwrap();
        let json = serde_json::to_value(locations).unwrap();
        assert_eq!(json["best_regions"]["export_quality"][0], "Kashmir Valley");
    }

    #[test]
    fn parameter_keys_round_trip() {
        for p in SoilParameter::ALL {
            assert_eq!(SoilParameter::from_key(p.key()), Some(p));
        }
        assert_eq!(SoilParameter::from_key("n"), None);
    }
}
