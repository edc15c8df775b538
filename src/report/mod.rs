//! PDF reports: per-crop agronomy analysis and AI soil-prediction summary.

pub mod pdf;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;

use crate::crop::analysis::{CropAnalysis, LocationInfo};
use crate::crop::data::{title_case, SoilParameter, SoilRequirements};
use crate::crop::recommend::SoilRecommendation;
use pdf::{ReportWriter, Style, CONTENT_WIDTH};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

const REPORT_TITLE: &str = "Smart Crop Selection System";
const REPORT_SUBTITLE: &str = "Comprehensive Soil Analysis & Location Report";
const DISCLAIMER: &str = "This report is generated by an AI-powered system for informational \
purposes. Please consult with local agricultural experts and conduct soil tests before making \
farming decisions. The recommendations are based on general agricultural practices and may need \
adjustment based on local conditions, climate variations, and specific field requirements.";
const GENERATED_BY: &str =
    "Generated by: Smart Crop Selection System | Technology: Machine Learning & Agricultural Science";

/// `Crop_Analysis_Rice_20240101_093000.pdf`
pub fn crop_report_filename(crop: &str, at: NaiveDateTime) -> String {
    format!("Crop_Analysis_{}_{}.pdf", title_case(crop), at.format("%Y%m%d_%H%M%S"))
}

/// `AI_Crop_Predictions_20240101_093000.pdf`
pub fn ai_report_filename(at: NaiveDateTime) -> String {
    format!("AI_Crop_Predictions_{}.pdf", at.format("%Y%m%d_%H%M%S"))
}

/// Stateless; the generation time is stamped per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CropReportGenerator;

impl CropReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_crop_report(&self, analysis: &CropAnalysis) -> Result<Vec<u8>, ReportError> {
        self.crop_report_at(analysis, Local::now().naive_local())
    }

    pub fn generate_ai_prediction_report(
        &self,
        prediction: &SoilRecommendation,
    ) -> Result<Vec<u8>, ReportError> {
        self.ai_report_at(prediction, Local::now().naive_local())
    }

    fn crop_report_at(
        &self,
        analysis: &CropAnalysis,
        at: NaiveDateTime,
    ) -> Result<Vec<u8>, ReportError> {
        let mut w = ReportWriter::new(&format!("Crop Analysis - {}", analysis.crop))?;
        header(&mut w, at);

        w.section("Crop Analysis Summary");
        w.table(
            &[55.0, CONTENT_WIDTH - 55.0],
            &["Field", "Value"],
            &[
                vec!["Crop Name".into(), analysis.crop.clone()],
                vec!["Growing Season".into(), analysis.growing_season.into()],
                vec!["Growth Duration".into(), analysis.growth_duration.into()],
                vec![
                    "Recommended Soil Types".into(),
                    analysis.recommended_soil_types.join(", "),
                ],
            ],
        );

        soil_requirements(&mut w, &analysis.soil_requirements);

        w.section("Fertilizer Recommendations");
        let fertilizer_rows: Vec<Vec<String>> = analysis
            .fertilizer_recommendations
            .iter()
            .map(|f| {
                vec![
                    f.name.to_string(),
                    f.details.composition.to_string(),
                    f.details.application_rate.to_string(),
                    f.details.benefits.to_string(),
                ]
            })
            .collect();
        w.table(
            &[30.0, 38.0, 33.0, CONTENT_WIDTH - 101.0],
            &["Fertilizer", "Composition", "Application Rate", "Benefits"],
            &fertilizer_rows,
        );
        w.labeled("Application Schedule:", analysis.fertilizer_schedule);

        if let LocationInfo::Known(locations) = &analysis.indian_locations {
            w.section("Best Growing Locations in India");
            w.labeled("Major Growing States:", &locations.major_states.join(", "));
            w.paragraph("Top Districts:", Style::Bold);
            for district in locations.top_districts {
                w.paragraph(&format!("  - {district}"), Style::Body);
            }
            w.space(1.5);
            w.labeled("Production Share:", locations.production_share);
            w.labeled(
                "Suitable Agro-Climatic Zones:",
                &locations.agro_climatic_zones.join(", "),
            );
            if !locations.best_regions.is_empty() {
                w.paragraph("Regional Specializations:", Style::Bold);
                for (category, regions) in locations.best_regions {
                    w.paragraph(
                        &format!(
                            "  {}: {}",
                            title_case(&category.replace('_', " ")),
                            regions.join(", ")
                        ),
                        Style::Body,
                    );
                }
            }
        }

        footer(&mut w);
        tracing::info!(crop = %analysis.crop, pages = w.page_count(), "Crop report generated");
        w.finish()
    }

    fn ai_report_at(
        &self,
        prediction: &SoilRecommendation,
        at: NaiveDateTime,
    ) -> Result<Vec<u8>, ReportError> {
        let mut w = ReportWriter::new("AI Crop Predictions")?;
        header(&mut w, at);

        w.section("AI Crop Predictions");
        w.paragraph("Soil Parameters Analyzed:", Style::Bold);
        for param in SoilParameter::DISPLAY_ORDER {
            let value = prediction.input_parameters.get(param);
            w.paragraph(
                &format!(
                    "  {}: {} {}",
                    param.display_name(),
                    format_value(value),
                    param.input_unit()
                ),
                Style::Body,
            );
        }
        w.space(3.0);

        let rows: Vec<Vec<String>> = prediction
            .recommendations
            .iter()
            .take(5)
            .enumerate()
            .map(|(i, rec)| {
                vec![
                    (i + 1).to_string(),
                    rec.crop.clone(),
                    rec.confidence.clone(),
                    rec.suitability().as_str().to_string(),
                ]
            })
            .collect();
        w.table(
            &[20.0, 60.0, 35.0, CONTENT_WIDTH - 115.0],
            &["Rank", "Crop", "Confidence", "Suitability"],
            &rows,
        );

        if let Some(best) = prediction.recommendations.first() {
            if let Some(details) = &best.details {
                w.section(&format!("Detailed Analysis: {}", best.crop));
                w.labeled("Growing Season:", details.growing_season);
                w.labeled("Growth Duration:", details.growth_duration);
                soil_requirements(&mut w, &details.soil_requirements);
            }
        }

        footer(&mut w);
        tracing::info!(
            best_crop = %prediction.best_crop,
            pages = w.page_count(),
            "AI prediction report generated"
        );
        w.finish()
    }
}

fn header(w: &mut ReportWriter, at: NaiveDateTime) {
    w.paragraph(REPORT_TITLE, Style::Title);
    w.space(2.0);
    w.paragraph(REPORT_SUBTITLE, Style::Subtitle);
    w.space(4.0);
    w.paragraph(
        &format!("Report Generated: {}", at.format("%B %d, %Y at %I:%M %p")),
        Style::Body,
    );
    w.paragraph("System: AI-Powered Agricultural Analysis", Style::Body);
    w.space(6.0);
}

fn soil_requirements(w: &mut ReportWriter, soil: &SoilRequirements) {
    w.section("Optimal Soil Requirements");
    let rows: Vec<Vec<String>> = soil
        .iter()
        .map(|(param, range)| {
            vec![
                param.display_name().to_string(),
                format!("{} - {}", format_value(range.min()), format_value(range.max())),
                range.unit.to_string(),
                range.description.to_string(),
            ]
        })
        .collect();
    w.table(
        &[32.0, 28.0, 22.0, CONTENT_WIDTH - 82.0],
        &["Parameter", "Optimal Range", "Unit", "Description"],
        &rows,
    );
}

fn footer(w: &mut ReportWriter) {
    w.space(8.0);
    w.paragraph("Disclaimer:", Style::Bold);
    w.paragraph(DISCLAIMER, Style::Small);
    w.space(3.0);
    w.paragraph(GENERATED_BY, Style::Small);
}

/// `6.5` stays `6.5`, `40.0` prints as `40`.
fn format_value(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::analysis::analyze_crop;
    use crate::crop::recommend::{MockSoilClassifier, SoilParameters, SoilRecommender};
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 5)
            .unwrap()
    }

    fn prediction() -> SoilRecommendation {
        let recommender = SoilRecommender::new(Box::new(MockSoilClassifier::new(
            &["rice", "maize", "jute"],
            vec![0.75, 0.15, 0.10],
        )));
        let params = SoilParameters {
            n: 90.0,
            p: 42.0,
            k: 43.0,
            temperature: 21.5,
            humidity: 82.0,
            ph: 6.5,
            rainfall: 203.0,
        };
        recommender.recommend(&params).unwrap()
    }

    #[test]
    fn crop_report_is_pdf() {
        let analysis = analyze_crop("rice").unwrap();
        let bytes = CropReportGenerator::new().generate_crop_report(&analysis).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn crop_report_without_locations() {
        let analysis = analyze_crop("jute").unwrap();
        let bytes = CropReportGenerator::new().crop_report_at(&analysis, at()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn ai_report_is_pdf() {
        let bytes = CropReportGenerator::new()
            .generate_ai_prediction_report(&prediction())
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn filenames_use_timestamp() {
        assert_eq!(
            crop_report_filename("rice", at()),
            "Crop_Analysis_Rice_20240601_093005.pdf"
        );
        assert_eq!(ai_report_filename(at()), "AI_Crop_Predictions_20240601_093005.pdf");
    }

    #[test]
    fn values_print_without_trailing_zero() {
        assert_eq!(format_value(40.0), "40");
        assert_eq!(format_value(6.5), "6.5");
    }
}
