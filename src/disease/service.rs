//! Prediction service: owns the loaded classifier and class list and runs
//! preprocess → (TTA) → inference → formatting for each request.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};

use super::augment::TtaEnsembler;
use super::formatter::{format_results, FormatOptions};
use super::model::{ImageClassifier, ModelLoader};
use super::preprocess::ImagePreprocessor;
use super::types::{
    BatchItem, BatchRecord, ImageInput, InputSize, ModelInfo, ModelVariant, PredictOptions,
    PredictionResult, BASIC_INPUT,
};
use super::{DiseaseError, ModelLoadError};
use crate::config::AppConfig;

// ═══════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub fallback_model_path: PathBuf,
    pub class_names_path: PathBuf,
    pub fallback_class_names_path: PathBuf,
    pub tta_passes: usize,
    pub tta_seed: Option<u64>,
}

impl From<&AppConfig> for ServiceConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            model_path: config.model_path.clone(),
            fallback_model_path: config.fallback_model_path.clone(),
            class_names_path: config.class_names_path.clone(),
            fallback_class_names_path: config.fallback_class_names_path.clone(),
            tta_passes: config.tta_passes,
            tta_seed: config.tta_seed,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// PredictionService
// ═══════════════════════════════════════════════════════════

pub struct PredictionService {
    model: Box<dyn ImageClassifier>,
    classes: Vec<String>,
    variant: ModelVariant,
    preprocessor: ImagePreprocessor,
    ensembler: TtaEnsembler,
    model_path: PathBuf,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionService")
            .field("variant", &self.variant)
            .field("input_size", &self.preprocessor.target())
            .field("classes", &self.classes.len())
            .field("model_path", &self.model_path)
            .finish()
    }
}

impl PredictionService {
    /// Resolve, decompress if needed, and load model + class list.
    pub fn load(config: &ServiceConfig, loader: &dyn ModelLoader) -> Result<Self, DiseaseError> {
        let model_path = resolve_model_path(&config.model_path, &config.fallback_model_path)?;
        let classes = load_class_names(&config.class_names_path, &config.fallback_class_names_path)?;
        let model = loader.load(&model_path)?;

        Self::from_parts(model, classes, model_path, config.tta_passes, config.tta_seed)
    }

    /// Assemble a service from an already-loaded classifier.
    pub fn from_parts(
        model: Box<dyn ImageClassifier>,
        classes: Vec<String>,
        model_path: PathBuf,
        tta_passes: usize,
        tta_seed: Option<u64>,
    ) -> Result<Self, DiseaseError> {
        if let Some(outputs) = model.num_outputs() {
            if outputs != classes.len() {
                return Err(DiseaseError::ShapeMismatch {
                    classes: classes.len(),
                    outputs,
                });
            }
        }

        let (variant, input_size) = match model.input_size() {
            Some(size) => (ModelVariant::from_input_size(size), size),
            None => (ModelVariant::Basic, BASIC_INPUT),
        };

        let rng = match tta_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            path = %model_path.display(),
            model_type = variant.as_str(),
            input_size = %input_size,
            classes = classes.len(),
            "Plant disease model ready"
        );

        Ok(Self {
            model,
            classes,
            variant,
            preprocessor: ImagePreprocessor::new(input_size),
            ensembler: TtaEnsembler::new(tta_passes),
            model_path,
            rng: Mutex::new(rng),
        })
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn input_size(&self) -> InputSize {
        self.preprocessor.target()
    }

    pub fn class_names(&self) -> &[String] {
        &self.classes
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model_type: self.variant,
            model_path: self.model_path.display().to_string(),
            input_size: self.input_size().to_string(),
            num_classes: self.classes.len(),
            supports_tta: self.variant.supports_tta(),
        }
    }

    /// Classify one image. A TTA request on a basic model runs a single
    /// pass and reports `used_tta: false`.
    pub fn predict(
        &self,
        input: &ImageInput,
        options: &PredictOptions,
    ) -> Result<PredictionResult, DiseaseError> {
        let prepared = self
            .preprocessor
            .prepare(input, options.enhance, options.with_preview)?;

        let use_tta = options.use_tta && self.variant.supports_tta();
        let probabilities = if use_tta {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| DiseaseError::Inference("TTA rng lock poisoned".to_string()))?;
            self.ensembler
                .run(self.model.as_ref(), &prepared.tensor, &mut *rng)?
        } else {
            self.model.predict(&prepared.tensor)?
        };

        let mut result = format_results(
            &probabilities,
            &self.classes,
            &FormatOptions {
                top_n: options.top_n,
                model_type: self.variant,
                used_tta: use_tta,
                enhanced_image: prepared.enhanced,
                timestamp: chrono::Local::now().naive_local(),
            },
        )?;
        result.original_image = prepared.preview;
        result.image_info = prepared.info;

        info!(
            top = %result.top_prediction,
            confidence = result.confidence,
            used_tta = use_tta,
            "Prediction complete"
        );
        Ok(result)
    }

    /// Classify each item in order. Failures become inline error records.
    pub fn predict_batch(&self, items: &[BatchItem], options: &PredictOptions) -> Vec<BatchRecord> {
        items
            .iter()
            .map(|item| match self.predict(&item.input, options) {
                Ok(mut result) => {
                    if let Some(info) = result.image_info.as_mut() {
                        info.filename = Some(item.filename.clone());
                    }
                    BatchRecord::Prediction(Box::new(result))
                }
                Err(e) => {
                    warn!(filename = %item.filename, error = %e, "Batch item failed");
                    BatchRecord::Failed {
                        error: format!("Failed to process {}: {e}", item.filename),
                        filename: item.filename.clone(),
                    }
                }
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════
// Artifact resolution
// ═══════════════════════════════════════════════════════════

/// Primary, then fallback. A missing path with a `<path>.gz` sibling is
/// decompressed in place first.
pub fn resolve_model_path(primary: &Path, fallback: &Path) -> Result<PathBuf, ModelLoadError> {
    for candidate in [primary, fallback] {
        if candidate.exists() {
            return Ok(candidate.to_path_buf());
        }
        let gz = gz_sibling(candidate);
        if gz.exists() {
            decompress(&gz, candidate)?;
            return Ok(candidate.to_path_buf());
        }
    }
    Err(ModelLoadError::NotFound {
        primary: primary.to_path_buf(),
        fallback: fallback.to_path_buf(),
    })
}

fn gz_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

fn decompress(gz: &Path, target: &Path) -> Result<(), ModelLoadError> {
    let to_err = |e: io::Error| ModelLoadError::Decompress {
        path: gz.to_path_buf(),
        reason: e.to_string(),
    };

    info!(source = %gz.display(), target = %target.display(), "Decompressing model file");

    let mut partial = target.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    let result = (|| -> io::Result<()> {
        let input = File::open(gz)?;
        let mut decoder = flate2::read::GzDecoder::new(BufReader::new(input));
        let mut output = File::create(&partial)?;
        io::copy(&mut decoder, &mut output)?;
        output.sync_all()?;
        std::fs::rename(&partial, target)
    })();

    if let Err(e) = result {
        let _ = std::fs::remove_file(&partial);
        return Err(to_err(e));
    }
    Ok(())
}

/// Newline-delimited labels: lines trimmed, blank lines skipped.
pub fn load_class_names(primary: &Path, fallback: &Path) -> Result<Vec<String>, ModelLoadError> {
    let path = if primary.exists() { primary } else { fallback };
    let text = std::fs::read_to_string(path).map_err(|e| ModelLoadError::ClassList {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let classes: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    if classes.is_empty() {
        return Err(ModelLoadError::EmptyClassList(path.to_path_buf()));
    }
    info!(path = %path.display(), count = classes.len(), "Class names loaded");
    Ok(classes)
}

// ═══════════════════════════════════════════════════════════
// Load state
// ═══════════════════════════════════════════════════════════

/// Externally visible lifecycle of the predictor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum LoadState {
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

enum Slot {
    Uninitialized,
    Loading,
    Ready(Arc<PredictionService>),
    Failed(String),
}

/// Holds the predictor through `Uninitialized → Loading → Ready | Failed`.
/// Loading is attempted once per call to [`PredictorSlot::load`]; nothing
/// retries on its own.
pub struct PredictorSlot {
    slot: RwLock<Slot>,
}

impl Default for PredictorSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorSlot {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(Slot::Uninitialized),
        }
    }

    /// A slot that is already `Ready`.
    pub fn ready(service: PredictionService) -> Self {
        Self {
            slot: RwLock::new(Slot::Ready(Arc::new(service))),
        }
    }

    pub fn load(
        &self,
        config: &ServiceConfig,
        loader: &dyn ModelLoader,
    ) -> Result<Arc<PredictionService>, DiseaseError> {
        self.set(Slot::Loading)?;

        match PredictionService::load(config, loader) {
            Ok(service) => {
                let service = Arc::new(service);
                self.set(Slot::Ready(Arc::clone(&service)))?;
                Ok(service)
            }
            Err(e) => {
                warn!(error = %e, "Plant disease predictor failed to load");
                self.set(Slot::Failed(e.to_string()))?;
                Err(e)
            }
        }
    }

    pub fn state(&self) -> LoadState {
        match self.slot.read() {
            Ok(slot) => match &*slot {
                Slot::Uninitialized => LoadState::Uninitialized,
                Slot::Loading => LoadState::Loading,
                Slot::Ready(_) => LoadState::Ready,
                Slot::Failed(reason) => LoadState::Failed(reason.clone()),
            },
            Err(_) => LoadState::Failed("predictor lock poisoned".into()),
        }
    }

    /// The ready service, or `NotReady` with the current state.
    pub fn get(&self) -> Result<Arc<PredictionService>, DiseaseError> {
        let slot = self
            .slot
            .read()
            .map_err(|_| DiseaseError::NotReady("predictor lock poisoned".into()))?;
        match &*slot {
            Slot::Ready(service) => Ok(Arc::clone(service)),
            Slot::Uninitialized => Err(DiseaseError::NotReady("model not loaded".into())),
            Slot::Loading => Err(DiseaseError::NotReady("model is loading".into())),
            Slot::Failed(reason) => Err(DiseaseError::NotReady(reason.clone())),
        }
    }

    fn set(&self, next: Slot) -> Result<(), DiseaseError> {
        let mut slot = self
            .slot
            .write()
            .map_err(|_| DiseaseError::NotReady("predictor lock poisoned".into()))?;
        *slot = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disease::model::{MockClassifier, MockModelLoader, MockResponse, UnavailableLoader};
    use crate::disease::types::ADVANCED_INPUT;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::{Cursor, Write};

    const CLASSES: &str = "Apple___Apple_scab\nApple___healthy\n\nTomato___Late_blight\n";

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(w, h, |x, y| Rgb([(x * 9) as u8, (y * 5) as u8, 90]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn config_in(dir: &Path) -> ServiceConfig {
        ServiceConfig {
            model_path: dir.join("advanced.onnx"),
            fallback_model_path: dir.join("basic.onnx"),
            class_names_path: dir.join("classes_advanced.txt"),
            fallback_class_names_path: dir.join("classes.txt"),
            tta_passes: 5,
            tta_seed: Some(42),
        }
    }

    fn advanced_loader() -> MockModelLoader {
        MockModelLoader::new(
            MockResponse::Fixed(vec![0.1, 0.2, 0.7]),
            Some(ADVANCED_INPUT),
        )
    }

    fn service_with(model: MockClassifier) -> PredictionService {
        let classes = CLASSES
            .lines()
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        PredictionService::from_parts(Box::new(model), classes, PathBuf::from("m.onnx"), 5, Some(7))
            .unwrap()
    }

    #[test]
    fn loads_primary_model_and_classes() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.model_path, b"weights").unwrap();
        std::fs::write(&config.class_names_path, CLASSES).unwrap();

        let loader = advanced_loader();
        let service = PredictionService::load(&config, &loader).unwrap();

        assert_eq!(service.variant(), ModelVariant::Advanced);
        assert_eq!(service.class_names().len(), 3);
        assert_eq!(loader.loaded_paths(), vec![config.model_path.clone()]);

        let info = service.model_info();
        assert_eq!(info.input_size, "300x300");
        assert_eq!(info.num_classes, 3);
        assert!(info.supports_tta);
        assert!(info.model_path.ends_with("advanced.onnx"));
    }

    #[test]
    fn falls_back_when_primary_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.fallback_model_path, b"weights").unwrap();
        std::fs::write(&config.fallback_class_names_path, CLASSES).unwrap();

        let loader = MockModelLoader::new(
            MockResponse::Fixed(vec![0.3, 0.3, 0.4]),
            Some(BASIC_INPUT),
        );
        let service = PredictionService::load(&config, &loader).unwrap();

        assert_eq!(service.variant(), ModelVariant::Basic);
        assert_eq!(loader.loaded_paths(), vec![config.fallback_model_path.clone()]);
        assert!(!service.model_info().supports_tta);
    }

    #[test]
    fn both_paths_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.class_names_path, CLASSES).unwrap();

        let err = PredictionService::load(&config, &advanced_loader()).unwrap_err();
        assert!(matches!(
            err,
            DiseaseError::ModelLoad(ModelLoadError::NotFound { .. })
        ));
    }

    #[test]
    fn gz_sibling_is_decompressed() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.class_names_path, CLASSES).unwrap();

        let gz_path = gz_sibling(&config.model_path);
        let mut encoder = flate2::write::GzEncoder::new(
            File::create(&gz_path).unwrap(),
            flate2::Compression::default(),
        );
        encoder.write_all(b"compressed weights").unwrap();
        encoder.finish().unwrap();

        PredictionService::load(&config, &advanced_loader()).unwrap();
        assert_eq!(std::fs::read(&config.model_path).unwrap(), b"compressed weights");
    }

    #[test]
    fn corrupt_gz_reports_decompress_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(gz_sibling(&config.model_path), b"not gzip").unwrap();

        let err = resolve_model_path(&config.model_path, &config.fallback_model_path).unwrap_err();
        assert!(matches!(err, ModelLoadError::Decompress { .. }));
        assert!(!config.model_path.exists());
    }

    #[test]
    fn class_count_mismatch_is_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.model_path, b"weights").unwrap();
        std::fs::write(&config.class_names_path, "A___x\nB___y\n").unwrap();

        let err = PredictionService::load(&config, &advanced_loader()).unwrap_err();
        assert!(matches!(
            err,
            DiseaseError::ShapeMismatch { classes: 2, outputs: 3 }
        ));
    }

    #[test]
    fn dynamic_output_width_is_checked_per_inference() {
        let model = MockClassifier::fixed(vec![0.5, 0.5], ADVANCED_INPUT).with_declared_outputs(None);
        let service = service_with(model);
        let err = service
            .predict(&ImageInput::Bytes(png(20, 20)), &PredictOptions::default())
            .unwrap_err();
        assert!(matches!(err, DiseaseError::ShapeMismatch { classes: 3, outputs: 2 }));
    }

    #[test]
    fn empty_class_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.model_path, b"weights").unwrap();
        std::fs::write(&config.class_names_path, "\n  \n").unwrap();

        let err = PredictionService::load(&config, &advanced_loader()).unwrap_err();
        assert!(matches!(
            err,
            DiseaseError::ModelLoad(ModelLoadError::EmptyClassList(_))
        ));
    }

    #[test]
    fn missing_class_lists_report_class_list_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.model_path, b"weights").unwrap();

        let err = PredictionService::load(&config, &advanced_loader()).unwrap_err();
        assert!(matches!(
            err,
            DiseaseError::ModelLoad(ModelLoadError::ClassList { .. })
        ));
    }

    #[test]
    fn corrupt_model_reports_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.model_path, b"").unwrap();
        std::fs::write(&config.class_names_path, CLASSES).unwrap();

        let err = PredictionService::load(&config, &advanced_loader()).unwrap_err();
        assert!(matches!(err, DiseaseError::ModelLoad(ModelLoadError::Backend(_))));
    }

    #[test]
    fn missing_backend_surfaces_after_path_checks() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.model_path, b"weights").unwrap();
        std::fs::write(&config.class_names_path, CLASSES).unwrap();

        let err = PredictionService::load(&config, &UnavailableLoader).unwrap_err();
        assert!(matches!(
            err,
            DiseaseError::ModelLoad(ModelLoadError::BackendUnavailable)
        ));
    }

    #[test]
    fn advanced_model_runs_tta_passes() {
        let service = service_with(MockClassifier::fixed(vec![0.1, 0.2, 0.7], ADVANCED_INPUT));
        let result = service
            .predict(&ImageInput::Bytes(png(40, 30)), &PredictOptions::default())
            .unwrap();

        assert!(result.used_tta);
        assert!(result.enhanced_image);
        assert_eq!(result.top_prediction, "Tomato___Late_blight");
        assert_eq!(result.disease_info.severity, "Critical");
        assert_eq!(result.all_predictions.len(), 3);
        assert_eq!(result.image_info.as_ref().unwrap().size, [40, 30]);
    }

    #[test]
    fn basic_model_ignores_tta_request() {
        let model = MockClassifier::fixed(vec![0.6, 0.3, 0.1], BASIC_INPUT);
        let service = service_with(model);
        let result = service
            .predict(
                &ImageInput::Bytes(png(16, 16)),
                &PredictOptions {
                    use_tta: true,
                    ..PredictOptions::default()
                },
            )
            .unwrap();

        assert!(!result.used_tta);
        assert_eq!(result.model_type, ModelVariant::Basic);
        assert_eq!(result.confidence_level, crate::disease::ConfidenceLevel::Medium);
    }

    #[test]
    fn seeded_services_agree() {
        let run = || {
            let model = MockClassifier::new(MockResponse::MeanIntensity { classes: 3 }, Some(ADVANCED_INPUT));
            let service = service_with(model);
            service
                .predict(&ImageInput::Bytes(png(32, 32)), &PredictOptions::default())
                .unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.all_predictions, b.all_predictions);
    }

    #[test]
    fn preview_attached_when_requested() {
        let service = service_with(MockClassifier::fixed(vec![0.1, 0.2, 0.7], ADVANCED_INPUT));
        let result = service
            .predict(
                &ImageInput::Bytes(png(10, 10)),
                &PredictOptions {
                    with_preview: true,
                    use_tta: false,
                    ..PredictOptions::default()
                },
            )
            .unwrap();
        assert!(result
            .original_image
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn batch_isolates_corrupt_item() {
        let service = service_with(MockClassifier::fixed(vec![0.1, 0.2, 0.7], ADVANCED_INPUT));
        let items = vec![
            BatchItem {
                filename: "one.png".into(),
                input: ImageInput::Bytes(png(12, 12)),
            },
            BatchItem {
                filename: "two.png".into(),
                input: ImageInput::Bytes(b"corrupt".to_vec()),
            },
            BatchItem {
                filename: "three.png".into(),
                input: ImageInput::Bytes(png(14, 14)),
            },
        ];
        let options = PredictOptions {
            top_n: 3,
            use_tta: false,
            ..PredictOptions::default()
        };

        let records = service.predict_batch(&items, &options);
        assert_eq!(records.len(), 3);
        assert!(!records[0].is_error());
        assert!(records[1].is_error());
        assert!(!records[2].is_error());

        match &records[1] {
            BatchRecord::Failed { error, filename } => {
                assert_eq!(filename, "two.png");
                assert!(error.starts_with("Failed to process two.png:"));
            }
            BatchRecord::Prediction(_) => panic!("expected an error record"),
        }
        match &records[2] {
            BatchRecord::Prediction(result) => {
                let info = result.image_info.as_ref().unwrap();
                assert_eq!(info.filename.as_deref(), Some("three.png"));
            }
            BatchRecord::Failed { .. } => panic!("expected a prediction"),
        }
    }

    #[test]
    fn slot_walks_through_states() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let slot = PredictorSlot::new();
        assert_eq!(slot.state(), LoadState::Uninitialized);
        assert!(matches!(slot.get(), Err(DiseaseError::NotReady(_))));

        assert!(slot.load(&config, &advanced_loader()).is_err());
        assert!(matches!(slot.state(), LoadState::Failed(_)));
        assert!(matches!(slot.get(), Err(DiseaseError::NotReady(_))));

        std::fs::write(&config.model_path, b"weights").unwrap();
        std::fs::write(&config.class_names_path, CLASSES).unwrap();
        slot.load(&config, &advanced_loader()).unwrap();
        assert_eq!(slot.state(), LoadState::Ready);
        assert_eq!(slot.get().unwrap().class_names().len(), 3);
    }

    #[test]
    fn load_state_serializes_with_reason() {
        let json = serde_json::to_value(LoadState::Failed("boom".into())).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"], "boom");
        let json = serde_json::to_value(LoadState::Ready).unwrap();
        assert_eq!(json["state"], "ready");
    }
}
