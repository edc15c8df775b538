use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::types::{ImageTensor, InputSize};
use super::{DiseaseError, ModelLoadError};

/// A loaded image classifier. One call = one image in, one probability
/// vector out.
pub trait ImageClassifier: Send + Sync {
    /// Declared spatial input size, `None` when the graph leaves it dynamic.
    fn input_size(&self) -> Option<InputSize>;

    /// Declared output width, `None` when dynamic.
    fn num_outputs(&self) -> Option<usize>;

    /// Run inference on an H×W×3 tensor in `[0, 1]`.
    fn predict(&self, image: &ImageTensor) -> Result<Vec<f32>, DiseaseError>;
}

/// Turns a model file into a classifier.
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Box<dyn ImageClassifier>, ModelLoadError>;
}

// ═══════════════════════════════════════════════════════════
// ONNX classifier — behind `onnx` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx")]
mod onnx {
    use super::{DiseaseError, ImageClassifier, ImageTensor, InputSize, ModelLoadError, ModelLoader};
    use ndarray::Axis;
    use ort::session::Session;
    use ort::value::ValueType;
    use std::path::Path;
    use std::sync::Mutex;

    /// Channel placement of the graph's image input.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Layout {
        /// `[N, H, W, C]`, the Keras export default.
        Nhwc,
        /// `[N, C, H, W]`, PyTorch-style exports.
        Nchw,
    }

    /// Image classifier backed by ONNX Runtime.
    ///
    /// Uses interior mutability (Mutex) because ort::Session::run requires `&mut self`
    /// but the ImageClassifier trait exposes `&self` for shared usage.
    pub struct OnnxClassifier {
        session: Mutex<Session>,
        layout: Layout,
        input_size: Option<InputSize>,
        num_outputs: Option<usize>,
    }

    impl OnnxClassifier {
        pub fn load(path: &Path, intra_threads: usize) -> Result<Self, ModelLoadError> {
            let session = Session::builder()
                .map_err(|e: ort::Error| ModelLoadError::Backend(e.to_string()))?
                .with_intra_threads(intra_threads)
                .map_err(|e: ort::Error| ModelLoadError::Backend(e.to_string()))?
                .commit_from_file(path)
                .map_err(|e: ort::Error| ModelLoadError::Backend(format!("ONNX load failed: {e}")))?;

            let input_dims = session
                .inputs
                .first()
                .and_then(|input| tensor_dims(&input.input_type))
                .ok_or_else(|| ModelLoadError::Backend("model has no tensor input".into()))?;
            if input_dims.len() != 4 {
                return Err(ModelLoadError::Backend(format!(
                    "expected a rank-4 image input, got {input_dims:?}"
                )));
            }

            let (layout, height, width) = if input_dims[3] == 3 {
                (Layout::Nhwc, input_dims[1], input_dims[2])
            } else if input_dims[1] == 3 {
                (Layout::Nchw, input_dims[2], input_dims[3])
            } else {
                return Err(ModelLoadError::Backend(format!(
                    "cannot find a 3-channel axis in input shape {input_dims:?}"
                )));
            };
            let input_size = (height > 0 && width > 0).then(|| InputSize {
                width: width as u32,
                height: height as u32,
            });

            let num_outputs = session
                .outputs
                .first()
                .and_then(|output| tensor_dims(&output.output_type))
                .and_then(|dims| dims.last().copied())
                .filter(|&d| d > 0)
                .map(|d| d as usize);

            tracing::info!(
                path = %path.display(),
                ?layout,
                ?input_size,
                ?num_outputs,
                "ONNX image classifier loaded"
            );

            Ok(Self {
                session: Mutex::new(session),
                layout,
                input_size,
                num_outputs,
            })
        }
    }

    fn tensor_dims(value_type: &ValueType) -> Option<Vec<i64>> {
        value_type
            .tensor_shape()
            .map(|shape| shape.iter().copied().collect())
    }

    impl ImageClassifier for OnnxClassifier {
        fn input_size(&self) -> Option<InputSize> {
            self.input_size
        }

        fn num_outputs(&self) -> Option<usize> {
            self.num_outputs
        }

        fn predict(&self, image: &ImageTensor) -> Result<Vec<f32>, DiseaseError> {
            use ort::value::TensorRef;

            let batch = image.view().insert_axis(Axis(0));
            let batch = match self.layout {
                Layout::Nhwc => batch.as_standard_layout().into_owned(),
                Layout::Nchw => batch
                    .permuted_axes([0, 3, 1, 2])
                    .as_standard_layout()
                    .into_owned(),
            };

            let tensor = TensorRef::from_array_view(&batch)
                .map_err(|e| DiseaseError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| DiseaseError::Inference("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| DiseaseError::Inference(format!("ONNX inference failed: {e}")))?;

            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| DiseaseError::Inference(format!("Output extraction: {e}")))?;

            // Output shape: [1, num_classes]
            if shape.len() != 2 || shape[0] != 1 {
                return Err(DiseaseError::Inference(format!(
                    "Unexpected output shape: {shape:?}, expected [1, num_classes]"
                )));
            }

            Ok(data.to_vec())
        }
    }

    /// Loads `.onnx` files into [`OnnxClassifier`]s.
    pub struct OnnxModelLoader {
        pub intra_threads: usize,
    }

    impl Default for OnnxModelLoader {
        fn default() -> Self {
            Self { intra_threads: 2 }
        }
    }

    impl ModelLoader for OnnxModelLoader {
        fn load(&self, path: &Path) -> Result<Box<dyn ImageClassifier>, ModelLoadError> {
            Ok(Box::new(OnnxClassifier::load(path, self.intra_threads)?))
        }
    }
}

#[cfg(feature = "onnx")]
pub use onnx::{OnnxClassifier, OnnxModelLoader};

/// Loader used when no inference backend is compiled in.
pub struct UnavailableLoader;

impl ModelLoader for UnavailableLoader {
    fn load(&self, _path: &Path) -> Result<Box<dyn ImageClassifier>, ModelLoadError> {
        Err(ModelLoadError::BackendUnavailable)
    }
}

/// The production loader for this build.
pub fn default_loader() -> Box<dyn ModelLoader> {
    #[cfg(feature = "onnx")]
    {
        Box::new(OnnxModelLoader::default())
    }
    #[cfg(not(feature = "onnx"))]
    {
        Box::new(UnavailableLoader)
    }
}

// ═══════════════════════════════════════════════════════════
// Mock backend
// ═══════════════════════════════════════════════════════════

/// How a [`MockClassifier`] answers.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Same vector for every input.
    Fixed(Vec<f32>),
    /// `classes` scores; the first is the input's mean intensity, the rest
    /// share the remainder. Makes augmentation visible in the output.
    MeanIntensity { classes: usize },
    /// Every call fails with an inference error.
    Fail,
}

/// Deterministic classifier for tests and for running without weights.
pub struct MockClassifier {
    response: MockResponse,
    input_size: Option<InputSize>,
    declared_outputs: Option<usize>,
    calls: AtomicUsize,
}

impl MockClassifier {
    pub fn new(response: MockResponse, input_size: Option<InputSize>) -> Self {
        let declared_outputs = match &response {
            MockResponse::Fixed(probs) => Some(probs.len()),
            MockResponse::MeanIntensity { classes } => Some(*classes),
            MockResponse::Fail => None,
        };
        Self {
            response,
            input_size,
            declared_outputs,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fixed(probabilities: Vec<f32>, input_size: InputSize) -> Self {
        Self::new(MockResponse::Fixed(probabilities), Some(input_size))
    }

    /// Override the declared output width (`None` = dynamic).
    pub fn with_declared_outputs(mut self, outputs: Option<usize>) -> Self {
        self.declared_outputs = outputs;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageClassifier for MockClassifier {
    fn input_size(&self) -> Option<InputSize> {
        self.input_size
    }

    fn num_outputs(&self) -> Option<usize> {
        self.declared_outputs
    }

    fn predict(&self, image: &ImageTensor) -> Result<Vec<f32>, DiseaseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            MockResponse::Fixed(probs) => Ok(probs.clone()),
            MockResponse::MeanIntensity { classes } => {
                let mean = image.mean().unwrap_or(0.0);
                let rest = if *classes > 1 {
                    (1.0 - mean) / (*classes - 1) as f32
                } else {
                    0.0
                };
                let mut probs = vec![rest; *classes];
                if let Some(first) = probs.first_mut() {
                    *first = mean;
                }
                Ok(probs)
            }
            MockResponse::Fail => Err(DiseaseError::Inference("mock failure".into())),
        }
    }
}

/// Hands out [`MockClassifier`]s. Empty model files are treated as corrupt.
pub struct MockModelLoader {
    response: MockResponse,
    input_size: Option<InputSize>,
    declared_outputs: Option<Option<usize>>,
    loaded: Mutex<Vec<PathBuf>>,
}

impl MockModelLoader {
    pub fn new(response: MockResponse, input_size: Option<InputSize>) -> Self {
        Self {
            response,
            input_size,
            declared_outputs: None,
            loaded: Mutex::new(Vec::new()),
        }
    }

    pub fn with_declared_outputs(mut self, outputs: Option<usize>) -> Self {
        self.declared_outputs = Some(outputs);
        self
    }

    /// Paths passed to `load`, in order.
    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.loaded.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl ModelLoader for MockModelLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn ImageClassifier>, ModelLoadError> {
        if let Ok(mut loaded) = self.loaded.lock() {
            loaded.push(path.to_path_buf());
        }
        let len = std::fs::metadata(path)
            .map_err(|e| ModelLoadError::Backend(format!("{}: {e}", path.display())))?
            .len();
        if len == 0 {
            return Err(ModelLoadError::Backend(format!(
                "{} is not a valid model file",
                path.display()
            )));
        }

        let mut classifier = MockClassifier::new(self.response.clone(), self.input_size);
        if let Some(outputs) = self.declared_outputs {
            classifier = classifier.with_declared_outputs(outputs);
        }
        Ok(Box::new(classifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disease::types::ADVANCED_INPUT;
    use ndarray::Array3;

    #[test]
    fn fixed_mock_returns_vector_and_counts_calls() {
        let mock = MockClassifier::fixed(vec![0.2, 0.8], ADVANCED_INPUT);
        let image = Array3::<f32>::zeros((300, 300, 3));
        assert_eq!(mock.predict(&image).unwrap(), vec![0.2, 0.8]);
        assert_eq!(mock.predict(&image).unwrap(), vec![0.2, 0.8]);
        assert_eq!(mock.calls(), 2);
        assert_eq!(mock.num_outputs(), Some(2));
    }

    #[test]
    fn mean_intensity_mock_tracks_input() {
        let mock = MockClassifier::new(MockResponse::MeanIntensity { classes: 3 }, None);
        let image = Array3::<f32>::from_elem((4, 4, 3), 0.4);
        let probs = mock.predict(&image).unwrap();
        assert!((probs[0] - 0.4).abs() < 1e-6);
        assert!((probs[1] - 0.3).abs() < 1e-6);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn failing_mock_reports_inference_error() {
        let mock = MockClassifier::new(MockResponse::Fail, Some(ADVANCED_INPUT));
        let image = Array3::<f32>::zeros((2, 2, 3));
        assert!(matches!(mock.predict(&image), Err(DiseaseError::Inference(_))));
    }

    #[test]
    fn mock_loader_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"").unwrap();

        let loader = MockModelLoader::new(MockResponse::Fixed(vec![1.0]), Some(ADVANCED_INPUT));
        assert!(matches!(loader.load(&path), Err(ModelLoadError::Backend(_))));
        assert_eq!(loader.loaded_paths(), vec![path]);
    }

    #[test]
    fn unavailable_loader_reports_missing_backend() {
        let err = UnavailableLoader.load(Path::new("model.onnx")).err().unwrap();
        assert!(matches!(err, ModelLoadError::BackendUnavailable));
    }
}
