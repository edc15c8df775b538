//! Test-time augmentation: average the classifier's output over a plain
//! pass and K−1 randomly perturbed copies of the same image.
//!
//! Confidences vary slightly between calls unless the random source is
//! seeded. Tests pin it with `StdRng::seed_from_u64`.

use ndarray::s;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::debug;

use super::model::ImageClassifier;
use super::types::ImageTensor;
use super::DiseaseError;

const BRIGHTNESS_MIN: f32 = 0.9;
const BRIGHTNESS_MAX: f32 = 1.1;
const FLIP_PROBABILITY: f64 = 0.5;
const NOISE_STD_DEV: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtaEnsembler {
    passes: usize,
}

impl TtaEnsembler {
    /// `passes` below 1 is raised to 1.
    pub fn new(passes: usize) -> Self {
        Self {
            passes: passes.max(1),
        }
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Run all passes and return the element-wise mean.
    pub fn run<R: Rng + ?Sized>(
        &self,
        model: &dyn ImageClassifier,
        image: &ImageTensor,
        rng: &mut R,
    ) -> Result<Vec<f32>, DiseaseError> {
        let mut sum = model.predict(image)?;

        for pass in 1..self.passes {
            let augmented = augment(image, rng);
            let probs = model.predict(&augmented)?;
            if probs.len() != sum.len() {
                return Err(DiseaseError::Inference(format!(
                    "augmented pass {pass} returned {} scores, expected {}",
                    probs.len(),
                    sum.len()
                )));
            }
            for (acc, p) in sum.iter_mut().zip(&probs) {
                *acc += p;
            }
        }

        let n = self.passes as f32;
        for acc in &mut sum {
            *acc /= n;
        }

        debug!(passes = self.passes, "TTA ensemble complete");
        Ok(sum)
    }
}

impl Default for TtaEnsembler {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TTA_PASSES)
    }
}

/// One perturbed copy: brightness jitter, coin-flip mirror, Gaussian noise.
pub fn augment<R: Rng + ?Sized>(image: &ImageTensor, rng: &mut R) -> ImageTensor {
    let brightness: f32 = rng.gen_range(BRIGHTNESS_MIN..=BRIGHTNESS_MAX);
    let mut out = image.mapv(|v| (v * brightness).clamp(0.0, 1.0));

    if rng.gen_bool(FLIP_PROBABILITY) {
        out = out.slice(s![.., ..;-1, ..]).to_owned();
    }

    for v in out.iter_mut() {
        let noise: f32 = StandardNormal.sample(rng);
        *v = (*v + NOISE_STD_DEV * noise).clamp(0.0, 1.0);
    }
    out
}
