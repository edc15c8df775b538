//! Image preprocessing for classifier input.
//!
//! Pipeline flow for encoded uploads:
//! 1. Validate bytes (non-empty)
//! 2. Decode, record format / color mode / size
//! 3. Convert to RGB
//! 4. Optional preview (JPEG q95, base64 data URL) of the unenhanced image
//! 5. Optional enhancement: contrast ×1.10, then sharpness ×1.05
//! 6. Lanczos3 resize to the model's W×H
//! 7. Scale bytes to `[0, 1]` floats
//!
//! Pixel arrays skip decoding: they are rescaled from `[0, 255]` if needed
//! and resized only when their spatial size differs from the model's.

use std::io::Cursor;

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, ImageBuffer, Rgb, RgbImage};
use ndarray::Array3;
use tracing::debug;

use super::types::{ImageInfo, ImageInput, ImageTensor, InputSize};
use super::DiseaseError;

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

pub const CONTRAST_FACTOR: f32 = 1.10;
pub const SHARPNESS_FACTOR: f32 = 1.05;
const PREVIEW_JPEG_QUALITY: u8 = 95;
const PREVIEW_PREFIX: &str = "data:image/jpeg;base64,";

/// 3×3 smoothing kernel used as the "blurred" reference for sharpening.
const SMOOTH_KERNEL: [[u32; 3]; 3] = [[1, 1, 1], [1, 5, 1], [1, 1, 1]];
const SMOOTH_DIVISOR: u32 = 13;

// ═══════════════════════════════════════════════════════════
// Result type
// ═══════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct PreparedImage {
    /// H×W×3 tensor at the model's input size, values in `[0, 1]`.
    pub tensor: ImageTensor,
    /// Present for encoded inputs only.
    pub info: Option<ImageInfo>,
    pub preview: Option<String>,
    /// Whether enhancement was actually applied.
    pub enhanced: bool,
}

// ═══════════════════════════════════════════════════════════
// ImagePreprocessor
// ═══════════════════════════════════════════════════════════

/// Turns uploads into model-ready tensors for one fixed input size.
#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    target: InputSize,
}

impl ImagePreprocessor {
    pub fn new(target: InputSize) -> Self {
        Self { target }
    }

    pub fn target(&self) -> InputSize {
        self.target
    }

    pub fn prepare(
        &self,
        input: &ImageInput,
        enhance: bool,
        with_preview: bool,
    ) -> Result<PreparedImage, DiseaseError> {
        match input {
            ImageInput::Bytes(bytes) => self.prepare_bytes(bytes, enhance, with_preview),
            ImageInput::Array(array) => self.prepare_array(array),
        }
    }

    pub fn prepare_bytes(
        &self,
        bytes: &[u8],
        enhance: bool,
        with_preview: bool,
    ) -> Result<PreparedImage, DiseaseError> {
        if bytes.is_empty() {
            return Err(DiseaseError::Decode("empty image data".into()));
        }

        let format = image::guess_format(bytes)
            .ok()
            .map(|f| format!("{f:?}").to_uppercase());
        let img = image::load_from_memory(bytes)
            .map_err(|e| DiseaseError::Decode(format!("Failed to decode image: {e}")))?;
        let (orig_w, orig_h) = img.dimensions();
        let mode = color_mode(&img);

        let rgb = img.to_rgb8();

        let preview = if with_preview {
            Some(encode_preview(&rgb)?)
        } else {
            None
        };

        let rgb = if enhance {
            let contrasted = enhance_contrast(&rgb, CONTRAST_FACTOR);
            enhance_sharpness(&contrasted, SHARPNESS_FACTOR)
        } else {
            rgb
        };

        let resized = image::imageops::resize(
            &rgb,
            self.target.width,
            self.target.height,
            FilterType::Lanczos3,
        );
        let tensor = rgb_to_tensor(&resized)?;

        debug!(
            original = format!("{orig_w}x{orig_h}"),
            output = %self.target,
            format = format.as_deref().unwrap_or("unknown"),
            mode,
            enhance,
            "Image preprocessed for classifier"
        );

        Ok(PreparedImage {
            tensor,
            info: Some(ImageInfo {
                format,
                mode: mode.to_string(),
                size: [orig_w, orig_h],
                filename: None,
            }),
            preview,
            enhanced: enhance,
        })
    }

    /// Array input: `[0, 255]` values are rescaled, off-size arrays resized.
    /// Enhancement does not apply to arrays.
    pub fn prepare_array(&self, array: &ImageTensor) -> Result<PreparedImage, DiseaseError> {
        let (h, w, c) = array.dim();
        if c != 3 {
            return Err(DiseaseError::Decode(format!(
                "expected an H×W×3 array, got {h}×{w}×{c}"
            )));
        }
        if h == 0 || w == 0 {
            return Err(DiseaseError::Decode("empty pixel array".into()));
        }

        let max = array.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let normalized = if max > 1.0 {
            array.mapv(|v| v / 255.0)
        } else {
            array.to_owned()
        };

        let tensor = if (w as u32, h as u32) != (self.target.width, self.target.height) {
            let rgb = tensor_to_rgb(&normalized)?;
            let resized = image::imageops::resize(
                &rgb,
                self.target.width,
                self.target.height,
                FilterType::Lanczos3,
            );
            rgb_to_tensor(&resized)?
        } else {
            normalized
        };

        debug!(
            original = format!("{w}x{h}"),
            output = %self.target,
            rescaled = max > 1.0,
            "Pixel array prepared for classifier"
        );

        Ok(PreparedImage {
            tensor,
            info: None,
            preview: None,
            enhanced: false,
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Enhancement
// ═══════════════════════════════════════════════════════════

/// Blend `image` away from a reference image: `reference + factor × (image − reference)`.
fn blend(reference: &RgbImage, image: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for ((o, r), p) in out
        .pixels_mut()
        .zip(reference.pixels())
        .zip(image.pixels())
    {
        for ch in 0..3 {
            let base = r.0[ch] as f32;
            let v = base + factor * (p.0[ch] as f32 - base);
            o.0[ch] = v.clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// ITU-R 601-2 luma in 16-bit fixed point.
fn luma(p: &Rgb<u8>) -> u32 {
    let [r, g, b] = p.0;
    (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16
}

/// Contrast enhancement against a flat gray at the image's mean luminance.
/// `factor` 1.0 returns the image unchanged.
pub fn enhance_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let count = (image.width() as u64) * (image.height() as u64);
    if count == 0 {
        return image.clone();
    }
    let sum: u64 = image.pixels().map(|p| luma(p) as u64).sum();
    let mean = (sum as f64 / count as f64 + 0.5) as u8;

    let gray = RgbImage::from_pixel(image.width(), image.height(), Rgb([mean, mean, mean]));
    blend(&gray, image, factor)
}

/// Sharpness enhancement against a 3×3 smoothed copy. Border pixels of the
/// smoothed copy equal the original, so the border is never changed.
pub fn enhance_sharpness(image: &RgbImage, factor: f32) -> RgbImage {
    let smoothed = smooth(image);
    blend(&smoothed, image, factor)
}

fn smooth(image: &RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    let mut out = image.clone();
    if w < 3 || h < 3 {
        return out;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut acc = [0u32; 3];
            for (ky, row) in SMOOTH_KERNEL.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    let p = image.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1);
                    for ch in 0..3 {
                        acc[ch] += p.0[ch] as u32 * weight;
                    }
                }
            }
            let px = out.get_pixel_mut(x, y);
            for ch in 0..3 {
                px.0[ch] = ((acc[ch] as f32 / SMOOTH_DIVISOR as f32) + 0.5).min(255.0) as u8;
            }
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════
// Conversions
// ═══════════════════════════════════════════════════════════

fn rgb_to_tensor(image: &RgbImage) -> Result<ImageTensor, DiseaseError> {
    let (w, h) = image.dimensions();
    let data: Vec<f32> = image.as_raw().iter().map(|&b| b as f32 / 255.0).collect();
    Array3::from_shape_vec((h as usize, w as usize, 3), data)
        .map_err(|e| DiseaseError::Decode(format!("tensor shape: {e}")))
}

fn tensor_to_rgb(tensor: &ImageTensor) -> Result<RgbImage, DiseaseError> {
    let (h, w, _) = tensor.dim();
    let raw: Vec<u8> = tensor
        .iter()
        .map(|&v| (v * 255.0).clamp(0.0, 255.0) as u8)
        .collect();
    ImageBuffer::from_raw(w as u32, h as u32, raw)
        .ok_or_else(|| DiseaseError::Decode("pixel array does not fit an RGB image".into()))
}

/// JPEG (quality 95) data URL for display.
pub fn encode_preview(image: &RgbImage) -> Result<String, DiseaseError> {
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, PREVIEW_JPEG_QUALITY)
        .encode_image(image)
        .map_err(|e| DiseaseError::Decode(format!("preview encode failed: {e}")))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(buf.into_inner());
    Ok(format!("{PREVIEW_PREFIX}{encoded}"))
}

/// Color mode label for the decoded image (`RGB`, `RGBA`, `L`, ...).
fn color_mode(image: &DynamicImage) -> &'static str {
    match image.color() {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;F",
        ColorType::Rgba32F => "RGBA;F",
        _ => "unknown",
    }
}
