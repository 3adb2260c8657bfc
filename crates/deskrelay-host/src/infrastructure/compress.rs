//! Optional frame re-encoding before upload.
//!
//! Capture tools usually emit lossless PNG at native resolution, which is
//! far more than a browser viewer needs.  [`ImageCompressor`] decodes the
//! frame, shrinks it so its longest edge fits `max_dim`, and re-encodes it.
//! Whenever that fails or does not save bytes, the original frame is sent
//! as captured.

use bytes::Bytes;
use clap::ValueEnum;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError};
use tracing::debug;

use crate::application::host_loop::FrameCompressor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CompressFormat {
    #[default]
    Jpeg,
    Png,
    /// Lossless WebP.
    Webp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressSettings {
    pub format: CompressFormat,
    /// JPEG quality, 1..=100.  Ignored by the lossless formats.
    pub quality: u8,
    /// Longest edge after downscaling; `None` keeps the native size.
    pub max_dim: Option<u32>,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self {
            format: CompressFormat::Jpeg,
            quality: 70,
            max_dim: Some(1920),
        }
    }
}

/// Target size for a `width`x`height` frame, or `None` if it already fits.
pub fn fit_within(width: u32, height: u32, max_dim: u32) -> Option<(u32, u32)> {
    let longest = width.max(height);
    if max_dim == 0 || longest <= max_dim {
        return None;
    }
    let scale = f64::from(max_dim) / f64::from(longest);
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).max(1);
    Some((scaled(width), scaled(height)))
}

#[derive(Debug, Clone)]
pub struct ImageCompressor {
    settings: CompressSettings,
}

impl ImageCompressor {
    pub fn new(settings: CompressSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> CompressSettings {
        self.settings
    }

    /// Decodes, downscales and re-encodes `frame`.
    ///
    /// # Errors
    ///
    /// Any decode or encode failure from the `image` crate.
    pub fn try_compress(&self, frame: &[u8]) -> Result<Vec<u8>, ImageError> {
        let mut img = image::load_from_memory(frame)?;
        if let Some(max_dim) = self.settings.max_dim {
            if let Some((w, h)) = fit_within(img.width(), img.height(), max_dim) {
                img = img.resize_exact(w, h, FilterType::Triangle);
            }
        }
        self.encode(&img)
    }

    fn encode(&self, img: &DynamicImage) -> Result<Vec<u8>, ImageError> {
        let mut out = Vec::new();
        match self.settings.format {
            CompressFormat::Jpeg => {
                let rgb = img.to_rgb8();
                JpegEncoder::new_with_quality(&mut out, self.settings.quality.clamp(1, 100)).write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    ExtendedColorType::Rgb8,
                )?;
            }
            CompressFormat::Png => {
                let rgba = img.to_rgba8();
                PngEncoder::new(&mut out).write_image(
                    rgba.as_raw(),
                    rgba.width(),
                    rgba.height(),
                    ExtendedColorType::Rgba8,
                )?;
            }
            CompressFormat::Webp => {
                let rgba = img.to_rgba8();
                WebPEncoder::new_lossless(&mut out).write_image(
                    rgba.as_raw(),
                    rgba.width(),
                    rgba.height(),
                    ExtendedColorType::Rgba8,
                )?;
            }
        }
        Ok(out)
    }
}

impl FrameCompressor for ImageCompressor {
    fn compress(&self, frame: Bytes) -> Bytes {
        match self.try_compress(&frame) {
            Ok(out) if out.len() < frame.len() => Bytes::from(out),
            Ok(out) => {
                debug!(original = frame.len(), compressed = out.len(), "compression saved nothing");
                frame
            }
            Err(e) => {
                debug!("frame compression skipped: {e}");
                frame
            }
        }
    }
}
