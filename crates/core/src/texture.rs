//! Texture descriptions handed to the graphics backend.
//!
//! `TextureConfig` carries dimensions, storage format and filtering for
//! every texture the render target pool allocates. Color targets default to
//! RGBA16F for HDR range; packs may override the format per slot.

use serde::{Deserialize, Serialize};

/// Storage format of a color render target, as named in pack directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFormat {
    /// 8 bits per channel, normalized.
    Rgba8,
    /// Half-float HDR.
    #[default]
    Rgba16f,
    /// Full-float HDR.
    Rgba32f,
}

/// Storage format of any pool texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Color(ColorFormat),
    /// 24-bit depth, the scene depth buffers.
    Depth24,
}

impl TextureFormat {
    /// Whether this format can be attached as a depth attachment.
    pub fn is_depth(self) -> bool {
        matches!(self, TextureFormat::Depth24)
    }
}

/// Minification/magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Linear,
    Nearest,
}

/// Configuration for creating a GPU texture.
///
/// Use the convenience constructors for the pool's three texture kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
    /// Storage format.
    pub format: TextureFormat,
    /// Filter used for both min and mag.
    pub filter: Filter,
}

impl TextureConfig {
    /// A LINEAR-filtered color target.
    pub fn color(width: u32, height: u32, format: ColorFormat) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Color(format),
            filter: Filter::Linear,
        }
    }

    /// A NEAREST-filtered depth texture. Depth is never interpolated.
    pub fn depth(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Depth24,
            filter: Filter::Nearest,
        }
    }

    /// A square RGBA8 noise texture sampled with LINEAR filtering.
    pub fn noise(resolution: u32) -> Self {
        Self::color(resolution, resolution, ColorFormat::Rgba8)
    }

    /// Same texture description at a different size.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..*self
        }
    }
}
