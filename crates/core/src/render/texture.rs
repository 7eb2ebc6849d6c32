//! Texture allocation for the glow backend.
//!
//! Maps [`TextureConfig`] onto GL internal format, upload format and pixel
//! type, and allocates or reallocates storage in place.

use crate::error::PipelineError;
use crate::texture::{ColorFormat, Filter, TextureConfig, TextureFormat};

/// GL storage parameters for one texture format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlFormat {
    pub internal_format: u32,
    pub format: u32,
    pub pixel_type: u32,
}

/// Returns the GL internal format, upload format and pixel type for
/// `format`. Color formats upload as RGBA; depth as `DEPTH_COMPONENT`.
pub fn gl_format(format: TextureFormat) -> GlFormat {
    let (internal_format, format, pixel_type) = match format {
        TextureFormat::Color(ColorFormat::Rgba8) => (glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
        TextureFormat::Color(ColorFormat::Rgba16f) => (glow::RGBA16F, glow::RGBA, glow::HALF_FLOAT),
        TextureFormat::Color(ColorFormat::Rgba32f) => (glow::RGBA32F, glow::RGBA, glow::FLOAT),
        TextureFormat::Depth24 => (
            glow::DEPTH_COMPONENT24,
            glow::DEPTH_COMPONENT,
            glow::UNSIGNED_INT,
        ),
    };
    GlFormat {
        internal_format,
        format,
        pixel_type,
    }
}

pub fn gl_filter(filter: Filter) -> u32 {
    match filter {
        Filter::Linear => glow::LINEAR,
        Filter::Nearest => glow::NEAREST,
    }
}

/// Creates a GPU texture from the given configuration.
///
/// Sets wrap mode to `CLAMP_TO_EDGE` on both axes and the configured filter
/// for both min and mag. `data`, when given, must be tightly packed RGBA8
/// and is only accepted for `Rgba8` textures.
///
/// # Errors
///
/// Returns `PipelineError::Gpu` if the texture cannot be created or the
/// initial data does not match the texture size.
#[allow(unsafe_code)]
pub fn create_texture(
    gl: &glow::Context,
    config: &TextureConfig,
    data: Option<&[u8]>,
) -> Result<glow::Texture, PipelineError> {
    use glow::HasContext;

    if let Some(data) = data {
        let expected = config.width as usize * config.height as usize * 4;
        if config.format != TextureFormat::Color(ColorFormat::Rgba8) || data.len() != expected {
            return Err(PipelineError::Gpu(format!(
                "initial data of {} bytes does not fit a {}x{} {:?} texture",
                data.len(),
                config.width,
                config.height,
                config.format
            )));
        }
    }

    // SAFETY: glow wraps raw GL calls as unsafe. The texture is created,
    // configured and allocated with parameters derived from TextureConfig.
    let texture = unsafe { gl.create_texture() }.map_err(PipelineError::Gpu)?;

    let filter = gl_filter(config.filter) as i32;
    // SAFETY: texture is the live handle created above.
    unsafe {
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_WRAP_S,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_WRAP_T,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter);
    }

    allocate_storage(gl, texture, config, data);
    Ok(texture)
}

/// Reallocates `texture` at the size in `config`. Contents are undefined
/// afterwards; the handle and framebuffer attachments stay valid.
pub fn resize_texture(gl: &glow::Context, texture: glow::Texture, config: &TextureConfig) {
    allocate_storage(gl, texture, config, None);
}

#[allow(unsafe_code)]
fn allocate_storage(
    gl: &glow::Context,
    texture: glow::Texture,
    config: &TextureConfig,
    data: Option<&[u8]>,
) {
    use glow::HasContext;

    let format = gl_format(config.format);
    // SAFETY: `texture` is a live handle created by create_texture.
    unsafe {
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            format.internal_format as i32,
            config.width as i32,
            config.height as i32,
            0,
            format.format,
            format.pixel_type,
            glow::PixelUnpackData::Slice(data),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_color_format_is_half_float() {
        let format = gl_format(TextureFormat::Color(ColorFormat::default()));
        assert_eq!(format.internal_format, glow::RGBA16F);
        assert_eq!(format.pixel_type, glow::HALF_FLOAT);
    }

    #[test]
    fn rgba8_and_rgba32f_use_matching_pixel_types() {
        assert_eq!(
            gl_format(TextureFormat::Color(ColorFormat::Rgba8)).pixel_type,
            glow::UNSIGNED_BYTE
        );
        assert_eq!(
            gl_format(TextureFormat::Color(ColorFormat::Rgba32f)).pixel_type,
            glow::FLOAT
        );
    }

    #[test]
    fn depth_uploads_as_depth_component() {
        let format = gl_format(TextureFormat::Depth24);
        assert_eq!(format.internal_format, glow::DEPTH_COMPONENT24);
        assert_eq!(format.format, glow::DEPTH_COMPONENT);
    }

    #[test]
    fn filters_map_to_gl_constants() {
        assert_eq!(gl_filter(Filter::Linear), glow::LINEAR);
        assert_eq!(gl_filter(Filter::Nearest), glow::NEAREST);
    }

    #[test]
    #[ignore = "requires GL context"]
    fn create_texture_uploads_noise_data() {
        // Would test: create_texture with TextureConfig::noise(4) and 64
        // bytes succeeds, and with 63 bytes returns PipelineError::Gpu.
    }

    #[test]
    #[ignore = "requires GL context"]
    fn resize_texture_keeps_handle() {
        // Would test: the handle stays valid and reports the new size.
    }
}
