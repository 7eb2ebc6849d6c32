//! `glow` implementation of [`GpuBackend`].
//!
//! `GlowBackend` wraps a `glow::Context` and the empty vertex array the
//! full-screen triangle is drawn with. Float color attachments are checked
//! at construction on embedded contexts, where they need
//! `EXT_color_buffer_float`.

use super::{framebuffer, shader, texture};
use crate::backend::{BlitMask, GpuBackend};
use crate::error::PipelineError;
use crate::fullscreen::FULLSCREEN_VERTEX_COUNT;
use crate::shader::ShaderError;
use crate::texture::TextureConfig;

/// Upper bound on stale errors drained before a draw.
const MAX_PENDING_ERRORS: usize = 16;

/// Readable name of a `glGetError` code.
pub fn gl_error_name(code: u32) -> String {
    match code {
        glow::INVALID_ENUM => "GL_INVALID_ENUM".to_string(),
        glow::INVALID_VALUE => "GL_INVALID_VALUE".to_string(),
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION".to_string(),
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION".to_string(),
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY".to_string(),
        other => format!("GL error 0x{other:04X}"),
    }
}

/// A [`GpuBackend`] over a live GL context.
pub struct GlowBackend {
    gl: glow::Context,
    fullscreen_vao: glow::VertexArray,
}

impl GlowBackend {
    /// Wraps `gl` and allocates the full-screen vertex array.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Gpu` on an embedded context without
    /// `EXT_color_buffer_float`, since RGBA16F targets cannot be rendered
    /// to there, or if the vertex array cannot be created.
    #[allow(unsafe_code)]
    pub fn new(gl: glow::Context) -> Result<Self, PipelineError> {
        use glow::HasContext;

        if gl.version().is_embedded {
            let extensions = gl.supported_extensions();
            if !extensions.contains("EXT_color_buffer_float")
                && !extensions.contains("GL_EXT_color_buffer_float")
            {
                return Err(PipelineError::Gpu(
                    "required extension EXT_color_buffer_float is not supported".to_string(),
                ));
            }
        }

        // SAFETY: glow wraps raw GL calls as unsafe. The vertex array has no
        // attributes; positions come from gl_VertexID.
        let fullscreen_vao = unsafe { gl.create_vertex_array() }.map_err(PipelineError::Gpu)?;

        Ok(Self { gl, fullscreen_vao })
    }

    /// Returns a reference to the underlying `glow::Context`.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Deletes the full-screen vertex array and returns the context.
    #[allow(unsafe_code)]
    pub fn into_gl(self) -> glow::Context {
        use glow::HasContext;

        // SAFETY: the vertex array was created in new() and is not bound
        // outside begin_fullscreen/end_fullscreen.
        unsafe { self.gl.delete_vertex_array(self.fullscreen_vao) };
        self.gl
    }
}

#[allow(unsafe_code)]
impl GpuBackend for GlowBackend {
    type Texture = glow::Texture;
    type Framebuffer = glow::Framebuffer;
    type Program = glow::Program;

    fn create_texture(
        &self,
        config: &TextureConfig,
        data: Option<&[u8]>,
    ) -> Result<glow::Texture, PipelineError> {
        texture::create_texture(&self.gl, config, data)
    }

    fn resize_texture(
        &self,
        texture: glow::Texture,
        config: &TextureConfig,
    ) -> Result<(), PipelineError> {
        texture::resize_texture(&self.gl, texture, config);
        Ok(())
    }

    fn delete_texture(&self, texture: glow::Texture) {
        use glow::HasContext;
        // SAFETY: the pool deletes each texture exactly once.
        unsafe { self.gl.delete_texture(texture) };
    }

    fn create_framebuffer(
        &self,
        color: &[glow::Texture],
        depth: Option<glow::Texture>,
    ) -> Result<glow::Framebuffer, PipelineError> {
        framebuffer::create_framebuffer(&self.gl, color, depth)
    }

    fn delete_framebuffer(&self, framebuffer: glow::Framebuffer) {
        use glow::HasContext;
        // SAFETY: the pool deletes each framebuffer exactly once.
        unsafe { self.gl.delete_framebuffer(framebuffer) };
    }

    fn compile_program(&self, vertex: &str, fragment: &str) -> Result<glow::Program, ShaderError> {
        shader::compile_program(&self.gl, vertex, fragment)
    }

    fn delete_program(&self, program: glow::Program) {
        use glow::HasContext;
        // SAFETY: the graph deletes each program exactly once.
        unsafe { self.gl.delete_program(program) };
    }

    fn bind_framebuffer(&self, framebuffer: Option<glow::Framebuffer>) {
        use glow::HasContext;
        // SAFETY: the handle is owned by the pool or the host and still live.
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) };
    }

    fn viewport(&self, width: u32, height: u32) {
        use glow::HasContext;
        // SAFETY: plain state call. Callers pass sizes derived from
        // non-zero render target dimensions.
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32) };
    }

    fn bind_texture(&self, unit: u32, texture: Option<glow::Texture>) {
        use glow::HasContext;
        // SAFETY: units stay below the 16 every supported context exposes,
        // and the texture, if any, is a live pool texture.
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, texture);
        }
    }

    fn select_texture_unit(&self, unit: u32) {
        use glow::HasContext;
        // SAFETY: units stay below the 16 every supported context exposes.
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) };
    }

    fn use_program(&self, program: Option<glow::Program>) {
        use glow::HasContext;
        // SAFETY: the program, if any, was linked by compile_program and is
        // owned by the live pass graph.
        unsafe { self.gl.use_program(program) };
    }

    fn begin_fullscreen(&self) {
        use glow::HasContext;
        // SAFETY: the vertex array was created in new() and lives as long as
        // the backend.
        unsafe { self.gl.bind_vertex_array(Some(self.fullscreen_vao)) };
    }

    fn draw_fullscreen(&self) -> Result<(), String> {
        use glow::HasContext;

        // SAFETY: begin_fullscreen bound the attribute-less vertex array and
        // the executor bound a linked program.
        unsafe {
            // Errors left by earlier host calls must not be blamed on this pass.
            for _ in 0..MAX_PENDING_ERRORS {
                if self.gl.get_error() == glow::NO_ERROR {
                    break;
                }
            }
            self.gl
                .draw_arrays(glow::TRIANGLES, 0, FULLSCREEN_VERTEX_COUNT);
            match self.gl.get_error() {
                glow::NO_ERROR => Ok(()),
                code => Err(gl_error_name(code)),
            }
        }
    }

    fn end_fullscreen(&self) {
        use glow::HasContext;
        // SAFETY: unbinding the vertex array is always valid.
        unsafe { self.gl.bind_vertex_array(None) };
    }

    fn blit(
        &self,
        src: Option<glow::Framebuffer>,
        src_size: (u32, u32),
        dst: Option<glow::Framebuffer>,
        dst_size: (u32, u32),
        mask: BlitMask,
    ) {
        framebuffer::blit(&self.gl, src, src_size, dst, dst_size, mask);
    }
}
