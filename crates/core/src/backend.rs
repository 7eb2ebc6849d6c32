//! The graphics-API seam used by the pool, builder and executor.
//!
//! [`GpuBackend`] covers exactly the primitives the composite pipeline
//! needs: texture and framebuffer allocation, program compilation, binding
//! state, the full-screen quad and framebuffer blits. The `glow`
//! implementation lives in [`crate::render`] behind the `render` feature.
//!
//! Every method takes `&self`, matching how GL context wrappers expose the
//! API, so scope guards can borrow the backend while the build continues.

use crate::error::PipelineError;
use crate::shader::ShaderError;
use crate::texture::TextureConfig;
use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;

/// Which buffers a [`GpuBackend::blit`] copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitMask {
    Color,
    Depth,
    ColorAndDepth,
}

impl BlitMask {
    pub fn includes_color(self) -> bool {
        matches!(self, BlitMask::Color | BlitMask::ColorAndDepth)
    }

    pub fn includes_depth(self) -> bool {
        matches!(self, BlitMask::Depth | BlitMask::ColorAndDepth)
    }
}

/// Graphics API primitives consumed by the composite pipeline.
///
/// Framebuffer arguments of `None` name the host's default framebuffer.
pub trait GpuBackend {
    type Texture: Copy + Eq + Hash + Debug;
    type Framebuffer: Copy + Eq + Hash + Debug;
    type Program: Copy + Eq + Hash + Debug;

    /// Allocates a texture, optionally uploading initial RGBA8 pixel data.
    fn create_texture(
        &self,
        config: &TextureConfig,
        data: Option<&[u8]>,
    ) -> Result<Self::Texture, PipelineError>;

    /// Reallocates a texture's storage in place, keeping its handle.
    fn resize_texture(
        &self,
        texture: Self::Texture,
        config: &TextureConfig,
    ) -> Result<(), PipelineError>;

    fn delete_texture(&self, texture: Self::Texture);

    /// Creates a framebuffer with `color[i]` on color attachment `i` and
    /// an optional depth attachment, and verifies completeness.
    fn create_framebuffer(
        &self,
        color: &[Self::Texture],
        depth: Option<Self::Texture>,
    ) -> Result<Self::Framebuffer, PipelineError>;

    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer);

    /// Compiles and links a program, with sampler uniforms assigned to
    /// their fixed units (see [`crate::units::SAMPLER_UNITS`]).
    fn compile_program(&self, vertex: &str, fragment: &str)
        -> Result<Self::Program, ShaderError>;

    fn delete_program(&self, program: Self::Program);

    fn bind_framebuffer(&self, framebuffer: Option<Self::Framebuffer>);

    fn viewport(&self, width: u32, height: u32);

    /// Binds `texture` (or nothing) to texture unit `unit`.
    fn bind_texture(&self, unit: u32, texture: Option<Self::Texture>);

    /// Makes `unit` the active texture unit without changing bindings.
    fn select_texture_unit(&self, unit: u32);

    fn use_program(&self, program: Option<Self::Program>);

    /// Binds the geometry used by [`GpuBackend::draw_fullscreen`].
    fn begin_fullscreen(&self);

    /// Draws one full-screen triangle with the current program.
    ///
    /// Returns the API's error description if the draw failed.
    fn draw_fullscreen(&self) -> Result<(), String>;

    fn end_fullscreen(&self);

    /// Copies the selected buffers from `src` to `dst`, stretching
    /// `src_size` onto `dst_size`.
    fn blit(
        &self,
        src: Option<Self::Framebuffer>,
        src_size: (u32, u32),
        dst: Option<Self::Framebuffer>,
        dst_size: (u32, u32),
        mask: BlitMask,
    );
}

/// The externally visible framebuffer composite output lands in.
pub struct HostOutput<B: GpuBackend> {
    /// `None` is the default framebuffer.
    pub framebuffer: Option<B::Framebuffer>,
    pub width: u32,
    pub height: u32,
}

impl<B: GpuBackend> Debug for HostOutput<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostOutput")
            .field("framebuffer", &self.framebuffer)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl<B: GpuBackend> Clone for HostOutput<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: GpuBackend> Copy for HostOutput<B> {}

impl<B: GpuBackend> HostOutput<B> {
    pub fn new(framebuffer: Option<B::Framebuffer>, width: u32, height: u32) -> Self {
        Self {
            framebuffer,
            width,
            height,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Binds the host framebuffer for writing, optionally resetting the
    /// viewport to cover it entirely.
    pub fn begin_write(&self, backend: &B, set_viewport: bool) {
        backend.bind_framebuffer(self.framebuffer);
        if set_viewport {
            backend.viewport(self.width, self.height);
        }
    }
}

/// A GPU handle owned by a [`ResourceScope`].
pub enum Resource<B: GpuBackend> {
    Texture(B::Texture),
    Framebuffer(B::Framebuffer),
    Program(B::Program),
}

impl<B: GpuBackend> Resource<B> {
    fn release(self, backend: &B) {
        match self {
            Resource::Texture(t) => backend.delete_texture(t),
            Resource::Framebuffer(f) => backend.delete_framebuffer(f),
            Resource::Program(p) => backend.delete_program(p),
        }
    }
}

/// Tracks every handle created during a build.
///
/// Dropping the scope releases everything it tracked, newest first, so an
/// early return anywhere in a build leaves no allocation behind. Call
/// [`ResourceScope::commit`] once ownership has been handed to the pool
/// and graph.
pub struct ResourceScope<'a, B: GpuBackend> {
    backend: &'a B,
    tracked: RefCell<Vec<Resource<B>>>,
}

impl<'a, B: GpuBackend> ResourceScope<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            tracked: RefCell::new(Vec::new()),
        }
    }

    pub fn backend(&self) -> &'a B {
        self.backend
    }

    pub fn create_texture(
        &self,
        config: &TextureConfig,
        data: Option<&[u8]>,
    ) -> Result<B::Texture, PipelineError> {
        let texture = self.backend.create_texture(config, data)?;
        self.tracked.borrow_mut().push(Resource::Texture(texture));
        Ok(texture)
    }

    pub fn create_framebuffer(
        &self,
        color: &[B::Texture],
        depth: Option<B::Texture>,
    ) -> Result<B::Framebuffer, PipelineError> {
        let framebuffer = self.backend.create_framebuffer(color, depth)?;
        self.tracked
            .borrow_mut()
            .push(Resource::Framebuffer(framebuffer));
        Ok(framebuffer)
    }

    pub fn compile_program(
        &self,
        name: &str,
        vertex: &str,
        fragment: &str,
    ) -> Result<B::Program, PipelineError> {
        let program = self
            .backend
            .compile_program(vertex, fragment)
            .map_err(|source| PipelineError::Shader {
                program: name.to_string(),
                source,
            })?;
        self.tracked.borrow_mut().push(Resource::Program(program));
        Ok(program)
    }

    /// Number of handles currently tracked.
    pub fn len(&self) -> usize {
        self.tracked.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.borrow().is_empty()
    }

    /// Keeps every tracked handle alive past the scope.
    pub fn commit(self) {
        self.tracked.borrow_mut().clear();
    }
}

impl<B: GpuBackend> Drop for ResourceScope<'_, B> {
    fn drop(&mut self) {
        let tracked = std::mem::take(self.tracked.get_mut());
        if !tracked.is_empty() {
            log::debug!("releasing {} resources from an abandoned build", tracked.len());
        }
        for resource in tracked.into_iter().rev() {
            resource.release(self.backend);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, RecordingBackend};
    use crate::texture::ColorFormat;

    #[test]
    fn blit_mask_components() {
        assert!(BlitMask::Color.includes_color() && !BlitMask::Color.includes_depth());
        assert!(!BlitMask::Depth.includes_color() && BlitMask::Depth.includes_depth());
        assert!(BlitMask::ColorAndDepth.includes_color());
        assert!(BlitMask::ColorAndDepth.includes_depth());
    }

    #[test]
    fn host_begin_write_binds_and_optionally_sets_viewport() {
        let backend = RecordingBackend::new();
        let host = HostOutput::<RecordingBackend>::new(None, 640, 480);

        host.begin_write(&backend, false);
        assert_eq!(backend.state().bound_framebuffer, None);
        assert_eq!(backend.state().viewport, None);

        host.begin_write(&backend, true);
        assert_eq!(backend.state().viewport, Some((640, 480)));
    }

    #[test]
    fn dropped_scope_releases_tracked_resources_newest_first() {
        let backend = RecordingBackend::new();
        {
            let scope = ResourceScope::new(&backend);
            let tex = scope
                .create_texture(&TextureConfig::color(4, 4, ColorFormat::Rgba8), None)
                .unwrap();
            scope.create_framebuffer(&[tex], None).unwrap();
            scope.compile_program("p", "v", "f").unwrap();
            assert_eq!(scope.len(), 3);
        }
        assert!(backend.state().live_textures.is_empty());
        assert!(backend.state().live_framebuffers.is_empty());
        assert!(backend.state().live_programs.is_empty());

        let deletes: Vec<Event> = backend
            .events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    Event::DeleteProgram(_) | Event::DeleteFramebuffer(_) | Event::DeleteTexture(_)
                )
            })
            .collect();
        assert!(matches!(deletes[0], Event::DeleteProgram(_)), "got {deletes:?}");
        assert!(matches!(deletes[2], Event::DeleteTexture(_)), "got {deletes:?}");
    }

    #[test]
    fn committed_scope_keeps_resources() {
        let backend = RecordingBackend::new();
        let scope = ResourceScope::new(&backend);
        scope
            .create_texture(&TextureConfig::depth(4, 4), None)
            .unwrap();
        scope.commit();
        assert_eq!(backend.state().live_textures.len(), 1);
    }

    #[test]
    fn failed_compile_is_wrapped_with_program_name() {
        let backend = RecordingBackend::new();
        backend.fail_compile_containing("broken");
        let scope = ResourceScope::new(&backend);
        let err = scope.compile_program("composite3", "v", "broken").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Shader { ref program, .. } if program == "composite3"
        ));
        assert!(scope.is_empty());
    }
}
