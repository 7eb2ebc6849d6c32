//! The render target pool: every texture and framebuffer a pipeline uses.
//!
//! The pool owns [`MAX_RENDER_TARGETS`] color targets, each backed by a
//! `main` and an `alt` texture, plus the scene depth textures and the noise
//! texture. It also assembles framebuffers over any subset of targets and
//! keeps every one it created, so a single [`RenderTargetPool::destroy`]
//! releases the lot.

use crate::backend::{GpuBackend, ResourceScope};
use crate::error::PipelineError;
use crate::noise::noise_pixels;
use crate::pack::PackDirectives;
use crate::ping_pong::{BufferSelection, TargetIndex, MAX_RENDER_TARGETS};
use crate::texture::TextureConfig;

/// Largest accepted `noise_texture_resolution`.
pub const MAX_NOISE_RESOLUTION: u32 = 8192;

/// One logical color slot and its two physical textures.
pub struct RenderTarget<B: GpuBackend> {
    main: B::Texture,
    alt: B::Texture,
    config: TextureConfig,
}

impl<B: GpuBackend> RenderTarget<B> {
    pub fn main_texture(&self) -> B::Texture {
        self.main
    }

    pub fn alt_texture(&self) -> B::Texture {
        self.alt
    }

    /// The texture selected by `alt`.
    pub fn texture(&self, alt: bool) -> B::Texture {
        if alt {
            self.alt
        } else {
            self.main
        }
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn config(&self) -> &TextureConfig {
        &self.config
    }
}

/// Fixed pool of ping-ponged color targets plus depth and noise inputs.
pub struct RenderTargetPool<B: GpuBackend> {
    targets: Vec<RenderTarget<B>>,
    depth: B::Texture,
    depth_no_translucents: B::Texture,
    noise: B::Texture,
    framebuffers: Vec<B::Framebuffer>,
    width: u32,
    height: u32,
}

impl<B: GpuBackend> RenderTargetPool<B> {
    /// Allocates every texture of the pool at `width` x `height`.
    ///
    /// Handles are tracked by `scope`, so a failure part-way through
    /// releases the textures already created.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimensions` for a zero size, `InvalidNoiseResolution`
    /// for a noise size of zero or above [`MAX_NOISE_RESOLUTION`], or the
    /// backend's error if a texture cannot be created.
    pub fn allocate(
        scope: &ResourceScope<'_, B>,
        width: u32,
        height: u32,
        directives: &PackDirectives,
    ) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidDimensions { width, height });
        }
        for &index in directives.formats.keys() {
            if TargetIndex::new(index).is_none() {
                return Err(PipelineError::TargetOutOfRange {
                    program: "pack directives".to_string(),
                    index,
                    max: MAX_RENDER_TARGETS,
                });
            }
        }

        let resolution = directives.noise_texture_resolution;
        if resolution == 0 || resolution > MAX_NOISE_RESOLUTION {
            return Err(PipelineError::InvalidNoiseResolution {
                resolution,
                max: MAX_NOISE_RESOLUTION,
            });
        }

        let targets = TargetIndex::all()
            .map(|slot| {
                let format = directives
                    .formats
                    .get(&slot.get())
                    .copied()
                    .unwrap_or_default();
                let config = TextureConfig::color(width, height, format);
                Ok(RenderTarget {
                    main: scope.create_texture(&config, None)?,
                    alt: scope.create_texture(&config, None)?,
                    config,
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        let depth_config = TextureConfig::depth(width, height);
        let depth = scope.create_texture(&depth_config, None)?;
        let depth_no_translucents = scope.create_texture(&depth_config, None)?;

        let noise = scope.create_texture(
            &TextureConfig::noise(resolution),
            Some(&noise_pixels(resolution)),
        )?;

        Ok(Self {
            targets,
            depth,
            depth_no_translucents,
            noise,
            framebuffers: Vec::new(),
            width,
            height,
        })
    }

    pub fn get(&self, index: TargetIndex) -> &RenderTarget<B> {
        &self.targets[index.get()]
    }

    pub fn depth_texture(&self) -> B::Texture {
        self.depth
    }

    pub fn depth_texture_no_translucents(&self) -> B::Texture {
        self.depth_no_translucents
    }

    pub fn noise_texture(&self) -> B::Texture {
        self.noise
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of framebuffers assembled so far.
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    /// Assembles a color-only framebuffer writing `draw_buffers` in order,
    /// each to the texture selected by `write_mask`.
    ///
    /// Passes sample the scene depth, so it is never attached here.
    pub fn create_color_framebuffer(
        &mut self,
        scope: &ResourceScope<'_, B>,
        write_mask: &BufferSelection,
        draw_buffers: &[TargetIndex],
    ) -> Result<B::Framebuffer, PipelineError> {
        self.assemble(scope, write_mask, draw_buffers, None)
    }

    /// A framebuffer writing the main texture of every slot in
    /// `draw_buffers`, with the scene depth attached so it can be blitted
    /// into the host output.
    pub fn create_framebuffer_writing_to_main(
        &mut self,
        scope: &ResourceScope<'_, B>,
        draw_buffers: &[TargetIndex],
    ) -> Result<B::Framebuffer, PipelineError> {
        let depth = self.depth;
        self.assemble(scope, &BufferSelection::all_main(), draw_buffers, Some(depth))
    }

    fn assemble(
        &mut self,
        scope: &ResourceScope<'_, B>,
        write_mask: &BufferSelection,
        draw_buffers: &[TargetIndex],
        depth: Option<B::Texture>,
    ) -> Result<B::Framebuffer, PipelineError> {
        if draw_buffers.is_empty() && depth.is_none() {
            return Err(PipelineError::Gpu(
                "framebuffer needs at least one attachment".to_string(),
            ));
        }
        let attachments: Vec<B::Texture> = draw_buffers
            .iter()
            .map(|&slot| self.get(slot).texture(write_mask.is_alt(slot)))
            .collect();
        let framebuffer = scope.create_framebuffer(&attachments, depth)?;
        self.framebuffers.push(framebuffer);
        Ok(framebuffer)
    }

    /// Reallocates every texture at a new size. Handles, and therefore
    /// every framebuffer already assembled, stay valid.
    pub fn resize(&mut self, backend: &B, width: u32, height: u32) -> Result<(), PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidDimensions { width, height });
        }
        if (width, height) == (self.width, self.height) {
            return Ok(());
        }
        for target in &mut self.targets {
            let config = target.config.resized(width, height);
            backend.resize_texture(target.main, &config)?;
            backend.resize_texture(target.alt, &config)?;
            target.config = config;
        }
        let depth_config = TextureConfig::depth(width, height);
        backend.resize_texture(self.depth, &depth_config)?;
        backend.resize_texture(self.depth_no_translucents, &depth_config)?;
        log::debug!(
            "resized render targets {}x{} -> {width}x{height}",
            self.width,
            self.height
        );
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Releases every framebuffer and texture. Safe to call twice.
    pub fn destroy(&mut self, backend: &B) {
        for framebuffer in self.framebuffers.drain(..).rev() {
            backend.delete_framebuffer(framebuffer);
        }
        if self.targets.is_empty() {
            return;
        }
        for target in self.targets.drain(..) {
            backend.delete_texture(target.main);
            backend.delete_texture(target.alt);
        }
        backend.delete_texture(self.depth);
        backend.delete_texture(self.depth_no_translucents);
        backend.delete_texture(self.noise);
    }
}
