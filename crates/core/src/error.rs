//! Error types for the composite pipeline.

use crate::shader::ShaderError;
use thiserror::Error;

/// Errors produced while resolving a shader pack source.
#[derive(Debug, Clone, Error)]
pub enum PackError {
    /// A file or directory could not be read.
    #[error("i/o error at {path}: {message}")]
    Io { path: String, message: String },

    /// The pack manifest exists but could not be parsed.
    #[error("invalid pack manifest {path}: {message}")]
    Manifest { path: String, message: String },

    /// No pack with the given name exists.
    #[error("shader pack not found: {0}")]
    NotFound(String),

    /// Releasing a handle held by the pack source failed.
    #[error("failed to release shader pack {name}: {message}")]
    Release { name: String, message: String },
}

/// Errors produced while building or executing a composite pipeline.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// A program's draw buffers reference a slot outside the pool.
    #[error("program '{program}' writes render target {index}, but only {max} exist")]
    TargetOutOfRange {
        program: String,
        index: usize,
        max: usize,
    },

    /// A program lists the same draw buffer more than once.
    #[error("program '{program}' lists draw buffer {index} more than once")]
    DuplicateDrawBuffer { program: String, index: usize },

    /// A program lists no draw buffers, so its pass would have nothing to
    /// render into.
    #[error("program '{program}' has no draw buffers")]
    NoDrawBuffers { program: String },

    /// The pack asked for a noise texture of zero or excessive size.
    #[error("noise texture resolution {resolution} is outside 1..={max}")]
    InvalidNoiseResolution { resolution: u32, max: u32 },

    /// A viewport scale was zero, negative or not finite.
    #[error("program '{program}' has invalid viewport scale {scale}")]
    InvalidViewportScale { program: String, scale: f32 },

    /// A program failed to compile or link.
    #[error("failed to build program '{program}': {source}")]
    Shader {
        program: String,
        #[source]
        source: ShaderError,
    },

    /// A texture or framebuffer could not be created.
    #[error("gpu resource error: {0}")]
    Gpu(String),

    /// The host output or pool was given a zero dimension.
    #[error("invalid dimensions: width and height must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A full-screen draw reported an error mid-frame.
    #[error("pass '{pass}' failed to draw: {message}")]
    Draw { pass: String, message: String },

    /// The shader pack source could not be resolved.
    #[error(transparent)]
    Pack(#[from] PackError),

    /// The controller was shut down.
    #[error("pipeline has been destroyed")]
    Destroyed,
}

impl PipelineError {
    /// Errors that abort a pipeline build. The controller falls back to
    /// the internal pack when it sees one of these.
    pub fn is_build_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::TargetOutOfRange { .. }
                | PipelineError::DuplicateDrawBuffer { .. }
                | PipelineError::NoDrawBuffers { .. }
                | PipelineError::InvalidNoiseResolution { .. }
                | PipelineError::InvalidViewportScale { .. }
                | PipelineError::Shader { .. }
                | PipelineError::Gpu(_)
        )
    }

    /// Errors that abandon the current frame but leave the graph usable.
    pub fn is_frame_fatal(&self) -> bool {
        matches!(self, PipelineError::Draw { .. })
    }
}
