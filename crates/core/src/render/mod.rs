//! OpenGL backend built on `glow`.
//!
//! This module is only available when the `render` feature is enabled.
//!
//! # Module overview
//!
//! - [`context`] -- `GlowBackend`, the [`crate::backend::GpuBackend`] impl.
//! - [`texture`] -- Format mapping and texture allocation.
//! - [`framebuffer`] -- Multi-attachment framebuffers and blits.
//! - [`shader`] -- Compilation, linking and sampler unit assignment.

pub mod context;
pub mod framebuffer;
pub mod shader;
pub mod texture;

pub use context::{gl_error_name, GlowBackend};
pub use shader::compile_program;
pub use texture::{gl_format, GlFormat};
