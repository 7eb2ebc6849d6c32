#![deny(unsafe_code)]
//! Core of the shader-pack composite pipeline.
//!
//! Provides the ping-ponged `RenderTargetPool`, the `PassGraph` built from a
//! pack's composite programs by the `plan` fold, the per-frame
//! `render_composite` executor and the `PipelineController` that rebuilds
//! everything on scene change or reload. All GPU access goes through the
//! `GpuBackend` trait; the `glow` implementation is behind the `render`
//! feature.

pub mod backend;
pub mod error;
pub mod executor;
pub mod fullscreen;
pub mod graph;
pub mod lifecycle;
pub mod noise;
pub mod pack;
pub mod ping_pong;
pub mod plan;
pub mod pool;
pub mod shader;
pub mod texture;
pub mod units;

#[cfg(feature = "render")]
pub mod render;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{BlitMask, GpuBackend, HostOutput, ResourceScope};
pub use error::{PackError, PipelineError};
pub use executor::render_composite;
pub use graph::{Pass, PassGraph};
pub use lifecycle::{ActivePipeline, PipelineController, PipelineState};
pub use pack::{
    PackDirectives, PackSource, ProgramDirectives, ProgramSet, ProgramSource, SceneKey,
    ShaderPack, StaticPackSource,
};
pub use ping_pong::{BufferSelection, TargetIndex, MAX_RENDER_TARGETS};
pub use plan::{plan_passes, plan_program_set, PassPlan, PlannedPass};
pub use pool::{RenderTarget, RenderTargetPool};
pub use shader::ShaderError;
pub use texture::{ColorFormat, TextureConfig};
