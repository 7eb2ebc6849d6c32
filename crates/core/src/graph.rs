//! The built pass graph: compiled programs bound to their framebuffers.
//!
//! [`PassGraph::build`] realizes a [`PassPlan`] on the GPU. Every program
//! is compiled first, then each pass's framebuffer is assembled from the
//! pool using the plan's write mask. Programs are owned by the graph;
//! framebuffers are owned by the pool that created them.

use crate::backend::{GpuBackend, ResourceScope};
use crate::error::PipelineError;
use crate::pack::{PackDirectives, ProgramSet};
use crate::ping_pong::{BufferSelection, TargetIndex};
use crate::plan::{cleared_buffers, plan_program_set, PassPlan};
use crate::pool::RenderTargetPool;

/// One full-screen program execution.
pub struct Pass<B: GpuBackend> {
    name: String,
    program: B::Program,
    framebuffer: B::Framebuffer,
    draw_buffers: Vec<TargetIndex>,
    write_mask: BufferSelection,
    stage_reads_from_alt: BufferSelection,
    viewport_scale: f32,
    is_last_pass: bool,
}

impl<B: GpuBackend> Pass<B> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> B::Program {
        self.program
    }

    pub fn framebuffer(&self) -> B::Framebuffer {
        self.framebuffer
    }

    pub fn draw_buffers(&self) -> &[TargetIndex] {
        &self.draw_buffers
    }

    pub fn write_mask(&self) -> &BufferSelection {
        &self.write_mask
    }

    /// Which buffer of each slot this pass samples.
    pub fn stage_reads_from_alt(&self) -> &BufferSelection {
        &self.stage_reads_from_alt
    }

    pub fn viewport_scale(&self) -> f32 {
        self.viewport_scale
    }

    /// The last pass renders straight into the host output.
    pub fn is_last_pass(&self) -> bool {
        self.is_last_pass
    }

    /// Viewport size for a host output of `width` x `height`, truncated.
    pub fn viewport_size(&self, width: u32, height: u32) -> (u32, u32) {
        (
            (width as f32 * self.viewport_scale) as u32,
            (height as f32 * self.viewport_scale) as u32,
        )
    }
}

/// Ordered, immutable pass list plus the baseline framebuffer.
pub struct PassGraph<B: GpuBackend> {
    passes: Vec<Pass<B>>,
    baseline: B::Framebuffer,
    plan: PassPlan,
    unpersisted: Vec<TargetIndex>,
}

impl<B: GpuBackend> PassGraph<B> {
    /// Plans `programs`, compiles every program and assembles the pass
    /// framebuffers from `pool`.
    ///
    /// Directive errors are reported before any GPU work. Every handle is
    /// tracked by `scope`, so a failed build releases what it created.
    pub fn build(
        scope: &ResourceScope<'_, B>,
        pool: &mut RenderTargetPool<B>,
        programs: &ProgramSet,
        directives: &PackDirectives,
    ) -> Result<Self, PipelineError> {
        let plan = plan_program_set(programs)?;
        let will_be_cleared = cleared_buffers(directives)?;

        let compiled = programs
            .ordered_programs()
            .into_iter()
            .filter_map(|source| {
                let (vertex, fragment) = source.stages()?;
                Some(scope.compile_program(&source.name, vertex, fragment))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut passes = Vec::with_capacity(plan.passes.len());
        for (planned, program) in plan.passes.iter().zip(compiled) {
            let framebuffer =
                pool.create_color_framebuffer(scope, &planned.write_mask, &planned.draw_buffers)?;
            log::debug!(
                "pass '{}': reads {} writes {:?} at scale {}",
                planned.name,
                planned.stage_reads_from_alt,
                planned.draw_buffers,
                planned.viewport_scale
            );
            passes.push(Pass {
                name: planned.name.clone(),
                program,
                framebuffer,
                draw_buffers: planned.draw_buffers.clone(),
                write_mask: planned.write_mask,
                stage_reads_from_alt: planned.stage_reads_from_alt,
                viewport_scale: planned.viewport_scale,
                is_last_pass: planned.is_last_pass,
            });
        }

        let unpersisted = plan.unpersisted_buffers(&will_be_cleared);
        for slot in &unpersisted {
            log::warn!(
                "the content of buffer {slot} needs to be persisted across frames, \
                 which is not supported"
            );
        }

        let baseline = pool.create_framebuffer_writing_to_main(scope, &[TargetIndex::FIRST])?;

        Ok(Self {
            passes,
            baseline,
            plan,
            unpersisted,
        })
    }

    pub fn passes(&self) -> &[Pass<B>] {
        &self.passes
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Writes slot 0 main with scene depth attached. Source of the
    /// fallback color copy and of the final depth copy.
    pub fn baseline(&self) -> B::Framebuffer {
        self.baseline
    }

    /// The plan this graph was built from.
    pub fn plan(&self) -> &PassPlan {
        &self.plan
    }

    /// Slots that were warned about as needing cross-frame persistence.
    pub fn unpersisted_buffers(&self) -> &[TargetIndex] {
        &self.unpersisted
    }

    /// Deletes every pass program. Safe to call twice.
    pub fn destroy(&mut self, backend: &B) {
        for pass in self.passes.drain(..) {
            backend.delete_program(pass.program);
        }
    }
}
