//! Ping-pong planning of the composite pass chain.
//!
//! Planning is a pure fold over the ordered program list. The state carried
//! from pass to pass is the read selection: which physical buffer of each
//! slot currently holds readable content. Each step writes to the
//! complement of that selection and then flips the slots it wrote, so no
//! pass ever samples the buffer it renders into. The GPU side
//! ([`crate::graph`]) realizes a plan without changing it.

use crate::error::PipelineError;
use crate::pack::{PackDirectives, ProgramDirectives, ProgramSet};
use crate::ping_pong::{BufferSelection, TargetIndex, MAX_RENDER_TARGETS};
use serde::Serialize;

/// One pass of a plan, before any GPU resource exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedPass {
    pub name: String,
    /// Slots written, in output-location order.
    pub draw_buffers: Vec<TargetIndex>,
    /// Physical buffer written per slot: the complement of the read state.
    pub write_mask: BufferSelection,
    /// Physical buffer sampled per slot during this pass.
    pub stage_reads_from_alt: BufferSelection,
    pub viewport_scale: f32,
    pub is_last_pass: bool,
}

/// The planned chain plus the read state it leaves behind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassPlan {
    pub passes: Vec<PlannedPass>,
    pub final_reads_from_alt: BufferSelection,
}

impl PassPlan {
    /// Slots whose readable content ends the frame in the alt buffer and
    /// which the pack does not clear. Their content would have to persist
    /// into the next frame, which the main/alt model cannot express.
    pub fn unpersisted_buffers(&self, will_be_cleared: &BufferSelection) -> Vec<TargetIndex> {
        self.final_reads_from_alt
            .alt_slots()
            .filter(|&slot| !will_be_cleared.is_alt(slot))
            .collect()
    }
}

/// Validates a program's draw buffers and viewport scale.
pub fn validate_directives(
    program: &str,
    directives: &ProgramDirectives,
) -> Result<Vec<TargetIndex>, PipelineError> {
    let scale = directives.viewport_scale;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(PipelineError::InvalidViewportScale {
            program: program.to_string(),
            scale,
        });
    }

    if directives.draw_buffers.is_empty() {
        return Err(PipelineError::NoDrawBuffers {
            program: program.to_string(),
        });
    }

    let mut seen = BufferSelection::all_main();
    directives
        .draw_buffers
        .iter()
        .map(|&index| {
            let slot = TargetIndex::new(index).ok_or_else(|| PipelineError::TargetOutOfRange {
                program: program.to_string(),
                index,
                max: MAX_RENDER_TARGETS,
            })?;
            if seen.is_alt(slot) {
                return Err(PipelineError::DuplicateDrawBuffer {
                    program: program.to_string(),
                    index,
                });
            }
            seen.toggle(slot);
            Ok(slot)
        })
        .collect()
}

/// Slots listed in `buffers_to_clear`, as a selection mask.
pub fn cleared_buffers(directives: &PackDirectives) -> Result<BufferSelection, PipelineError> {
    let mut cleared = BufferSelection::all_main();
    for &index in &directives.buffers_to_clear {
        let slot = TargetIndex::new(index).ok_or_else(|| PipelineError::TargetOutOfRange {
            program: "pack directives".to_string(),
            index,
            max: MAX_RENDER_TARGETS,
        })?;
        if !cleared.is_alt(slot) {
            cleared.toggle(slot);
        }
    }
    Ok(cleared)
}

/// A single fold step: plans one pass against `reads` and returns the read
/// state the next pass observes.
pub fn plan_step(
    reads: BufferSelection,
    name: &str,
    draw_buffers: Vec<TargetIndex>,
    viewport_scale: f32,
    is_last_pass: bool,
) -> (BufferSelection, PlannedPass) {
    let mut next = reads;
    for &slot in &draw_buffers {
        next.toggle(slot);
    }
    let pass = PlannedPass {
        name: name.to_string(),
        draw_buffers,
        write_mask: reads.inverted(),
        stage_reads_from_alt: reads,
        viewport_scale,
        is_last_pass,
    };
    (next, pass)
}

/// Plans a chain of `(name, directives)` programs in order.
pub fn plan_passes(programs: &[(&str, &ProgramDirectives)]) -> Result<PassPlan, PipelineError> {
    let count = programs.len();
    let (final_reads_from_alt, passes) = programs.iter().enumerate().try_fold(
        (BufferSelection::all_main(), Vec::with_capacity(count)),
        |(reads, mut passes), (i, &(name, directives))| {
            let draw_buffers = validate_directives(name, directives)?;
            let (next, pass) = plan_step(
                reads,
                name,
                draw_buffers,
                directives.viewport_scale,
                i + 1 == count,
            );
            passes.push(pass);
            Ok::<_, PipelineError>((next, passes))
        },
    )?;

    Ok(PassPlan {
        passes,
        final_reads_from_alt,
    })
}

/// Plans the ordered programs of a program set.
pub fn plan_program_set(set: &ProgramSet) -> Result<PassPlan, PipelineError> {
    let programs: Vec<(&str, &ProgramDirectives)> = set
        .ordered_programs()
        .into_iter()
        .map(|p| (p.name.as_str(), &p.directives))
        .collect();
    plan_passes(&programs)
}
