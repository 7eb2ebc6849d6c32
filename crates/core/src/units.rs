//! Fixed texture unit assignments for composite programs.
//!
//! Every composite program samples the color targets, the scene depth
//! buffers and the noise texture from these units. Backends bind sampler
//! uniforms to them once at link time using [`SAMPLER_UNITS`].

use crate::ping_pong::{TargetIndex, MAX_RENDER_TARGETS};

/// Units `colortex0..colortex7`, indexed by slot.
pub const COLOR_TEX: [u32; MAX_RENDER_TARGETS] = [0, 1, 2, 3, 4, 5, 6, 7];

/// Full scene depth.
pub const DEPTH_TEX_0: u32 = 8;
/// Scene depth before translucent geometry.
pub const DEPTH_TEX_1: u32 = 9;
/// Scene depth without the hand.
pub const DEPTH_TEX_2: u32 = 10;
/// Built-in noise texture.
pub const NOISE_TEX: u32 = 11;

/// Unit the host expects its own color texture on once composite is done.
pub const DEFAULT_COLOR: u32 = COLOR_TEX[0];
/// Unit the host expects its own depth texture on once composite is done.
pub const DEFAULT_DEPTH: u32 = DEPTH_TEX_0;

/// Units cleared when a pipeline is torn down.
pub const UNITS_CLEARED_ON_TEARDOWN: u32 = 16;

/// Sampler uniform names and the unit each one reads from.
///
/// Includes the legacy G-buffer aliases still used by many packs.
pub const SAMPLER_UNITS: &[(&str, u32)] = &[
    ("colortex0", COLOR_TEX[0]),
    ("colortex1", COLOR_TEX[1]),
    ("colortex2", COLOR_TEX[2]),
    ("colortex3", COLOR_TEX[3]),
    ("colortex4", COLOR_TEX[4]),
    ("colortex5", COLOR_TEX[5]),
    ("colortex6", COLOR_TEX[6]),
    ("colortex7", COLOR_TEX[7]),
    ("gcolor", COLOR_TEX[0]),
    ("gdepth", COLOR_TEX[1]),
    ("gnormal", COLOR_TEX[2]),
    ("composite", COLOR_TEX[3]),
    ("gaux1", COLOR_TEX[4]),
    ("gaux2", COLOR_TEX[5]),
    ("gaux3", COLOR_TEX[6]),
    ("gaux4", COLOR_TEX[7]),
    ("depthtex0", DEPTH_TEX_0),
    ("gdepthtex", DEPTH_TEX_0),
    ("depthtex1", DEPTH_TEX_1),
    ("depthtex2", DEPTH_TEX_2),
    ("noisetex", NOISE_TEX),
];

/// The unit a color slot is sampled from.
pub fn color_unit(slot: TargetIndex) -> u32 {
    COLOR_TEX[slot.get()]
}
