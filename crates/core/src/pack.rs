//! Shader pack data consumed by the pipeline.
//!
//! A [`ShaderPack`] is the already-parsed form of a pack: program sources
//! with their directives, grouped per [`SceneKey`], plus pack-wide
//! directives. Resolving a pack from disk is the job of a [`PackSource`];
//! the `composite-packs` crate provides the directory implementation.

use crate::error::PackError;
use crate::fullscreen::{FULLSCREEN_VERTEX_SHADER, PASSTHROUGH_FRAGMENT_SHADER};
use crate::noise::DEFAULT_NOISE_RESOLUTION;
use crate::ping_pong::MAX_RENDER_TARGETS;
use crate::texture::ColorFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name reported by the built-in pack.
pub const INTERNAL_PACK_NAME: &str = "(internal)";

/// Scene context that selects a program set. A change forces a rebuild.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SceneKey {
    #[default]
    Overworld,
    Nether,
    End,
}

impl SceneKey {
    pub const ALL: [SceneKey; 3] = [SceneKey::Overworld, SceneKey::Nether, SceneKey::End];

    pub fn name(self) -> &'static str {
        match self {
            SceneKey::Overworld => "overworld",
            SceneKey::Nether => "nether",
            SceneKey::End => "end",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }
}

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-program directives: which slots it writes and at what resolution.
///
/// Indices are raw here; they are validated when the pass chain is planned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramDirectives {
    /// Slots written, in shader output-location order.
    pub draw_buffers: Vec<usize>,
    /// Fraction of the host output size rendered by this pass.
    pub viewport_scale: f32,
}

impl Default for ProgramDirectives {
    fn default() -> Self {
        Self {
            draw_buffers: vec![0],
            viewport_scale: 1.0,
        }
    }
}

/// One program as provided by the pack. Either stage may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramSource {
    pub name: String,
    pub vertex: Option<String>,
    pub fragment: Option<String>,
    pub directives: ProgramDirectives,
}

impl ProgramSource {
    pub fn new(
        name: impl Into<String>,
        vertex: impl Into<String>,
        fragment: impl Into<String>,
        directives: ProgramDirectives,
    ) -> Self {
        Self {
            name: name.into(),
            vertex: Some(vertex.into()),
            fragment: Some(fragment.into()),
            directives,
        }
    }

    /// Both stages present.
    pub fn is_valid(&self) -> bool {
        self.vertex.is_some() && self.fragment.is_some()
    }

    /// The two stage sources, if valid.
    pub fn stages(&self) -> Option<(&str, &str)> {
        Some((self.vertex.as_deref()?, self.fragment.as_deref()?))
    }
}

/// The composite programs of one scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramSet {
    /// `composite`, `composite1`, ... in order. `None` entries are
    /// slots the pack left empty.
    pub composite: Vec<Option<ProgramSource>>,
    pub final_pass: Option<ProgramSource>,
}

impl ProgramSet {
    /// Every valid composite program in order, then the final program.
    pub fn ordered_programs(&self) -> Vec<&ProgramSource> {
        let mut programs = Vec::with_capacity(self.composite.len() + 1);
        for source in self.composite.iter().flatten().chain(&self.final_pass) {
            if source.is_valid() {
                programs.push(source);
            } else {
                log::debug!("skipping program '{}': missing shader stage", source.name);
            }
        }
        programs
    }
}

/// Pack-wide directives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackDirectives {
    /// Slots cleared at the start of every frame.
    pub buffers_to_clear: Vec<usize>,
    /// Color format overrides by slot.
    pub formats: BTreeMap<usize, ColorFormat>,
    pub noise_texture_resolution: u32,
}

impl Default for PackDirectives {
    fn default() -> Self {
        Self {
            buffers_to_clear: (0..MAX_RENDER_TARGETS).collect(),
            formats: BTreeMap::new(),
            noise_texture_resolution: DEFAULT_NOISE_RESOLUTION,
        }
    }
}

/// A resolved shader pack.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderPack {
    pub name: String,
    pub directives: PackDirectives,
    /// Programs used when no scene override exists.
    pub programs: ProgramSet,
    pub scene_overrides: BTreeMap<SceneKey, ProgramSet>,
}

impl ShaderPack {
    /// The program set for `key`, falling back to the default set.
    pub fn program_set(&self, key: SceneKey) -> &ProgramSet {
        self.scene_overrides.get(&key).unwrap_or(&self.programs)
    }

    /// The built-in pack: no composite programs and a final pass that
    /// presents colortex0.
    pub fn internal() -> Self {
        Self {
            name: INTERNAL_PACK_NAME.to_string(),
            directives: PackDirectives::default(),
            programs: ProgramSet {
                composite: Vec::new(),
                final_pass: Some(ProgramSource::new(
                    "final",
                    FULLSCREEN_VERTEX_SHADER,
                    PASSTHROUGH_FRAGMENT_SHADER,
                    ProgramDirectives::default(),
                )),
            },
            scene_overrides: BTreeMap::new(),
        }
    }

    pub fn is_internal(&self) -> bool {
        self.name == INTERNAL_PACK_NAME
    }
}

/// Resolves the active shader pack.
pub trait PackSource {
    /// Resolves the configured pack. Called at startup and on every reload.
    fn load(&mut self) -> Result<ShaderPack, PackError>;

    /// The pack used when [`PackSource::load`] fails or a build with the
    /// loaded pack fails.
    fn load_internal(&self) -> ShaderPack {
        ShaderPack::internal()
    }

    /// Releases any handle held for the last loaded pack. Failures are
    /// reported but never block a reload.
    fn release(&mut self) -> Result<(), PackError> {
        Ok(())
    }
}

/// A [`PackSource`] that always yields the same in-memory pack.
#[derive(Debug, Clone)]
pub struct StaticPackSource {
    pack: ShaderPack,
}

impl StaticPackSource {
    pub fn new(pack: ShaderPack) -> Self {
        Self { pack }
    }
}

impl PackSource for StaticPackSource {
    fn load(&mut self) -> Result<ShaderPack, PackError> {
        Ok(self.pack.clone())
    }
}
