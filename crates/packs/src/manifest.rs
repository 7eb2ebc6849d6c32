//! The pack manifest, `pack.json`, and its resolution into a [`ShaderPack`].
//!
//! Shader stages are referenced by file name relative to the shaders
//! directory. An entry without `vertex`/`fragment` uses `<name>.vsh` and
//! `<name>.fsh`. A referenced file that does not exist leaves that stage
//! absent, which drops the program from its pass chain.

use composite_core::pack::{PackDirectives, ProgramDirectives, ProgramSet, ProgramSource};
use composite_core::texture::ColorFormat;
use composite_core::{PackError, SceneKey, ShaderPack};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

fn default_draw_buffers() -> Vec<usize> {
    ProgramDirectives::default().draw_buffers
}

fn default_viewport_scale() -> f32 {
    ProgramDirectives::default().viewport_scale
}

/// One program entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramEntry {
    pub name: String,
    #[serde(default)]
    pub vertex: Option<String>,
    #[serde(default)]
    pub fragment: Option<String>,
    #[serde(default = "default_draw_buffers")]
    pub draw_buffers: Vec<usize>,
    #[serde(default = "default_viewport_scale")]
    pub viewport_scale: f32,
}

/// Programs of one scene. Same shape as the top level.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgramSetEntry {
    /// `null` entries keep their position but contribute no pass.
    pub composite: Vec<Option<ProgramEntry>>,
    #[serde(rename = "final")]
    pub final_pass: Option<ProgramEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackManifest {
    pub buffers_to_clear: Option<Vec<usize>>,
    pub formats: BTreeMap<usize, ColorFormat>,
    pub noise_texture_resolution: Option<u32>,
    pub composite: Vec<Option<ProgramEntry>>,
    #[serde(rename = "final")]
    pub final_pass: Option<ProgramEntry>,
    /// Per-scene overrides keyed by scene name (`overworld`, `nether`, `end`).
    pub scenes: BTreeMap<String, ProgramSetEntry>,
}

impl PackManifest {
    /// Parses a manifest. `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, PackError> {
        serde_json::from_str(text).map_err(|e| PackError::Manifest {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn directives(&self) -> PackDirectives {
        let defaults = PackDirectives::default();
        PackDirectives {
            buffers_to_clear: self
                .buffers_to_clear
                .clone()
                .unwrap_or(defaults.buffers_to_clear),
            formats: self.formats.clone(),
            noise_texture_resolution: self
                .noise_texture_resolution
                .unwrap_or(defaults.noise_texture_resolution),
        }
    }

    /// Reads every referenced stage from `shaders_dir` and assembles the pack.
    ///
    /// # Errors
    ///
    /// Returns `PackError::Manifest` for an unknown scene name and
    /// `PackError::Io` if a shader file exists but cannot be read.
    pub fn resolve(&self, name: &str, shaders_dir: &Path) -> Result<ShaderPack, PackError> {
        let programs = resolve_set(&self.composite, self.final_pass.as_ref(), shaders_dir)?;

        let mut scene_overrides = BTreeMap::new();
        for (scene, entry) in &self.scenes {
            let key = SceneKey::from_name(scene).ok_or_else(|| PackError::Manifest {
                path: shaders_dir.display().to_string(),
                message: format!("unknown scene '{scene}'"),
            })?;
            let set = resolve_set(&entry.composite, entry.final_pass.as_ref(), shaders_dir)?;
            scene_overrides.insert(key, set);
        }

        Ok(ShaderPack {
            name: name.to_string(),
            directives: self.directives(),
            programs,
            scene_overrides,
        })
    }
}

fn resolve_set(
    composite: &[Option<ProgramEntry>],
    final_pass: Option<&ProgramEntry>,
    shaders_dir: &Path,
) -> Result<ProgramSet, PackError> {
    let composite = composite
        .iter()
        .map(|entry| {
            entry
                .as_ref()
                .map(|e| resolve_program(e, shaders_dir))
                .transpose()
        })
        .collect::<Result<Vec<_>, _>>()?;
    let final_pass = final_pass
        .map(|e| resolve_program(e, shaders_dir))
        .transpose()?;
    Ok(ProgramSet {
        composite,
        final_pass,
    })
}

fn resolve_program(entry: &ProgramEntry, shaders_dir: &Path) -> Result<ProgramSource, PackError> {
    let vertex_file = entry
        .vertex
        .clone()
        .unwrap_or_else(|| format!("{}.vsh", entry.name));
    let fragment_file = entry
        .fragment
        .clone()
        .unwrap_or_else(|| format!("{}.fsh", entry.name));

    Ok(ProgramSource {
        name: entry.name.clone(),
        vertex: read_stage(&shaders_dir.join(vertex_file))?,
        fragment: read_stage(&shaders_dir.join(fragment_file))?,
        directives: ProgramDirectives {
            draw_buffers: entry.draw_buffers.clone(),
            viewport_scale: entry.viewport_scale,
        },
    })
}

/// Shader source at `path`, or `None` if there is no such file.
fn read_stage(path: &Path) -> Result<Option<String>, PackError> {
    match fs::read_to_string(path) {
        Ok(source) => Ok(Some(source)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("shader stage {} not present", path.display());
            Ok(None)
        }
        Err(e) => Err(PackError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}
