//! The pack selection file.
//!
//! A small JSON document naming the active shader pack and the directory
//! packs live in:
//!
//! ```json
//! { "shader_pack": "vivid", "shaderpacks_dir": "shaderpacks" }
//! ```
//!
//! `null` or `"(internal)"` selects the built-in pack.

use composite_core::pack::INTERNAL_PACK_NAME;
use composite_core::PackError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default location of the selection file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "composite.json";

/// Default pack directory, relative to the selection file.
pub const DEFAULT_SHADERPACKS_DIR: &str = "shaderpacks";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    pub shader_pack: Option<String>,
    pub shaderpacks_dir: PathBuf,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            shader_pack: None,
            shaderpacks_dir: PathBuf::from(DEFAULT_SHADERPACKS_DIR),
        }
    }
}

impl PackConfig {
    /// The external pack to load, or `None` for the internal pack.
    pub fn selected_pack(&self) -> Option<&str> {
        match self.shader_pack.as_deref() {
            None | Some(INTERNAL_PACK_NAME) => None,
            Some(name) if name.trim().is_empty() => None,
            Some(name) => Some(name),
        }
    }

    /// `shaderpacks_dir` resolved against the directory holding `config_path`.
    pub fn shaderpacks_dir_for(&self, config_path: &Path) -> PathBuf {
        if self.shaderpacks_dir.is_absolute() {
            return self.shaderpacks_dir.clone();
        }
        match config_path.parent() {
            Some(parent) => parent.join(&self.shaderpacks_dir),
            None => self.shaderpacks_dir.clone(),
        }
    }

    /// Reads `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>, PackError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PackError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| PackError::Manifest {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }

    /// Reads `path`, never failing.
    ///
    /// A missing file is created with the defaults. An unreadable or
    /// invalid file is reported and the defaults are used in its place.
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                let config = Self::default();
                if let Err(e) = config.save(path) {
                    log::warn!("could not write default pack config: {e}");
                }
                config
            }
            Err(e) => {
                log::error!("failed to load pack config, using defaults: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PackError> {
        let io_err = |e: std::io::Error| PackError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| PackError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, json + "\n").map_err(io_err)
    }
}
