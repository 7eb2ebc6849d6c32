#![deny(unsafe_code)]
//! On-disk shader packs for the composite pipeline.
//!
//! This crate sits between `composite-core` (which defines the
//! `PackSource` seam) and its hosts. A pack is a directory holding a
//! `shaders/` folder with `pack.json` and the GLSL stages it references;
//! a directory that is itself the shaders folder is accepted too.

pub mod config;
pub mod manifest;

use composite_core::{PackError, PackSource, ShaderPack};
use config::PackConfig;
use manifest::PackManifest;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the manifest inside a shaders directory.
pub const MANIFEST_FILE_NAME: &str = "pack.json";

/// Name of the shaders directory inside a pack root.
pub const SHADERS_DIR_NAME: &str = "shaders";

/// The shaders directory of the pack at `root`: `root/shaders` if it holds
/// a manifest, otherwise `root` itself if it does.
pub fn shaders_dir(root: &Path) -> Option<PathBuf> {
    let nested = root.join(SHADERS_DIR_NAME);
    if nested.join(MANIFEST_FILE_NAME).is_file() {
        Some(nested)
    } else if root.join(MANIFEST_FILE_NAME).is_file() {
        Some(root.to_path_buf())
    } else {
        None
    }
}

/// Loads the pack rooted at `root`, named after its directory.
///
/// # Errors
///
/// `NotFound` if `root` is not a directory, `Manifest` if it has no
/// manifest or the manifest is invalid, `Io` for unreadable files.
pub fn load_pack_dir(root: &Path) -> Result<ShaderPack, PackError> {
    if !root.is_dir() {
        return Err(PackError::NotFound(root.display().to_string()));
    }
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());

    let shaders = shaders_dir(root).ok_or_else(|| PackError::Manifest {
        path: root.join(SHADERS_DIR_NAME).join(MANIFEST_FILE_NAME).display().to_string(),
        message: "no manifest found".to_string(),
    })?;
    let manifest_path = shaders.join(MANIFEST_FILE_NAME);
    let text = fs::read_to_string(&manifest_path).map_err(|e| PackError::Io {
        path: manifest_path.display().to_string(),
        message: e.to_string(),
    })?;

    let pack = PackManifest::parse(&text, &manifest_path)?.resolve(&name, &shaders)?;
    log::debug!(
        "loaded shader pack '{name}' from {}: {} composite entries, {} scene overrides",
        shaders.display(),
        pack.programs.composite.len(),
        pack.scene_overrides.len()
    );
    Ok(pack)
}

/// Resolves the pack named in a [`PackConfig`] file.
///
/// The file is re-read on every [`PackSource::load`], so editing it and
/// reloading switches packs.
#[derive(Debug, Clone)]
pub struct DirectoryPackLoader {
    config_path: PathBuf,
    current: Option<String>,
}

impl DirectoryPackLoader {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            current: None,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Name of the external pack loaded last, if any.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl PackSource for DirectoryPackLoader {
    fn load(&mut self) -> Result<ShaderPack, PackError> {
        let config = PackConfig::load(&self.config_path);
        let Some(name) = config.selected_pack() else {
            log::info!("shader packs disabled, using the internal pack");
            self.current = None;
            return Ok(self.load_internal());
        };

        let root = config.shaderpacks_dir_for(&self.config_path).join(name);
        let pack = load_pack_dir(&root)?;
        self.current = Some(name.to_string());
        Ok(pack)
    }

    /// Forgets the current pack. Directory packs are read fully in `load`
    /// and keep no file handle open, so there is nothing to close and this
    /// never fails.
    fn release(&mut self) -> Result<(), PackError> {
        if let Some(name) = self.current.take() {
            log::debug!("released shader pack '{name}'");
        }
        Ok(())
    }
}
