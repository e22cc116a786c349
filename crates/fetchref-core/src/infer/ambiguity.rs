//! Module-versus-directory tie-break for paths without a recognized extension.
//!
//! The probe makes classification depend on the filesystem at resolution
//! time. Callers that need a hermetic answer set a [`ModuleOrDirPolicy`] other
//! than [`ModuleOrDirPolicy::Probe`], or pass `#format=dir` / `#format=mod`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{RefError, Result};
use crate::format::Format;
use crate::module_ref::ModuleCoordinate;

/// How to classify a path that parses as a module coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleOrDirPolicy {
    /// A directory at the path wins, otherwise it is a module.
    #[default]
    Probe,
    /// Always a directory.
    Dir,
    /// A module whenever the path parses as one.
    Module,
}

/// Filesystem queries needed during inference.
pub trait FsProbe: fmt::Debug + Send + Sync {
    /// Whether a directory exists at `path`. Errors count as "no".
    fn is_dir(&self, path: &Path) -> bool;
}

/// [`FsProbe`] backed by the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl FsProbe for OsFs {
    fn is_dir(&self, path: &Path) -> bool {
        // Follows symlinks on purpose: a link to a directory is a directory.
        std::fs::metadata(path)
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false)
    }
}

/// A probe plus the directory relative paths are resolved against.
#[derive(Debug, Clone)]
pub struct FsContext {
    probe: Arc<dyn FsProbe>,
    working_dir: Option<PathBuf>,
}

impl Default for FsContext {
    fn default() -> Self {
        Self::new(Arc::new(OsFs), None)
    }
}

impl FsContext {
    pub fn new(probe: Arc<dyn FsProbe>, working_dir: Option<PathBuf>) -> Self {
        Self { probe, working_dir }
    }

    /// Whether `path` names an existing directory.
    pub fn is_dir(&self, path: &str) -> bool {
        let path = Path::new(path);
        match &self.working_dir {
            Some(dir) if path.is_relative() => self.probe.is_dir(&dir.join(path)),
            _ => self.probe.is_dir(path),
        }
    }
}

/// Decide between [`Format::Mod`] and [`Format::Dir`].
pub fn assume_module_or_dir(
    path: &str,
    policy: ModuleOrDirPolicy,
    fs: &FsContext,
) -> Result<Format> {
    if path.is_empty() {
        return Err(RefError::AmbiguousEmptyPath);
    }
    if ModuleCoordinate::parse(path).is_err() {
        return Ok(Format::Dir);
    }

    let format = match policy {
        ModuleOrDirPolicy::Dir => Format::Dir,
        ModuleOrDirPolicy::Module => Format::Mod,
        ModuleOrDirPolicy::Probe if fs.is_dir(path) => Format::Dir,
        ModuleOrDirPolicy::Probe => Format::Mod,
    };
    tracing::debug!(path, %format, ?policy, "classified path parseable as a module");
    Ok(format)
}
