//! Per-case working directories.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::EngineError;

/// Name of the configuration file inside a workspace.
pub const CONFIG_FILE: &str = "main.tf";

/// Root directory owning every workspace of one case.
///
/// Removed on drop unless [`keep`](WorkRoot::keep) was requested.
#[derive(Debug)]
pub struct WorkRoot {
    dir: Option<TempDir>,
    path: PathBuf,
    keep: bool,
}

impl WorkRoot {
    /// Create a fresh root under the system temporary directory.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be created.
    pub fn create(case: &str, keep: bool) -> Result<Self, EngineError> {
        let prefix = format!("otc-acc-{}-", sanitize(case));
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir()
            .map_err(|e| EngineError::io(std::env::temp_dir(), e))?;
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "created case work root");
        Ok(Self {
            dir: Some(dir),
            path,
            keep,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create (or reuse) a named workspace below the root.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be created.
    pub fn workspace(
        &self,
        name: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<Workspace, EngineError> {
        let dir = self.path.join(name);
        std::fs::create_dir_all(&dir).map_err(|e| EngineError::io(&dir, e))?;
        Ok(Workspace {
            dir,
            env: env.clone(),
        })
    }
}

impl Drop for WorkRoot {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if self.keep {
                let path = dir.keep();
                info!(path = %path.display(), "keeping case work directory");
            }
        }
    }
}

/// One engine working directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
    env: BTreeMap<String, String>,
}

impl Workspace {
    /// A workspace over an existing directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            env: BTreeMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Extra environment for engine processes run in this workspace.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Replace the configuration document.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub fn write_config(&self, document: &str) -> Result<(), EngineError> {
        let path = self.config_path();
        std::fs::write(&path, document).map_err(|e| EngineError::io(&path, e))
    }

    /// The current configuration document, if one was written.
    ///
    /// # Errors
    ///
    /// Fails on read errors other than "file missing".
    pub fn read_config(&self) -> Result<Option<String>, EngineError> {
        let path = self.config_path();
        match std::fs::read_to_string(&path) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EngineError::io(&path, e)),
        }
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}
