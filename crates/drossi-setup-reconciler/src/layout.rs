use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Path model for an installed application root. All reconciliation steps
/// derive their targets from here rather than joining paths ad hoc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLayout {
    root: PathBuf,
}

impl AppLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join("backup")
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join("outputs")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join("temp")
    }

    pub fn inputs_dir(&self) -> PathBuf {
        self.root.join("inputs")
    }

    pub fn backup_path(&self, file_name: &str) -> PathBuf {
        self.backup_dir().join(file_name)
    }

    pub fn reconcile_report_path(&self) -> PathBuf {
        self.logs_dir().join("setup-reconcile.json")
    }

    /// The directory set every install must end up with, regardless of
    /// whether a previous version was found.
    pub fn runtime_dirs(&self) -> [PathBuf; 3] {
        [self.outputs_dir(), self.logs_dir(), self.temp_dir()]
    }

    pub fn ensure_runtime_dirs(&self) -> Result<()> {
        for dir in self.runtime_dirs() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Default per-user application root, used when the host installer does not
/// hand one in. The original application keeps its working tree under the
/// user's documents folder.
pub fn default_app_root() -> Result<PathBuf> {
    if cfg!(windows) {
        let profile = std::env::var("USERPROFILE")
            .context("USERPROFILE is not set; cannot resolve Windows app root")?;
        return Ok(PathBuf::from(profile)
            .join("Documents")
            .join("CadastroDRossi"));
    }

    let home = std::env::var("HOME").context("HOME is not set; cannot resolve app root")?;
    Ok(PathBuf::from(home).join(".cadastro-drossi"))
}
