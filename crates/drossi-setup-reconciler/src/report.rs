use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::AppLayout;

const RECONCILE_REPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackupStatus {
    Created,
    SkippedMissingSource,
    SkippedDestinationExists,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupEntry {
    pub executable: String,
    pub destination: Option<String>,
    pub status: BackupStatus,
}

/// Record of what one post-install reconciliation did, persisted under the
/// freshly provisioned logs directory so support can see what the installer
/// decided on a given machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileReport {
    pub version: u32,
    pub app_root: String,
    pub previous_install_found: bool,
    pub previous_install_location: Option<String>,
    pub runtime_dirs: Vec<String>,
    pub backups: Vec<BackupEntry>,
    pub warnings: Vec<String>,
}

impl ReconcileReport {
    pub(crate) fn new(app_root: String) -> Self {
        Self {
            version: RECONCILE_REPORT_VERSION,
            app_root,
            previous_install_found: false,
            previous_install_location: None,
            runtime_dirs: Vec::new(),
            backups: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

pub fn write_reconcile_report(layout: &AppLayout, report: &ReconcileReport) -> Result<PathBuf> {
    let path = layout.reconcile_report_path();
    let content = serde_json::to_string_pretty(report)
        .with_context(|| format!("failed serializing reconcile report {}", path.display()))?;
    fs::write(&path, content)
        .with_context(|| format!("failed writing reconcile report {}", path.display()))?;
    Ok(path)
}

pub fn read_reconcile_report(layout: &AppLayout) -> Result<Option<ReconcileReport>> {
    let path = layout.reconcile_report_path();
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read reconcile report: {}", path.display()));
        }
    };

    let report = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse reconcile report: {}", path.display()))?;
    Ok(Some(report))
}
