use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use drossi_setup_core::{backup_file_name, ProductManifest};

use crate::checksum::file_sha256_hex;
use crate::fs_utils::copy_file_if_absent;
use crate::report::{write_reconcile_report, BackupEntry, BackupStatus, ReconcileReport};
use crate::{AppLayout, Detection};

/// Post-install reconciliation. Runs once, after the host installer has
/// finished copying files:
///
/// 1. If a previous install was detected, back up each known prior executable
///    found at the recorded location into `backup/` under a version-tagged
///    name. Backups are best-effort: a failed or skipped copy becomes a
///    report entry, never an abort.
/// 2. Provision the runtime directory set (`outputs`, `logs`, `temp`)
///    idempotently. A failure here is fatal to the install.
///
/// The report is persisted under `logs/` once the directories exist; failing
/// to write it is itself only a warning.
pub fn reconcile_post_install(
    layout: &AppLayout,
    detection: &Detection,
    manifest: &ProductManifest,
) -> Result<ReconcileReport> {
    let mut report = ReconcileReport::new(layout.root().display().to_string());
    report.previous_install_found = detection.found;
    report.previous_install_location = detection
        .install_location
        .as_ref()
        .map(|path| path.display().to_string());

    if detection.found {
        let source_root = detection
            .install_location
            .as_ref()
            .context("detection marked found but carries no install location")?;

        let backup_dir = layout.backup_dir();
        fs::create_dir_all(&backup_dir)
            .with_context(|| format!("failed to create {}", backup_dir.display()))?;

        for executable in &manifest.previous_executables {
            let entry = back_up_executable(layout, source_root, executable, &mut report.warnings);
            report.backups.push(entry);
        }
    }

    layout.ensure_runtime_dirs()?;
    report.runtime_dirs = layout
        .runtime_dirs()
        .iter()
        .map(|dir| dir.display().to_string())
        .collect();

    if let Err(err) = write_reconcile_report(layout, &report) {
        report
            .warnings
            .push(format!("failed to persist reconcile report: {err:#}"));
    }

    Ok(report)
}

fn back_up_executable(
    layout: &AppLayout,
    source_root: &std::path::Path,
    executable: &str,
    warnings: &mut Vec<String>,
) -> BackupEntry {
    let source = source_root.join(executable);
    if !source.is_file() {
        return BackupEntry {
            executable: executable.to_string(),
            destination: None,
            status: BackupStatus::SkippedMissingSource,
        };
    }

    let destination = layout.backup_path(&backup_file_name(executable));
    match copy_file_if_absent(&source, &destination) {
        Ok(true) => {
            if let Err(err) = verify_backup_copy(&source, &destination) {
                warnings.push(format!(
                    "backup verification failed for {}: {err:#}",
                    destination.display()
                ));
            }
            BackupEntry {
                executable: executable.to_string(),
                destination: Some(destination.display().to_string()),
                status: BackupStatus::Created,
            }
        }
        Ok(false) => BackupEntry {
            executable: executable.to_string(),
            destination: Some(destination.display().to_string()),
            status: BackupStatus::SkippedDestinationExists,
        },
        Err(err) => {
            warnings.push(format!(
                "failed to back up {} to {}: {err}",
                source.display(),
                destination.display()
            ));
            BackupEntry {
                executable: executable.to_string(),
                destination: Some(destination.display().to_string()),
                status: BackupStatus::Failed,
            }
        }
    }
}

fn verify_backup_copy(source: &std::path::Path, destination: &std::path::Path) -> Result<()> {
    let source_digest = file_sha256_hex(source)?;
    let destination_digest = file_sha256_hex(destination)?;
    if source_digest != destination_digest {
        return Err(anyhow::anyhow!(
            "digest mismatch: source {source_digest} destination {destination_digest}"
        ));
    }
    Ok(())
}

/// Application-start provisioning: the working tree the product expects under
/// the user's app directory. Unlike the post-install trio this includes
/// `inputs`, where users drop the spreadsheets to process.
pub fn provision_workspace(layout: &AppLayout) -> Result<Vec<PathBuf>> {
    let dirs = vec![layout.inputs_dir(), layout.outputs_dir(), layout.logs_dir()];
    for dir in &dirs {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    Ok(dirs)
}
