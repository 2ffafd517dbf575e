use std::path::Path;

/// Derives the version-tagged name a prior executable is backed up under:
/// `App_v2.0.exe` becomes `App_v2.0_backup.exe`. Names without an extension
/// get the `_backup` suffix appended directly.
pub fn backup_file_name(executable: &str) -> String {
    let path = Path::new(executable);
    let stem = path
        .file_stem()
        .and_then(|v| v.to_str())
        .unwrap_or(executable);
    match path.extension().and_then(|v| v.to_str()) {
        Some(extension) => format!("{stem}_backup.{extension}"),
        None => format!("{stem}_backup"),
    }
}
