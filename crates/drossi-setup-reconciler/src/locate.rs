use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// What the installed-program registry recorded about an earlier install.
/// Read-only; valid for a single setup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRecord {
    pub app_id: String,
    pub install_location: PathBuf,
}

/// Immutable detection result threaded from the detection step into
/// post-install reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub found: bool,
    pub install_location: Option<PathBuf>,
}

impl Detection {
    pub fn not_found() -> Self {
        Self {
            found: false,
            install_location: None,
        }
    }

    pub fn from_record(record: InstallRecord) -> Self {
        Self {
            found: true,
            install_location: Some(record.install_location),
        }
    }
}

/// Looks up a previously installed version of the product. A missing entry is
/// the `Ok(None)` branch, never an error; only a broken lookup channel fails.
pub trait PreviousInstallLocator {
    fn locate(&self, app_id: &str) -> Result<Option<InstallRecord>>;
}

/// Locator backed by a plain `key=value` record file. This is the lookup
/// channel on hosts without an installed-program registry, and the one the
/// tests drive.
#[derive(Debug, Clone)]
pub struct RecordFileLocator {
    path: PathBuf,
}

impl RecordFileLocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreviousInstallLocator for RecordFileLocator {
    fn locate(&self, app_id: &str) -> Result<Option<InstallRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read install record file: {}", self.path.display())
                });
            }
        };

        let record = parse_install_record(&raw)
            .with_context(|| format!("failed to parse install record file: {}", self.path.display()))?;
        if record.app_id != app_id {
            return Ok(None);
        }
        Ok(Some(record))
    }
}

pub fn parse_install_record(raw: &str) -> Result<InstallRecord> {
    let mut app_id = None;
    let mut install_location = None;

    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        match k {
            "app_id" => app_id = Some(v.to_string()),
            "install_location" => install_location = Some(PathBuf::from(v)),
            _ => {}
        }
    }

    Ok(InstallRecord {
        app_id: app_id.context("missing app_id")?,
        install_location: install_location.context("missing install_location")?,
    })
}

/// Locator backed by the Windows uninstall registry. The entry an Inno Setup
/// installer registers lives under the product id with an `_is1` suffix; the
/// lookup shells out to `reg query` so no registry bindings are needed.
#[cfg(windows)]
#[derive(Debug, Clone, Default)]
pub struct RegistryLocator;

#[cfg(windows)]
impl RegistryLocator {
    pub fn new() -> Self {
        Self
    }

    fn uninstall_key_paths(app_id: &str) -> [String; 2] {
        [
            format!(
                "HKLM\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\{app_id}_is1"
            ),
            format!(
                "HKLM\\SOFTWARE\\WOW6432Node\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\{app_id}_is1"
            ),
        ]
    }
}

#[cfg(windows)]
impl PreviousInstallLocator for RegistryLocator {
    fn locate(&self, app_id: &str) -> Result<Option<InstallRecord>> {
        use std::process::Command;

        for key_path in Self::uninstall_key_paths(app_id) {
            let output = Command::new("reg")
                .arg("query")
                .arg(&key_path)
                .arg("/v")
                .arg("InstallLocation")
                .output()
                .context("failed to run reg query")?;
            if !output.status.success() {
                // Absent key: reg exits non-zero. Try the next hive view.
                continue;
            }

            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some(location) = parse_reg_query_value(&stdout, "InstallLocation") {
                return Ok(Some(InstallRecord {
                    app_id: app_id.to_string(),
                    install_location: PathBuf::from(location),
                }));
            }
        }

        Ok(None)
    }
}

/// Pulls a named `REG_SZ` value out of `reg query` output. Kept free of any
/// Windows dependency so the parse is covered on every host.
pub(crate) fn parse_reg_query_value(output: &str, value_name: &str) -> Option<String> {
    for line in output.lines() {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix(value_name) else {
            continue;
        };
        let Some((reg_type, value)) = rest.trim_start().split_once(char::is_whitespace) else {
            continue;
        };
        if !reg_type.starts_with("REG_") {
            continue;
        }
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        return Some(value.to_string());
    }
    None
}
