use std::collections::HashSet;

use anyhow::{anyhow, Context};
use semver::Version;
use serde::{Deserialize, Serialize};

/// Identity of the product a setup run operates on. The `app_id` is the fixed
/// identifier the installed-program registry is keyed by, and
/// `previous_executables` names the binaries earlier releases shipped under,
/// which the post-install step backs up when an earlier install is detected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductManifest {
    pub name: String,
    pub display_name: String,
    pub app_id: String,
    pub version: Version,
    #[serde(default)]
    pub previous_executables: Vec<String>,
}

impl ProductManifest {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let manifest: Self = toml::from_str(input).context("failed to parse setup manifest")?;
        if manifest.name.trim().is_empty() {
            return Err(anyhow!("manifest name must not be empty"));
        }
        validate_app_id(&manifest.app_id)?;

        let mut seen = HashSet::new();
        for executable in &manifest.previous_executables {
            validate_executable_name(executable)?;
            if !seen.insert(executable.as_str()) {
                return Err(anyhow!(
                    "duplicate previous executable declaration '{}'",
                    executable
                ));
            }
        }
        Ok(manifest)
    }

    /// The product definition the shipped installer is built with. Standalone
    /// setup runs fall back to this when no manifest file is given.
    pub fn builtin() -> Self {
        Self {
            name: "cadastro-drossi".to_string(),
            display_name: "Cadastro Automático D'Rossi".to_string(),
            app_id: "{B8F4C2A0-51D3-4E7B-9A16-0C8D2E5F7A31}".to_string(),
            version: Version::new(2, 1, 0),
            previous_executables: vec!["Cadastro_DRossi_v2.0.exe".to_string()],
        }
    }
}

fn validate_app_id(app_id: &str) -> anyhow::Result<()> {
    let trimmed = app_id.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("manifest app_id must not be empty"));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(anyhow!("manifest app_id must not contain whitespace: {app_id}"));
    }
    Ok(())
}

fn validate_executable_name(name: &str) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow!("previous executable name must not be empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(anyhow!(
            "previous executable name must be a bare file name: {name}"
        ));
    }
    Ok(())
}
