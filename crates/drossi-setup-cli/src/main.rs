use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use drossi_setup_core::ProductManifest;
use drossi_setup_reconciler::{
    default_app_root, provision_workspace, reconcile_post_install, AppLayout, BackupStatus,
    Detection, PreviousInstallLocator, RecordFileLocator,
};

mod render;

#[derive(Parser, Debug)]
#[command(name = "drossi-setup")]
#[command(about = "Setup and update reconciler for the Cadastro D'Rossi desktop application", long_about = None)]
struct Cli {
    /// Product manifest to use instead of the built-in product definition.
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up a previously installed version of the product.
    Detect {
        #[arg(long)]
        record_file: Option<PathBuf>,
    },
    /// Run the post-install reconciliation step against an install root.
    PostInstall {
        #[arg(long)]
        app_root: PathBuf,
        #[arg(long)]
        record_file: Option<PathBuf>,
    },
    /// Provision the application working tree (inputs, outputs, logs).
    Provision {
        #[arg(long)]
        app_root: Option<PathBuf>,
    },
    /// Print the resolved layout for an install root.
    Doctor {
        #[arg(long)]
        app_root: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let manifest = load_manifest(cli.manifest.as_deref())?;

    match cli.command {
        Commands::Detect { record_file } => {
            let detection = detect_previous_install(&manifest, record_file.as_deref())?;
            match &detection.install_location {
                Some(location) => {
                    render::status("found", &format!("previous install at {}", location.display()));
                }
                None => render::status("not-found", "no previous install recorded"),
            }
        }
        Commands::PostInstall {
            app_root,
            record_file,
        } => {
            let detection = detect_previous_install(&manifest, record_file.as_deref())?;
            let layout = AppLayout::new(app_root);
            let report = reconcile_post_install(&layout, &detection, &manifest)?;

            for backup in &report.backups {
                match backup.status {
                    BackupStatus::Created => render::status(
                        "backed-up",
                        backup.destination.as_deref().unwrap_or(&backup.executable),
                    ),
                    BackupStatus::SkippedDestinationExists => {
                        render::status("kept", backup.destination.as_deref().unwrap_or(&backup.executable))
                    }
                    BackupStatus::SkippedMissingSource => {
                        render::status("absent", &backup.executable)
                    }
                    BackupStatus::Failed => render::status("failed", &backup.executable),
                }
            }
            for warning in &report.warnings {
                render::warn(warning);
            }
            render::status(
                "provisioned",
                &format!("{} runtime directories", report.runtime_dirs.len()),
            );
        }
        Commands::Provision { app_root } => {
            let layout = resolve_layout(app_root)?;
            let dirs = provision_workspace(&layout)?;
            for dir in dirs {
                render::status("ready", &dir.display().to_string());
            }
        }
        Commands::Doctor { app_root } => {
            let layout = resolve_layout(app_root)?;
            println!("product: {} {}", manifest.display_name, manifest.version);
            println!("app root: {}", layout.root().display());
            println!("backup: {}", layout.backup_dir().display());
            println!("outputs: {}", layout.outputs_dir().display());
            println!("logs: {}", layout.logs_dir().display());
            println!("temp: {}", layout.temp_dir().display());
            println!("inputs: {}", layout.inputs_dir().display());
        }
    }

    Ok(())
}

fn load_manifest(path: Option<&std::path::Path>) -> Result<ProductManifest> {
    let Some(path) = path else {
        return Ok(ProductManifest::builtin());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read setup manifest: {}", path.display()))?;
    ProductManifest::from_toml_str(&raw)
        .with_context(|| format!("invalid setup manifest: {}", path.display()))
}

fn resolve_layout(app_root: Option<PathBuf>) -> Result<AppLayout> {
    let root = match app_root {
        Some(root) => root,
        None => default_app_root()?,
    };
    Ok(AppLayout::new(root))
}

fn detect_previous_install(
    manifest: &ProductManifest,
    record_file: Option<&std::path::Path>,
) -> Result<Detection> {
    if let Some(record_file) = record_file {
        let locator = RecordFileLocator::new(record_file);
        return Ok(match locator.locate(&manifest.app_id)? {
            Some(record) => Detection::from_record(record),
            None => Detection::not_found(),
        });
    }

    #[cfg(windows)]
    {
        let locator = drossi_setup_reconciler::RegistryLocator::new();
        return Ok(match locator.locate(&manifest.app_id)? {
            Some(record) => Detection::from_record(record),
            None => Detection::not_found(),
        });
    }

    // No registry on this host and no record file given.
    #[cfg(not(windows))]
    Ok(Detection::not_found())
}
