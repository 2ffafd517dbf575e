mod checksum;
mod fs_utils;
mod layout;
mod locate;
mod reconcile;
mod report;

pub use checksum::{file_sha256_hex, sha256_hex};
pub use fs_utils::copy_file_if_absent;
pub use layout::{default_app_root, AppLayout};
pub use locate::{
    parse_install_record, Detection, InstallRecord, PreviousInstallLocator, RecordFileLocator,
};
#[cfg(windows)]
pub use locate::RegistryLocator;
pub use reconcile::{provision_workspace, reconcile_post_install};
pub use report::{
    read_reconcile_report, write_reconcile_report, BackupEntry, BackupStatus, ReconcileReport,
};

#[cfg(test)]
mod tests;
