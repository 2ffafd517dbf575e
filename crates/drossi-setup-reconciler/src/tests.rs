use std::fs;
use std::path::PathBuf;

use drossi_setup_core::ProductManifest;

use crate::locate::parse_reg_query_value;
use crate::{
    copy_file_if_absent, file_sha256_hex, parse_install_record, provision_workspace,
    read_reconcile_report, reconcile_post_install, sha256_hex, AppLayout, BackupStatus, Detection,
    PreviousInstallLocator, RecordFileLocator,
};

fn test_root(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "drossi-setup-tests-{label}-{}-{nanos}",
        std::process::id()
    ))
}

fn test_manifest(previous_executables: &[&str]) -> ProductManifest {
    let mut manifest = ProductManifest::builtin();
    manifest.previous_executables = previous_executables
        .iter()
        .map(|v| (*v).to_string())
        .collect();
    manifest
}

#[test]
fn reconcile_without_previous_install_provisions_runtime_dirs_only() {
    let root = test_root("no-previous");
    let layout = AppLayout::new(&root);

    let report = reconcile_post_install(&layout, &Detection::not_found(), &test_manifest(&[]))
        .expect("must reconcile");

    assert!(!report.previous_install_found);
    assert!(report.backups.is_empty());
    assert!(layout.outputs_dir().is_dir());
    assert!(layout.logs_dir().is_dir());
    assert!(layout.temp_dir().is_dir());
    assert!(!layout.backup_dir().exists());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn reconcile_with_missing_executable_creates_no_backup_file() {
    let root = test_root("missing-exe");
    let old_root = test_root("missing-exe-old");
    fs::create_dir_all(&old_root).expect("must create old install root");
    let layout = AppLayout::new(&root);

    let detection = Detection {
        found: true,
        install_location: Some(old_root.clone()),
    };
    let report = reconcile_post_install(&layout, &detection, &test_manifest(&["App_v2.0.exe"]))
        .expect("must reconcile");

    assert_eq!(report.backups.len(), 1);
    assert_eq!(report.backups[0].status, BackupStatus::SkippedMissingSource);
    assert!(layout.backup_dir().is_dir());
    assert!(!layout.backup_path("App_v2.0_backup.exe").exists());
    assert!(layout.outputs_dir().is_dir());
    assert!(layout.logs_dir().is_dir());
    assert!(layout.temp_dir().is_dir());

    let _ = fs::remove_dir_all(&root);
    let _ = fs::remove_dir_all(&old_root);
}

#[test]
fn reconcile_backs_up_previous_executable_byte_identical() {
    let root = test_root("backup");
    let old_root = test_root("backup-old");
    fs::create_dir_all(&old_root).expect("must create old install root");
    fs::write(old_root.join("App_v2.0.exe"), [1u8, 2, 3]).expect("must write old executable");
    let layout = AppLayout::new(&root);

    let detection = Detection {
        found: true,
        install_location: Some(old_root.clone()),
    };
    let report = reconcile_post_install(&layout, &detection, &test_manifest(&["App_v2.0.exe"]))
        .expect("must reconcile");

    assert_eq!(report.backups.len(), 1);
    assert_eq!(report.backups[0].status, BackupStatus::Created);
    assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);

    let backup = layout.backup_path("App_v2.0_backup.exe");
    assert_eq!(fs::read(&backup).expect("must read backup"), vec![1u8, 2, 3]);
    assert!(layout.outputs_dir().is_dir());
    assert!(layout.logs_dir().is_dir());
    assert!(layout.temp_dir().is_dir());

    let _ = fs::remove_dir_all(&root);
    let _ = fs::remove_dir_all(&old_root);
}

#[test]
fn reconcile_twice_is_idempotent_and_keeps_first_backup() {
    let root = test_root("idempotent");
    let old_root = test_root("idempotent-old");
    fs::create_dir_all(&old_root).expect("must create old install root");
    fs::write(old_root.join("App_v2.0.exe"), b"first").expect("must write old executable");
    let layout = AppLayout::new(&root);
    let manifest = test_manifest(&["App_v2.0.exe"]);

    let detection = Detection {
        found: true,
        install_location: Some(old_root.clone()),
    };
    let first =
        reconcile_post_install(&layout, &detection, &manifest).expect("first run must succeed");
    assert_eq!(first.backups[0].status, BackupStatus::Created);

    // The old executable changing between runs must not clobber the backup.
    fs::write(old_root.join("App_v2.0.exe"), b"second").expect("must rewrite old executable");
    let second =
        reconcile_post_install(&layout, &detection, &manifest).expect("second run must succeed");
    assert_eq!(
        second.backups[0].status,
        BackupStatus::SkippedDestinationExists
    );

    let backup = layout.backup_path("App_v2.0_backup.exe");
    assert_eq!(fs::read(&backup).expect("must read backup"), b"first");
    assert!(layout.outputs_dir().is_dir());
    assert!(layout.logs_dir().is_dir());
    assert!(layout.temp_dir().is_dir());

    let _ = fs::remove_dir_all(&root);
    let _ = fs::remove_dir_all(&old_root);
}

#[test]
fn reconcile_persists_report_under_logs() {
    let root = test_root("report");
    let layout = AppLayout::new(&root);

    let report = reconcile_post_install(&layout, &Detection::not_found(), &test_manifest(&[]))
        .expect("must reconcile");
    assert!(layout.reconcile_report_path().is_file());

    let loaded = read_reconcile_report(&layout)
        .expect("must read report")
        .expect("report should exist");
    assert_eq!(loaded, report);
    assert_eq!(loaded.runtime_dirs.len(), 3);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn read_reconcile_report_returns_none_when_absent() {
    let root = test_root("report-absent");
    let layout = AppLayout::new(&root);

    let loaded = read_reconcile_report(&layout).expect("must read");
    assert!(loaded.is_none());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn record_file_locator_reports_not_found_for_missing_file() {
    let root = test_root("locator-missing");
    let locator = RecordFileLocator::new(root.join("install-record"));

    let record = locator
        .locate("{B8F4C2A0-51D3-4E7B-9A16-0C8D2E5F7A31}")
        .expect("missing record file is not an error");
    assert!(record.is_none());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn record_file_locator_round_trip() {
    let root = test_root("locator");
    fs::create_dir_all(&root).expect("must create root");
    let record_path = root.join("install-record");
    fs::write(
        &record_path,
        "app_id={B8F4C2A0-51D3-4E7B-9A16-0C8D2E5F7A31}\ninstall_location=/opt/old-app\n",
    )
    .expect("must write record file");

    let locator = RecordFileLocator::new(&record_path);
    let record = locator
        .locate("{B8F4C2A0-51D3-4E7B-9A16-0C8D2E5F7A31}")
        .expect("must locate")
        .expect("record should be found");
    assert_eq!(record.install_location, PathBuf::from("/opt/old-app"));

    let detection = Detection::from_record(record);
    assert!(detection.found);
    assert_eq!(
        detection.install_location.as_deref(),
        Some(std::path::Path::new("/opt/old-app"))
    );

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn record_file_locator_ignores_other_products() {
    let root = test_root("locator-other");
    fs::create_dir_all(&root).expect("must create root");
    let record_path = root.join("install-record");
    fs::write(
        &record_path,
        "app_id={00000000-0000-0000-0000-000000000000}\ninstall_location=/opt/other\n",
    )
    .expect("must write record file");

    let locator = RecordFileLocator::new(&record_path);
    let record = locator
        .locate("{B8F4C2A0-51D3-4E7B-9A16-0C8D2E5F7A31}")
        .expect("mismatching record is not an error");
    assert!(record.is_none());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn parse_install_record_requires_both_fields() {
    let err = parse_install_record("app_id={X}\n").expect_err("must reject");
    assert!(err.to_string().contains("missing install_location"));

    let err = parse_install_record("install_location=/opt/x\n").expect_err("must reject");
    assert!(err.to_string().contains("missing app_id"));
}

#[test]
fn parse_reg_query_output_extracts_install_location() {
    let output = concat!(
        "\r\n",
        "HKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\{B8F4C2A0}_is1\r\n",
        "    InstallLocation    REG_SZ    C:\\OldApp\\\r\n",
        "\r\n",
    );
    assert_eq!(
        parse_reg_query_value(output, "InstallLocation").as_deref(),
        Some("C:\\OldApp\\")
    );
}

#[test]
fn parse_reg_query_output_without_value_yields_none() {
    let output = "HKEY_LOCAL_MACHINE\\SOFTWARE\\X\r\n    DisplayName    REG_SZ    Old App\r\n";
    assert!(parse_reg_query_value(output, "InstallLocation").is_none());
}

#[test]
fn provision_workspace_creates_inputs_outputs_logs() {
    let root = test_root("provision");
    let layout = AppLayout::new(&root);

    let dirs = provision_workspace(&layout).expect("must provision");
    assert_eq!(
        dirs,
        vec![layout.inputs_dir(), layout.outputs_dir(), layout.logs_dir()]
    );
    for dir in &dirs {
        assert!(dir.is_dir());
    }

    provision_workspace(&layout).expect("second provision must be a no-op");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn copy_file_if_absent_never_overwrites() {
    let root = test_root("copy");
    fs::create_dir_all(&root).expect("must create root");
    let src = root.join("src.bin");
    let dst = root.join("dst.bin");
    fs::write(&src, b"new").expect("must write source");
    fs::write(&dst, b"old").expect("must write destination");

    let copied = copy_file_if_absent(&src, &dst).expect("must not fail");
    assert!(!copied);
    assert_eq!(fs::read(&dst).expect("must read destination"), b"old");

    fs::remove_file(&dst).expect("must remove destination");
    let copied = copy_file_if_absent(&src, &dst).expect("must copy");
    assert!(copied);
    assert_eq!(fs::read(&dst).expect("must read destination"), b"new");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn sha256_digests_match_between_buffer_and_file() {
    let root = test_root("digest");
    fs::create_dir_all(&root).expect("must create root");
    let path = root.join("payload.bin");
    fs::write(&path, b"cadastro").expect("must write payload");

    let from_file = file_sha256_hex(&path).expect("must hash file");
    assert_eq!(from_file, sha256_hex(b"cadastro"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn empty_payload_digest_is_well_known() {
    assert_eq!(
        sha256_hex(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn blocked_runtime_dir_fails_reconciliation_visibly() {
    let root = test_root("blocked-dir");
    fs::create_dir_all(&root).expect("must create root");
    // A regular file where `outputs` must go makes creation fail.
    fs::write(root.join("outputs"), b"not a directory").expect("must write blocking file");

    let layout = AppLayout::new(&root);
    let err = reconcile_post_install(&layout, &Detection::not_found(), &test_manifest(&[]))
        .expect_err("runtime dir creation must be fatal");
    assert!(err.to_string().contains("failed to create"));

    let _ = fs::remove_dir_all(&root);
}
