#[allow(dead_code)]
mod common;

use std::fs;

use tempfile::TempDir;

use scanpipe_core::layout::{detect_layout, list_scans, LayoutKind};

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

#[test]
fn test_detect_olympus_from_oif_file() {
    let tmp = TempDir::new().unwrap();
    common::write_olympus_scan(tmp.path(), "embryo", 1, 1, 2);
    assert_eq!(detect_layout(tmp.path()), LayoutKind::Olympus);
}

#[test]
fn test_detect_defaults_to_bruker() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("TSeries-001")).unwrap();
    fs::write(tmp.path().join("notes.txt"), "x").unwrap();
    assert_eq!(detect_layout(tmp.path()), LayoutKind::Bruker);
}

#[test]
fn test_detect_empty_and_missing_roots_are_bruker() {
    let tmp = TempDir::new().unwrap();
    assert_eq!(detect_layout(tmp.path()), LayoutKind::Bruker);
    assert_eq!(detect_layout(&tmp.path().join("absent")), LayoutKind::Bruker);
}

#[test]
fn test_detect_is_deterministic() {
    let tmp = TempDir::new().unwrap();
    common::write_olympus_scan(tmp.path(), "a", 1, 1, 1);
    let first = detect_layout(tmp.path());
    for _ in 0..5 {
        assert_eq!(detect_layout(tmp.path()), first);
    }
}

#[test]
fn test_oif_container_alone_is_not_olympus() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("orphan.oif.files")).unwrap();
    assert_eq!(detect_layout(tmp.path()), LayoutKind::Bruker);
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

#[test]
fn test_bruker_scans_are_sorted_directories() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("scanB")).unwrap();
    fs::write(tmp.path().join("notes.txt"), "x").unwrap();
    fs::create_dir(tmp.path().join("scanA")).unwrap();

    let scans = list_scans(tmp.path(), LayoutKind::Bruker).unwrap();
    assert_eq!(scans, vec![tmp.path().join("scanA"), tmp.path().join("scanB")]);
}

#[test]
fn test_olympus_scans_are_oif_containers() {
    let tmp = TempDir::new().unwrap();
    common::write_olympus_scan(tmp.path(), "second", 1, 1, 1);
    common::write_olympus_scan(tmp.path(), "first", 1, 1, 1);
    fs::create_dir(tmp.path().join("exports")).unwrap();

    let scans = list_scans(tmp.path(), LayoutKind::Olympus).unwrap();
    assert_eq!(
        scans,
        vec![
            tmp.path().join("first.oif.files"),
            tmp.path().join("second.oif.files")
        ]
    );
}

#[test]
fn test_list_scans_on_missing_root_fails() {
    let tmp = TempDir::new().unwrap();
    assert!(list_scans(&tmp.path().join("absent"), LayoutKind::Bruker).is_err());
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

#[test]
fn test_olympus_initiator_is_oif_next_to_container() {
    let tmp = TempDir::new().unwrap();
    let scan = common::write_olympus_scan(tmp.path(), "embryo", 1, 1, 1);
    let strategy = LayoutKind::Olympus.strategy();

    let basename = strategy.resolve_basename(&scan);
    assert_eq!(basename, "embryo");
    let initiator = strategy.resolve_initiator(tmp.path(), &scan, &basename).unwrap();
    assert_eq!(initiator, tmp.path().join("embryo.oif"));
}

#[test]
fn test_bruker_initiator_is_first_cycle_first_plane() {
    let tmp = TempDir::new().unwrap();
    let scan = common::write_bruker_scan(tmp.path(), "TSeries-001", 2, 2, 2);
    let strategy = LayoutKind::Bruker.strategy();

    let basename = strategy.resolve_basename(&scan);
    assert_eq!(basename, "TSeries-001");
    let initiator = strategy.resolve_initiator(tmp.path(), &scan, &basename).unwrap();
    assert_eq!(
        initiator,
        scan.join("TSeries-001_Cycle00001_Ch1_000001.ome.tif")
    );
}

#[test]
fn test_missing_initiator_is_an_assembly_error() {
    let tmp = TempDir::new().unwrap();
    let scan = tmp.path().join("empty");
    fs::create_dir(&scan).unwrap();

    let err = LayoutKind::Bruker
        .strategy()
        .resolve_initiator(tmp.path(), &scan, "empty")
        .unwrap_err();
    assert_eq!(err.kind(), "AssemblyError");
}
