use std::fs;

use tempfile::TempDir;

use scanpipe_core::output::{prepare_output_tree, OutputDirs};

#[test]
fn test_output_tree_layout() {
    let tmp = TempDir::new().unwrap();
    let dirs = prepare_output_tree(tmp.path()).unwrap();

    let processed = tmp.path().join("processed");
    assert_eq!(dirs, OutputDirs::for_scan(tmp.path()));
    assert_eq!(dirs.raw, processed.join("raw"));
    assert_eq!(dirs.diff, processed.join("diff"));
    assert_eq!(dirs.filtered, processed.join("filtered"));
    assert_eq!(dirs.max_raw, processed.join("MAX").join("rawMAX"));
    assert_eq!(dirs.max_filtered, processed.join("MAX").join("filteredMAX"));
    for dir in dirs.leaves() {
        assert!(dir.is_dir(), "{} missing", dir.display());
    }
}

#[test]
fn test_output_tree_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let first = prepare_output_tree(tmp.path()).unwrap();
    fs::write(first.raw.join("C1-stale_raw.tif"), b"old").unwrap();
    fs::create_dir(first.processed.join("extra")).unwrap();

    let second = prepare_output_tree(tmp.path()).unwrap();

    assert_eq!(first, second);
    for dir in second.leaves() {
        assert_eq!(fs::read_dir(dir).unwrap().count(), 0);
    }
    assert!(!second.processed.join("extra").exists());
}

#[test]
fn test_output_tree_leaves_scan_data_alone() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("scan_Cycle00001_Ch1_000001.ome.tif"), b"data").unwrap();

    prepare_output_tree(tmp.path()).unwrap();
    prepare_output_tree(tmp.path()).unwrap();

    assert!(tmp.path().join("scan_Cycle00001_Ch1_000001.ome.tif").is_file());
}

#[test]
fn test_output_tree_failure_is_directory_error() {
    let tmp = TempDir::new().unwrap();
    // A file where the scan directory should be.
    let scan = tmp.path().join("not_a_dir");
    fs::write(&scan, b"x").unwrap();

    let err = prepare_output_tree(&scan).unwrap_err();
    assert_eq!(err.kind(), "DirectoryError");
}
