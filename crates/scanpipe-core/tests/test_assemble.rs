#[allow(dead_code)]
mod common;

use std::fs;

use tempfile::TempDir;

use scanpipe_core::backend::{CpuBackend, ImageBackend};
use scanpipe_core::layout::LayoutKind;
use scanpipe_core::pipeline::assemble::assemble_stack;

#[test]
fn test_assembled_stack_is_titled_raw() {
    let tmp = TempDir::new().unwrap();
    let scan = common::write_bruker_scan(tmp.path(), "TSeries-001", 2, 3, 4);
    let mut backend = CpuBackend::new();

    let assembled = assemble_stack(&mut backend, tmp.path(), &scan, LayoutKind::Bruker).unwrap();

    assert_eq!(assembled.basename, "TSeries-001");
    assert_eq!(backend.title(assembled.id).unwrap(), "TSeries-001_raw");
    assert_eq!(
        (assembled.dims.channels, assembled.dims.slices, assembled.dims.frames),
        (2, 3, 4)
    );
    assert_eq!(backend.ids(), vec![assembled.id]);
}

#[test]
fn test_partial_timepoint_is_discarded() {
    let tmp = TempDir::new().unwrap();
    let scan = common::write_bruker_scan(tmp.path(), "interrupted", 2, 2, 3);
    // Acquisition stopped after the first plane of the fourth cycle.
    common::write_plane(
        &common::bruker_plane_path(&scan, "interrupted", 0, 0, 3),
        common::plane(0, 0, 3),
    );
    let mut backend = CpuBackend::new();

    let assembled = assemble_stack(&mut backend, tmp.path(), &scan, LayoutKind::Bruker).unwrap();

    assert_eq!(assembled.dims.frames, 3);
    assert_eq!(backend.ids(), vec![assembled.id]);
}

#[test]
fn test_scan_with_only_second_channel_assembles() {
    let tmp = TempDir::new().unwrap();
    let scan = tmp.path().join("TSeries-001");
    fs::create_dir(&scan).unwrap();
    // Green-only acquisition: every plane is recorded as Ch2.
    for t in 0..3 {
        for z in 0..2 {
            common::write_plane(
                &common::bruker_plane_path(&scan, "TSeries-001", 1, z, t),
                common::plane(1, z, t),
            );
        }
    }
    let mut backend = CpuBackend::new();

    let assembled = assemble_stack(&mut backend, tmp.path(), &scan, LayoutKind::Bruker).unwrap();

    assert_eq!(
        (assembled.dims.channels, assembled.dims.slices, assembled.dims.frames),
        (1, 2, 3)
    );
    let stack = backend.stack(assembled.id).unwrap();
    assert_eq!(stack.plane(0, 1, 2), common::plane(1, 1, 2));
}

#[test]
fn test_lone_single_frame_stack_survives() {
    let tmp = TempDir::new().unwrap();
    let scan = common::write_bruker_scan(tmp.path(), "snapshot", 1, 1, 1);
    let mut backend = CpuBackend::new();

    let assembled = assemble_stack(&mut backend, tmp.path(), &scan, LayoutKind::Bruker).unwrap();

    assert_eq!(assembled.dims.frames, 1);
}

#[test]
fn test_nothing_left_after_pruning_is_assembly_error() {
    let tmp = TempDir::new().unwrap();
    let scan = tmp.path().join("broken");
    fs::create_dir(&scan).unwrap();
    // Two cycles, each missing one of the two channels.
    common::write_plane(
        &common::bruker_plane_path(&scan, "broken", 0, 0, 0),
        common::plane(0, 0, 0),
    );
    common::write_plane(
        &common::bruker_plane_path(&scan, "broken", 1, 0, 1),
        common::plane(1, 0, 1),
    );
    let mut backend = CpuBackend::new();

    let err = assemble_stack(&mut backend, tmp.path(), &scan, LayoutKind::Bruker).unwrap_err();

    assert_eq!(err.kind(), "AssemblyError");
    assert!(backend.ids().is_empty());
}

#[test]
fn test_missing_initiator_is_assembly_error() {
    let tmp = TempDir::new().unwrap();
    let scan = tmp.path().join("empty");
    fs::create_dir(&scan).unwrap();
    let mut backend = CpuBackend::new();

    let err = assemble_stack(&mut backend, tmp.path(), &scan, LayoutKind::Bruker).unwrap_err();

    assert_eq!(err.kind(), "AssemblyError");
}

#[test]
fn test_olympus_scan_assembles_from_container() {
    let tmp = TempDir::new().unwrap();
    let scan = common::write_olympus_scan(tmp.path(), "embryo_01", 1, 4, 3);
    let mut backend = CpuBackend::new();

    let assembled = assemble_stack(&mut backend, tmp.path(), &scan, LayoutKind::Olympus).unwrap();

    assert_eq!(assembled.basename, "embryo_01");
    assert_eq!(backend.title(assembled.id).unwrap(), "embryo_01_raw");
    assert_eq!((assembled.dims.slices, assembled.dims.frames), (4, 3));
}
