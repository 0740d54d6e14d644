//! Integration tests for the pipeline lifecycle with the synthetic reader.

use std::path::Path;

use eam_reader::SyntheticReader;
use pipeline::{Pipeline, PipelineConfig, PipelineStatus};
use quickview_common::{CellType, VariableCategory};
use renderer::MeshSource;
use test_utils::assert_approx_eq;

const DATA: &str = "/data/eam.h0.nc";
const CONN: &str = "/data/ne4pg2_scrip.nc";
const BROKEN: &str = "/data/broken.nc";

fn pipeline() -> Pipeline {
    let reader = SyntheticReader::demo().fail_on(BROKEN);
    Pipeline::new(PipelineConfig::default(), Box::new(reader)).unwrap()
}

fn loaded() -> Pipeline {
    let mut p = pipeline();
    p.update(Path::new(DATA), Path::new(CONN)).unwrap();
    p
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Update
// ============================================================================

#[test]
fn test_update_publishes_outputs() {
    let p = loaded();
    assert_eq!(p.status(), PipelineStatus::Valid);
    assert_eq!(p.available_variables().surface, names(&["TS", "PS", "PRECT"]));
    assert_eq!(p.available_variables().midpoint, names(&["T", "Q"]));
    assert_eq!(p.available_variables().interface, names(&["CMFMC"]));
    assert_eq!(p.timesteps().len(), 3);
    assert_eq!(p.lev().len(), 8);
    assert_eq!(p.ilev().len(), 9);

    let data = p.ports().data.current();
    assert_eq!(data.num_cells(), 36 * 18);
    assert!(data.cell_data.contains_key("area"));

    let extents = p.extents();
    assert_approx_eq!(extents.min(0), -180.0, 1e-9);
    assert_approx_eq!(extents.max(0), 180.0, 1e-9);
    assert_approx_eq!(extents.min(1), -90.0, 1e-9);

    // 13 meridians and 7 parallels at 30 degree spacing
    let gridlines = p.ports().gridlines.current();
    assert_eq!(gridlines.num_cells(), 20);
    assert!(gridlines.cells.is_homogeneous(CellType::PolyLine));
    assert!(p.ports().globe.current().num_cells() >= 1);
}

#[test]
fn test_update_same_files_is_noop() {
    let mut p = loaded();
    let generation = p.ports().data.generation();
    p.update(Path::new(DATA), Path::new(CONN)).unwrap();
    assert_eq!(p.ports().data.generation(), generation);
}

#[test]
fn test_failed_load_keeps_outputs_and_guards() {
    let mut p = loaded();
    let generation = p.ports().data.generation();
    let cells = p.ports().data.current().num_cells();

    let err = p.update(Path::new(BROKEN), Path::new(CONN)).unwrap_err();
    assert_eq!(err.kind(), "PipelineLoadError");
    assert_eq!(p.status(), PipelineStatus::Invalid);
    assert_eq!(p.ports().data.generation(), generation);
    assert_eq!(p.ports().data.current().num_cells(), cells);

    // Mutations are skipped while invalid
    p.apply_clipping([0.0, 10.0], [0.0, 10.0]).unwrap();
    assert!(!p.update_projection("Robinson").unwrap());
    p.update_pipeline().unwrap();
    assert_eq!(p.ports().data.generation(), generation);
    assert_eq!(p.window().lon_range(), [-180.0, 180.0]);

    // A good file pair recovers
    p.update(Path::new(DATA), Path::new(CONN)).unwrap();
    assert!(p.is_valid());
}

#[test]
fn test_retrying_failed_files_reports_failure() {
    let mut p = pipeline();
    let first = p.update(Path::new(BROKEN), Path::new(CONN)).unwrap_err();
    assert_eq!(first.kind(), "PipelineLoadError");
    assert_eq!(p.status(), PipelineStatus::Invalid);

    let second = p.update(Path::new(BROKEN), Path::new(CONN)).unwrap_err();
    assert_eq!(second.kind(), "PipelineLoadError");
    assert_eq!(p.status(), PipelineStatus::Invalid);
}

// ============================================================================
// Clipping, projection and slicing
// ============================================================================

#[test]
fn test_clipping_restricts_data_and_extents() {
    let mut p = loaded();
    p.apply_clipping([0.0, 90.0], [0.0, 45.0]).unwrap();
    p.update_pipeline().unwrap();

    let data = p.ports().data.current();
    assert!(data.num_cells() > 0 && data.num_cells() < 36 * 18);
    let extents = p.extents();
    assert!(extents.min(0) >= -10.0 && extents.max(0) <= 100.0);
    assert!(extents.min(1) >= -10.0 && extents.max(1) <= 55.0);
}

#[test]
fn test_invalid_window_rejected() {
    let mut p = loaded();
    let err = p.apply_clipping([40.0, -40.0], [-90.0, 90.0]).unwrap_err();
    assert_eq!(err.kind(), "RangeError");
    assert_eq!(p.window().lon_range(), [-180.0, 180.0]);
}

#[test]
fn test_projection_change() {
    let mut p = loaded();
    assert!(!p.update_projection("Cyl. Equidistant").unwrap());
    assert!(p.update_projection("Robinson").unwrap());
    assert!(!p.update_projection("Robinson").unwrap());
    p.update_pipeline().unwrap();
    // Robinson output is in meters
    assert!(p.move_extents().max(0) > 1.0e6);

    let err = p.update_projection("Mercator").unwrap_err();
    assert_eq!(err.kind(), "UnsupportedProjectionError");
}

#[test]
fn test_midpoint_slice_follows_update_lev() {
    let mut p = loaded();
    p.load_variables(&[], &names(&["T"]), &names(&["CMFMC"]));
    p.update_pipeline().unwrap();
    let bottom = p.ports().data.current().cell_data["T"].clone();

    assert!(p.update_lev(3, 0));
    assert!(!p.update_lev(3, 0));
    p.update_pipeline().unwrap();
    let upper = p.ports().data.current();
    for (a, b) in bottom.iter().zip(&upper.cell_data["T"]) {
        assert_approx_eq!(b - a, -24.0, 1e-9);
    }
    assert!(upper.cell_data.contains_key("CMFMC"));
}

#[test]
fn test_time_step_changes_values() {
    let mut p = loaded();
    p.load_variables(&names(&["TS"]), &[], &[]);
    p.update_pipeline().unwrap();
    let t0 = p.ports().data.current().cell_data["TS"].clone();

    p.update_time_step(7);
    assert_eq!(p.time_index(), 0);

    p.update_time_step(2);
    p.update_pipeline().unwrap();
    assert_eq!(p.time_index(), 2);
    assert_ne!(p.ports().data.current().cell_data["TS"], t0);
}

#[test]
fn test_selection_survives_reload() {
    let mut p = loaded();
    p.load_variables(&names(&["TS", "PRECT"]), &[], &[]);
    p.update_pipeline().unwrap();
    p.update(Path::new("/data/eam.h1.nc"), Path::new(CONN)).unwrap();
    assert_eq!(p.selected_variables().surface, names(&["TS", "PRECT"]));
    assert!(p.ports().data.current().cell_data.contains_key("PRECT"));
}

#[test]
fn test_center_recorded_only() {
    let mut p = loaded();
    let generation = p.ports().data.generation();
    p.update_center(90.0);
    assert_eq!(p.center(), 90.0);
    assert_eq!(p.ports().data.generation(), generation);
}

// ============================================================================
// Volumes and globe mode
// ============================================================================

#[test]
fn test_build_volume() {
    let mut p = loaded();
    p.load_variables(&[], &names(&["T"]), &[]);
    p.update_pipeline().unwrap();
    let volume = p.build_volume(VariableCategory::Midpoint).unwrap();
    assert_eq!(volume.num_cells(), 7 * 36 * 18);
    assert!(volume.cells.is_homogeneous(CellType::Hexahedron));
}

#[test]
fn test_globe_mode_maps_to_sphere() {
    let mut p = loaded();
    p.set_globe_mode(true);
    p.update_pipeline().unwrap();
    let data = p.ports().data.current();
    for point in data.points.iter().take(50) {
        let r = (point[0].powi(2) + point[1].powi(2) + point[2].powi(2)).sqrt();
        assert_approx_eq!(r, 2001.0, 1e-6);
    }
}
