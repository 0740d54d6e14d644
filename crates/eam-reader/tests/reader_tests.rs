//! Reader behavior seen from the owner's side: bind files, select variables,
//! update, poll the observer.

use std::path::Path;

use eam_reader::{DataReader, ErrorObserver, SyntheticReader, AREA_FIELD};
use geometry::{extract_layer_range, LayerLayout};
use quickview_common::mesh::{LEVELS_KEY, NUM_LEVELS_KEY};
use quickview_common::VariableLists;
use test_utils::assert_approx_eq;

fn selection() -> VariableLists {
    VariableLists::new(vec!["TS".into(), "PRECT".into()], vec!["T".into()], vec!["CMFMC".into()])
}

fn updated_reader() -> SyntheticReader {
    let mut reader = SyntheticReader::demo();
    reader.set_files(Path::new("eam.nc"), Path::new("conn.nc"));
    reader.set_active_variables(&selection());
    reader.update();
    reader
}

#[test]
fn test_outputs_share_horizontal_grid() {
    let reader = updated_reader();
    let out = reader.output().unwrap();
    let n2d = out.surface.num_cells();
    assert_eq!(n2d, 36 * 18);

    let mid = LayerLayout::discover(&out.midpoint).unwrap();
    assert_eq!(mid.num_layers, out.lev.len());
    assert_eq!(mid.cells_2d, n2d);

    let int = LayerLayout::discover(&out.interface).unwrap();
    assert_eq!(int.num_layers, out.ilev.len());
    assert_eq!(out.interface.field_data[NUM_LEVELS_KEY], vec![out.ilev.len() as f64]);
}

#[test]
fn test_layer_slice_matches_formula() {
    let reader = updated_reader();
    let out = reader.output().unwrap();
    let slice = extract_layer_range(&out.midpoint, 3, 3).unwrap();
    assert_eq!(slice.num_cells(), out.surface.num_cells());
    assert_eq!(slice.field_data[LEVELS_KEY], vec![out.lev[3]]);

    let var = reader
        .dataset()
        .variables
        .iter()
        .find(|v| v.name == "T")
        .unwrap();
    // First cell is centered at (5, -85).
    assert_approx_eq!(slice.cell_data["T"][0], var.value_at(5.0, -85.0, 3, 0), 1e-9);
}

#[test]
fn test_area_sums_to_sphere() {
    let reader = updated_reader();
    let area = &reader.output().unwrap().surface.cell_data[AREA_FIELD];
    let total: f64 = area.iter().sum();
    assert_approx_eq!(total, 4.0 * std::f64::consts::PI, 1e-9);
}

#[test]
fn test_missing_values_are_nan() {
    let reader = updated_reader();
    let prect = &reader.output().unwrap().surface.cell_data["PRECT"];
    assert!(prect[0].is_nan());
    assert!(prect[36 * 9].is_finite());
}

#[test]
fn test_time_step_changes_values() {
    let mut reader = updated_reader();
    let before = reader.output().unwrap().surface.cell_data["TS"].clone();
    reader.set_time_index(2);
    reader.update();
    let after = &reader.output().unwrap().surface.cell_data["TS"];
    assert_ne!(&before, after);
    assert_eq!(reader.update_count(), 2);
}

#[test]
fn test_failed_update_keeps_previous_output() {
    let mut reader = SyntheticReader::demo().fail_on("bad.nc");
    let observer = ErrorObserver::new();
    reader.attach_observer(observer.clone());
    reader.set_files(Path::new("eam.nc"), Path::new("conn.nc"));
    reader.set_active_variables(&selection());
    reader.update();
    assert!(!observer.error_occurred());

    reader.set_files(Path::new("bad.nc"), Path::new("conn.nc"));
    reader.update();
    assert!(observer.error_occurred());
    assert!(reader.output().is_some());
}

#[cfg(feature = "native")]
mod native {
    use super::*;
    use eam_reader::NetCdfReader;
    use test_utils::require_test_file;

    #[test]
    fn test_reads_eam_sample() {
        let data = require_test_file!("eam_sample.nc");
        let conn = require_test_file!("eam_connectivity.nc");
        let mut reader = NetCdfReader::new();
        let observer = ErrorObserver::new();
        reader.attach_observer(observer.clone());
        reader.set_files(&data, &conn);
        let available = reader.available_variables();
        assert!(!available.is_empty());

        let first = VariableLists::new(available.surface.iter().take(1).cloned().collect(), vec![], vec![]);
        reader.set_active_variables(&first);
        reader.update();
        assert!(!observer.error_occurred(), "{:?}", observer.message());
        let out = reader.output().unwrap();
        assert!(out.surface.num_cells() > 0);
        assert!(out.midpoint.validate().is_ok());
    }
}

// ============================================================================
// Native reader (needs sample files under testdata/ or TEST_DATA_DIR)
// ============================================================================

#[cfg(feature = "native")]
#[test]
fn test_native_reader_sample_files() {
    use eam_reader::NetCdfReader;
    use test_utils::require_test_file;

    let data = require_test_file!("eam_sample.nc");
    let conn = require_test_file!("eam_sample_scrip.nc");

    let observer = ErrorObserver::new();
    let mut reader = NetCdfReader::new();
    reader.attach_observer(observer.clone());
    reader.set_files(&data, &conn);

    let available = reader.available_variables();
    assert!(!available.is_empty());
    let first = available.ordered()[0].clone();
    let category = available.category_of(&first).unwrap();
    let mut active = VariableLists::default();
    active.get_mut(category).push(first.clone());
    reader.set_active_variables(&active);
    reader.update();

    assert!(!observer.error_occurred(), "{:?}", observer.message());
    let out = reader.output().unwrap();
    assert!(out.surface.num_cells() > 0);
    assert_eq!(out.surface.num_points(), out.surface.num_cells() * 4);
}
