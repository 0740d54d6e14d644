//! Integration tests for layered mesh slicing and volumizing.

use geometry::{extract_layer_range, transform_and_extract, volumize, LayerLayout};
use quickview_common::mesh::{LEVELS_KEY, NUM_LEVELS_KEY};
use quickview_common::GeoWindow;
use test_utils::{assert_points_approx_eq, layered_band_mesh, layered_corner_mesh, level_values};

// ============================================================================
// ExtractLayerRange
// ============================================================================

#[test]
fn test_extract_middle_layers() {
    // 4 layers of 100 points and 90 cells
    let mesh = layered_band_mesh(4, 10, 10);
    let layout = LayerLayout::discover(&mesh).unwrap();
    assert_eq!(layout.points_2d, 100);
    assert_eq!(layout.cells_2d, 90);

    let out = extract_layer_range(&mesh, 1, 2).unwrap();

    assert_eq!(out.field_data[NUM_LEVELS_KEY], vec![2.0]);
    assert_eq!(out.field_data[LEVELS_KEY], level_values(4)[1..3].to_vec());

    assert_eq!(out.num_points(), 200);
    assert_eq!(out.points.as_slice(), &mesh.points[100..300]);
    assert_eq!(out.point_data["h"], mesh.point_data["h"][100..300].to_vec());

    assert_eq!(out.num_cells(), 180);
    assert_eq!(out.cell_data["T"], mesh.cell_data["T"][90..270].to_vec());
    assert_eq!(out.cell_data["T"][0], 1000.0);
    assert_eq!(out.cell_data["T"][90], 2000.0);
    assert!(!out.cell_data.contains_key("vtkOriginalCellIds"));

    assert!(out.validate().is_ok());
}

#[test]
fn test_extract_full_range_matches_source() {
    let mesh = layered_band_mesh(3, 8, 4);
    let out = extract_layer_range(&mesh, 0, 2).unwrap();

    assert_eq!(out.points, mesh.points);
    assert_eq!(out.cells, mesh.cells);
    assert_eq!(out.cell_data["T"], mesh.cell_data["T"]);
    assert_eq!(out.field_data[LEVELS_KEY], mesh.field_data[LEVELS_KEY]);
}

#[test]
fn test_extracted_cells_address_own_layer() {
    let mesh = layered_band_mesh(4, 10, 10);
    let out = extract_layer_range(&mesh, 2, 2).unwrap();
    // every cell of the slice sits at the layer's z
    let z = level_values(4)[2];
    for (_, ids) in out.cells.iter() {
        assert!(ids.iter().all(|i| out.points[*i][2] == z));
    }
}

// ============================================================================
// Volumize
// ============================================================================

#[test]
fn test_volumize_counts_for_any_layer_count() {
    for layers in 1..=5 {
        let mesh = layered_corner_mesh(layers, 6, 3);
        let vol = volumize(&mesh).unwrap();
        assert_eq!(vol.num_cells(), (layers - 1) * 18, "layers = {}", layers);
        assert!(vol.num_points() <= mesh.num_points());
        assert!(vol.validate().is_ok());
    }
}

#[test]
fn test_volumize_keeps_columns_vertical() {
    let mesh = layered_band_mesh(3, 10, 5);
    let vol = volumize(&mesh).unwrap();
    for (_, ids) in vol.cells.iter() {
        for k in 0..4 {
            let lower = vol.points[ids[k]];
            let upper = vol.points[ids[k + 4]];
            assert_eq!(lower[0], upper[0]);
            assert_eq!(lower[1], upper[1]);
            assert!(upper[2] < lower[2], "levels decrease upward");
        }
    }
}

// ============================================================================
// Slice then window
// ============================================================================

#[test]
fn test_slice_then_extract_window() {
    let mesh = layered_corner_mesh(3, 36, 18);
    let slice = extract_layer_range(&mesh, 1, 1).unwrap();
    let window = GeoWindow::new([-180.0, 0.0], [-90.0, 90.0]).unwrap();
    let out = transform_and_extract(&slice, &window);

    // the western hemisphere holds half the columns
    assert_eq!(out.num_cells(), 18 * 18);
    assert!(out.bounds().max(0) <= 0.0);
    let first = out.cells.point_ids(0);
    let corner = out.points[first[0]];
    assert_points_approx_eq!(corner, [-180.0, -90.0, level_values(3)[1]], 1e-9);
    assert!(out.cell_data["T"].iter().all(|t| (1000.0..2000.0).contains(t)));
}
