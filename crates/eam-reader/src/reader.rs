//! The data-reader contract and the mesh assembly shared by readers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use geometry::stack_layer_mesh;
use quickview_common::mesh::CellArray;
use quickview_common::{Mesh, VariableCategory, VariableLists};

use crate::error::{ReaderError, ReaderResult};
use crate::observer::{ErrorObserver, ObserverList};

/// Name of the per-cell area array carried on the surface output.
pub const AREA_FIELD: &str = "area";

/// Meshes produced by one reader update.
#[derive(Debug, Clone, Default)]
pub struct ReaderOutput {
    /// Horizontal quads with the active surface variables and `area`.
    pub surface: Mesh,
    /// One layer per `lev` value with the active midpoint variables.
    pub midpoint: Mesh,
    /// One layer per `ilev` value with the active interface variables.
    pub interface: Mesh,
    pub lev: Vec<f64>,
    pub ilev: Vec<f64>,
}

/// A source of EAM meshes bound to a data/connectivity file pair.
///
/// `update` never returns an error: failures are reported to the attached
/// [`ErrorObserver`]s and the caller polls them afterwards.
pub trait DataReader: Send {
    fn set_files(&mut self, data_file: &Path, conn_file: &Path);

    /// Record the active vertical slice indices.
    fn set_layers(&mut self, midpoint: usize, interface: usize);

    /// Names whose scalar arrays are materialized on the next update.
    fn set_active_variables(&mut self, variables: &VariableLists);

    fn set_time_index(&mut self, index: usize);

    fn attach_observer(&mut self, observer: Arc<ErrorObserver>);

    /// Read the bound files. Errors go to the observers.
    fn update(&mut self);

    /// Output of the last successful update.
    fn output(&self) -> Option<&ReaderOutput>;

    /// Variables found in the data file, grouped by category.
    fn available_variables(&self) -> VariableLists;

    fn timesteps(&self) -> Vec<f64>;
}

/// Settings and results common to every reader.
#[derive(Debug, Default)]
pub struct ReaderState {
    pub data_file: Option<PathBuf>,
    pub conn_file: Option<PathBuf>,
    pub midpoint_layer: usize,
    pub interface_layer: usize,
    pub active: VariableLists,
    pub time_index: usize,
    pub observers: ObserverList,
    pub available: VariableLists,
    pub timesteps: Vec<f64>,
    pub output: Option<ReaderOutput>,
}

impl ReaderState {
    pub fn files(&self) -> ReaderResult<(&Path, &Path)> {
        match (&self.data_file, &self.conn_file) {
            (Some(data), Some(conn)) => Ok((data.as_path(), conn.as_path())),
            _ => Err(ReaderError::FilesNotSet),
        }
    }

    /// Store a read result, or report its error to the observers.
    pub fn finish(&mut self, result: ReaderResult<ReaderOutput>) {
        match result {
            Ok(output) => {
                debug!(
                    surface_cells = output.surface.num_cells(),
                    lev = output.lev.len(),
                    ilev = output.ilev.len(),
                    "Reader update complete"
                );
                self.output = Some(output);
            }
            Err(err) => self.observers.notify(&err.to_string()),
        }
    }
}

/// Arrays read from a file pair, before meshing.
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    /// Corner longitudes, four per cell, in `[0, 360)`.
    pub corner_lon: Vec<f64>,
    /// Corner latitudes, four per cell.
    pub corner_lat: Vec<f64>,
    pub lev: Vec<f64>,
    pub ilev: Vec<f64>,
    pub area: Option<Vec<f64>>,
    /// `(name, values)` with one value per cell.
    pub surface: Vec<(String, Vec<f64>)>,
    /// `(name, values)` with `lev.len()` layers of cell values, bottom first.
    pub midpoint: Vec<(String, Vec<f64>)>,
    /// `(name, values)` with `ilev.len()` layers of cell values, bottom first.
    pub interface: Vec<(String, Vec<f64>)>,
}

impl RawDataset {
    pub fn num_cells(&self) -> usize {
        self.corner_lat.len() / 4
    }

    /// Build the surface, midpoint and interface meshes in corner layout.
    pub fn into_output(self) -> ReaderResult<ReaderOutput> {
        if self.corner_lon.len() != self.corner_lat.len() || self.corner_lat.len() % 4 != 0 {
            return Err(ReaderError::Dimension(format!(
                "{} corner longitudes and {} corner latitudes do not describe quads",
                self.corner_lon.len(),
                self.corner_lat.len()
            )));
        }
        let n_cells = self.num_cells();
        let points: Vec<[f64; 3]> = self
            .corner_lon
            .iter()
            .zip(&self.corner_lat)
            .map(|(lon, lat)| [*lon, *lat, 0.0])
            .collect();
        let horizontal = Mesh::new(points, CellArray::sequential_quads(n_cells));

        let mut surface = horizontal.clone();
        for (name, values) in self.surface.into_iter().chain(self.area.map(|a| (AREA_FIELD.to_string(), a))) {
            if values.len() != n_cells {
                return Err(ReaderError::Dimension(format!(
                    "surface variable '{}' has {} values for {} cells",
                    name,
                    values.len(),
                    n_cells
                )));
            }
            surface.cell_data.insert(name, values);
        }

        let midpoint = stack_layer_mesh(&horizontal, &self.lev, self.midpoint)?;
        let interface = stack_layer_mesh(&horizontal, &self.ilev, self.interface)?;

        Ok(ReaderOutput {
            surface,
            midpoint,
            interface,
            lev: self.lev,
            ilev: self.ilev,
        })
    }
}

/// Category of a variable from its dimension names, following EAM's
/// `(time, ncol)`, `(time, lev, ncol)` and `(time, ilev, ncol)` layouts.
pub fn classify_dimensions<S: AsRef<str>>(dims: &[S]) -> Option<VariableCategory> {
    let names: Vec<&str> = dims.iter().map(|d| d.as_ref()).collect();
    match names.as_slice() {
        ["time", "ncol"] => Some(VariableCategory::Surface),
        ["time", "lev", "ncol"] => Some(VariableCategory::Midpoint),
        ["time", "ilev", "ncol"] => Some(VariableCategory::Interface),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickview_common::mesh::{LEVELS_KEY, NUM_LEVELS_KEY};

    fn raw() -> RawDataset {
        RawDataset {
            corner_lon: vec![0.0, 10.0, 10.0, 0.0, 10.0, 20.0, 20.0, 10.0],
            corner_lat: vec![0.0, 0.0, 10.0, 10.0, 0.0, 0.0, 10.0, 10.0],
            lev: vec![900.0, 500.0, 100.0],
            ilev: vec![950.0, 700.0, 300.0, 50.0],
            area: Some(vec![0.5, 0.5]),
            surface: vec![("TS".into(), vec![280.0, 290.0])],
            midpoint: vec![("T".into(), (0..6).map(|v| v as f64).collect())],
            interface: vec![],
        }
    }

    #[test]
    fn test_into_output() {
        let out = raw().into_output().unwrap();
        assert_eq!(out.surface.num_cells(), 2);
        assert_eq!(out.surface.cell_data[AREA_FIELD], vec![0.5, 0.5]);
        assert_eq!(out.midpoint.num_cells(), 6);
        assert_eq!(out.midpoint.field_data[NUM_LEVELS_KEY], vec![3.0]);
        assert_eq!(out.interface.num_cells(), 8);
        assert_eq!(out.interface.field_data[LEVELS_KEY], out.ilev);
        assert!(out.midpoint.validate().is_ok());
    }

    #[test]
    fn test_layer_length_mismatch() {
        let mut bad = raw();
        bad.midpoint[0].1.pop();
        assert!(matches!(bad.into_output(), Err(ReaderError::Mesh(_))));
    }

    #[test]
    fn test_surface_length_mismatch() {
        let mut bad = raw();
        bad.area = Some(vec![1.0]);
        assert!(matches!(bad.into_output(), Err(ReaderError::Dimension(_))));
    }

    #[test]
    fn test_classify_dimensions() {
        assert_eq!(classify_dimensions(&["time", "ncol"]), Some(VariableCategory::Surface));
        assert_eq!(
            classify_dimensions(&["time", "lev", "ncol"]),
            Some(VariableCategory::Midpoint)
        );
        assert_eq!(
            classify_dimensions(&["time", "ilev", "ncol"]),
            Some(VariableCategory::Interface)
        );
        assert_eq!(classify_dimensions(&["ncol"]), None);
    }
}
