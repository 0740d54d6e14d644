//! EAM reader backed by libnetcdf.
//!
//! The data file holds `(time, ncol)`, `(time, lev, ncol)` and
//! `(time, ilev, ncol)` variables plus the `lev`, `ilev` and `time`
//! coordinates. The connectivity file holds the four corner coordinates of
//! every physics-grid column as `cell_corner_lon` / `cell_corner_lat`
//! (SCRIP files name them `grid_corner_lon` / `grid_corner_lat`).

use std::path::Path;
use std::sync::{Arc, Once};

use tracing::{debug, info, warn};

use quickview_common::{VariableCategory, VariableLists};

use crate::error::{ReaderError, ReaderResult};
use crate::observer::ErrorObserver;
use crate::reader::{classify_dimensions, DataReader, RawDataset, ReaderOutput, ReaderState, AREA_FIELD};

const CORNER_LON_NAMES: [&str; 2] = ["cell_corner_lon", "grid_corner_lon"];
const CORNER_LAT_NAMES: [&str; 2] = ["cell_corner_lat", "grid_corner_lat"];

/// Silence HDF5's automatic error printing to stderr.
///
/// Probing optional attributes makes HDF5 print diagnostics even though the
/// caller handles the missing case. Safe to call more than once.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 with null handlers only disables the automatic
        // error stack printing.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Reads EAM output with the native NetCDF library.
#[derive(Debug, Default)]
pub struct NetCdfReader {
    state: ReaderState,
}

impl NetCdfReader {
    pub fn new() -> Self {
        silence_hdf5_errors();
        Self::default()
    }

    /// Scan the data file for variables and time steps.
    fn scan(&mut self, data_file: &Path) -> ReaderResult<()> {
        let file = open(data_file)?;
        let mut available = VariableLists::default();
        for var in file.variables() {
            let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
            if let Some(category) = classify_dimensions(&dims) {
                available.get_mut(category).push(var.name());
            }
        }
        let timesteps = match file.variable("time") {
            Some(var) => var.get_values::<f64, _>(..)?,
            None => Vec::new(),
        };
        info!(
            data_file = %data_file.display(),
            surface = available.surface.len(),
            midpoint = available.midpoint.len(),
            interface = available.interface.len(),
            timesteps = timesteps.len(),
            "Scanned EAM data file"
        );
        self.state.available = available;
        self.state.timesteps = timesteps;
        Ok(())
    }

    fn read(&self) -> ReaderResult<ReaderOutput> {
        let (data_path, conn_path) = self.state.files()?;
        let conn = open(conn_path)?;
        let data = open(data_path)?;

        let corner_lon = read_first_of(&conn, &CORNER_LON_NAMES)?;
        let corner_lat = read_first_of(&conn, &CORNER_LAT_NAMES)?;
        let n_cells = corner_lat.len() / 4;

        let mut raw = RawDataset {
            corner_lon,
            corner_lat,
            lev: read_coordinate(&data, "lev")?,
            ilev: read_coordinate(&data, "ilev")?,
            ..Default::default()
        };

        raw.area = match data.variable(AREA_FIELD) {
            Some(var) => Some(read_values(&var)?),
            None => {
                debug!("Data file has no area variable");
                None
            }
        };

        let time = self.state.time_index;
        for category in VariableCategory::ALL {
            let layers = match category {
                VariableCategory::Surface => 1,
                VariableCategory::Midpoint => raw.lev.len(),
                VariableCategory::Interface => raw.ilev.len(),
            };
            let per_step = layers * n_cells;
            for name in self.state.active.get(category) {
                let var = data
                    .variable(name)
                    .ok_or_else(|| ReaderError::MissingData(format!("{} variable '{}'", category, name)))?;
                let all = read_values(&var)?;
                let start = time * per_step;
                let step = all.get(start..start + per_step).ok_or_else(|| {
                    ReaderError::Dimension(format!(
                        "'{}' has {} values, time index {} needs {}",
                        name,
                        all.len(),
                        time,
                        start + per_step
                    ))
                })?;
                let target = match category {
                    VariableCategory::Surface => &mut raw.surface,
                    VariableCategory::Midpoint => &mut raw.midpoint,
                    VariableCategory::Interface => &mut raw.interface,
                };
                target.push((name.clone(), step.to_vec()));
            }
        }
        raw.into_output()
    }
}

impl DataReader for NetCdfReader {
    fn set_files(&mut self, data_file: &Path, conn_file: &Path) {
        self.state.data_file = Some(data_file.to_path_buf());
        self.state.conn_file = Some(conn_file.to_path_buf());
        if let Err(err) = self.scan(data_file) {
            self.state.available = VariableLists::default();
            self.state.timesteps.clear();
            self.state.observers.notify(&err.to_string());
        }
    }

    fn set_layers(&mut self, midpoint: usize, interface: usize) {
        self.state.midpoint_layer = midpoint;
        self.state.interface_layer = interface;
    }

    fn set_active_variables(&mut self, variables: &VariableLists) {
        self.state.active = variables.clone();
    }

    fn set_time_index(&mut self, index: usize) {
        if index >= self.state.timesteps.len() && !self.state.timesteps.is_empty() {
            warn!(index, steps = self.state.timesteps.len(), "Time index beyond file");
        }
        self.state.time_index = index;
    }

    fn attach_observer(&mut self, observer: Arc<ErrorObserver>) {
        self.state.observers.attach(observer);
    }

    fn update(&mut self) {
        let result = self.read();
        self.state.finish(result);
    }

    fn output(&self) -> Option<&ReaderOutput> {
        self.state.output.as_ref()
    }

    fn available_variables(&self) -> VariableLists {
        self.state.available.clone()
    }

    fn timesteps(&self) -> Vec<f64> {
        self.state.timesteps.clone()
    }
}

fn open(path: &Path) -> ReaderResult<netcdf::File> {
    netcdf::open(path).map_err(|e| ReaderError::Open {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn read_first_of(file: &netcdf::File, names: &[&str]) -> ReaderResult<Vec<f64>> {
    for name in names {
        if let Some(var) = file.variable(name) {
            return read_values(&var);
        }
    }
    Err(ReaderError::MissingData(names.join(" or ")))
}

fn read_coordinate(file: &netcdf::File, name: &str) -> ReaderResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| ReaderError::MissingData(format!("{} coordinate", name)))?;
    read_values(&var)
}

/// All values of a variable as f64 with `_FillValue` replaced by NaN.
fn read_values(var: &netcdf::Variable) -> ReaderResult<Vec<f64>> {
    let mut values: Vec<f64> = var.get_values::<f64, _>(..)?;
    if let Some(fill) = get_f64_attr(var, "_FillValue") {
        for v in values.iter_mut().filter(|v| **v == fill) {
            *v = f64::NAN;
        }
    }
    Ok(values)
}

/// Check for an attribute without triggering HDF5 diagnostics.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let value = var.attribute_value(name)?.ok()?;
    f64::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_reported() {
        let mut reader = NetCdfReader::new();
        let observer = ErrorObserver::new();
        reader.attach_observer(observer.clone());
        reader.set_files(Path::new("/nonexistent/eam.nc"), Path::new("/nonexistent/conn.nc"));
        assert!(observer.error_occurred());
        assert!(reader.available_variables().is_empty());

        observer.clear();
        reader.update();
        assert!(observer.error_occurred());
        assert!(reader.output().is_none());
    }

    #[test]
    fn test_update_without_files() {
        let mut reader = NetCdfReader::new();
        let observer = ErrorObserver::new();
        reader.attach_observer(observer.clone());
        reader.update();
        assert!(observer.message().unwrap_or_default().contains("must both be provided"));
    }
}
