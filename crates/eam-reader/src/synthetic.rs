//! Deterministic in-memory reader for demos and tests.
//!
//! Fields are analytic functions of cell center, layer and time step so that
//! expected values can be computed in tests without any data files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use quickview_common::{VariableCategory, VariableLists};

use crate::error::{ReaderError, ReaderResult};
use crate::observer::ErrorObserver;
use crate::reader::{DataReader, RawDataset, ReaderOutput, ReaderState};

/// One analytic variable.
///
/// `value = base + amplitude * cos(lat) * sin(lon + 15° * t) + level_step * k`
/// for layer `k` and time index `t`. Cells poleward of `missing_poleward_of`
/// hold NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticVariable {
    pub name: String,
    pub category: VariableCategory,
    pub base: f64,
    pub amplitude: f64,
    pub level_step: f64,
    pub missing_poleward_of: Option<f64>,
}

impl SyntheticVariable {
    pub fn new(name: &str, category: VariableCategory, base: f64, amplitude: f64) -> Self {
        Self {
            name: name.to_string(),
            category,
            base,
            amplitude,
            level_step: 0.0,
            missing_poleward_of: None,
        }
    }

    pub fn with_level_step(mut self, step: f64) -> Self {
        self.level_step = step;
        self
    }

    pub fn with_missing_poleward_of(mut self, lat: f64) -> Self {
        self.missing_poleward_of = Some(lat);
        self
    }

    /// Value at a cell centered on `(lon, lat)` in layer `layer` at time index `time`.
    pub fn value_at(&self, lon: f64, lat: f64, layer: usize, time: usize) -> f64 {
        if self.missing_poleward_of.is_some_and(|limit| lat.abs() > limit) {
            return f64::NAN;
        }
        let phase = (lon + 15.0 * time as f64).to_radians();
        self.base + self.amplitude * lat.to_radians().cos() * phase.sin()
            + self.level_step * layer as f64
    }
}

/// Grid, vertical coordinates, time axis and variables of a synthetic file.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDataset {
    pub n_lon: usize,
    pub n_lat: usize,
    pub lev: Vec<f64>,
    pub ilev: Vec<f64>,
    pub timesteps: Vec<f64>,
    pub variables: Vec<SyntheticVariable>,
}

impl SyntheticDataset {
    /// A small EAM-like dataset: surface, midpoint and interface fields on
    /// a 36 x 18 grid with 8 levels and 3 time steps.
    pub fn demo() -> Self {
        use VariableCategory::*;
        let lev: Vec<f64> = (0..8).map(|k| 950.0 - 120.0 * k as f64).collect();
        let ilev: Vec<f64> = (0..9).map(|k| 1000.0 - 120.0 * k as f64).collect();
        Self {
            n_lon: 36,
            n_lat: 18,
            lev,
            ilev,
            timesteps: vec![0.0, 0.25, 0.5],
            variables: vec![
                SyntheticVariable::new("TS", Surface, 270.0, 30.0),
                SyntheticVariable::new("PS", Surface, 98_000.0, 2_000.0),
                SyntheticVariable::new("PRECT", Surface, 5.0e-8, 4.0e-8)
                    .with_missing_poleward_of(80.0),
                SyntheticVariable::new("T", Midpoint, 290.0, 10.0).with_level_step(-8.0),
                SyntheticVariable::new("Q", Midpoint, 0.01, 0.005).with_level_step(-0.001),
                SyntheticVariable::new("CMFMC", Interface, 0.02, 0.01).with_level_step(0.002),
            ],
        }
    }

    pub fn variable_lists(&self) -> VariableLists {
        let mut lists = VariableLists::default();
        for v in &self.variables {
            lists.get_mut(v.category).push(v.name.clone());
        }
        lists
    }

    fn variable(&self, name: &str) -> Option<&SyntheticVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Arrays for the `active` variables at time index `time`.
    pub fn raw(&self, active: &VariableLists, time: usize) -> ReaderResult<RawDataset> {
        if time >= self.timesteps.len() {
            return Err(ReaderError::MissingData(format!(
                "time index {} (file has {} steps)",
                time,
                self.timesteps.len()
            )));
        }
        let dlon = 360.0 / self.n_lon as f64;
        let dlat = 180.0 / self.n_lat as f64;
        let n_cells = self.n_lon * self.n_lat;

        let mut raw = RawDataset {
            lev: self.lev.clone(),
            ilev: self.ilev.clone(),
            ..Default::default()
        };
        let mut centers = Vec::with_capacity(n_cells);
        let mut area = Vec::with_capacity(n_cells);
        for row in 0..self.n_lat {
            let lat0 = -90.0 + row as f64 * dlat;
            let lat1 = lat0 + dlat;
            for col in 0..self.n_lon {
                let lon0 = col as f64 * dlon;
                let lon1 = lon0 + dlon;
                raw.corner_lon.extend_from_slice(&[lon0, lon1, lon1, lon0]);
                raw.corner_lat.extend_from_slice(&[lat0, lat0, lat1, lat1]);
                centers.push(((lon0 + lon1) / 2.0, (lat0 + lat1) / 2.0));
                area.push(
                    dlon.to_radians() * (lat1.to_radians().sin() - lat0.to_radians().sin()),
                );
            }
        }
        raw.area = Some(area);

        for category in VariableCategory::ALL {
            let layers = match category {
                VariableCategory::Surface => 1,
                VariableCategory::Midpoint => self.lev.len(),
                VariableCategory::Interface => self.ilev.len(),
            };
            for name in active.get(category) {
                let var = self
                    .variable(name)
                    .filter(|v| v.category == category)
                    .ok_or_else(|| {
                        ReaderError::MissingData(format!("{} variable '{}'", category, name))
                    })?;
                let values: Vec<f64> = (0..layers)
                    .flat_map(|k| {
                        centers
                            .iter()
                            .map(move |(lon, lat)| var.value_at(*lon, *lat, k, time))
                    })
                    .collect();
                let target = match category {
                    VariableCategory::Surface => &mut raw.surface,
                    VariableCategory::Midpoint => &mut raw.midpoint,
                    VariableCategory::Interface => &mut raw.interface,
                };
                target.push((name.clone(), values));
            }
        }
        Ok(raw)
    }
}

/// A [`DataReader`] serving a [`SyntheticDataset`] for any file pair.
///
/// File names are only used for failure injection: an update with a data
/// file registered through [`SyntheticReader::fail_on`] reports an error.
#[derive(Debug)]
pub struct SyntheticReader {
    dataset: SyntheticDataset,
    state: ReaderState,
    failing_files: HashSet<PathBuf>,
    updates: usize,
}

impl SyntheticReader {
    pub fn new(dataset: SyntheticDataset) -> Self {
        Self {
            dataset,
            state: ReaderState::default(),
            failing_files: HashSet::new(),
            updates: 0,
        }
    }

    pub fn demo() -> Self {
        Self::new(SyntheticDataset::demo())
    }

    /// Make updates fail while `data_file` is bound.
    pub fn fail_on(mut self, data_file: impl Into<PathBuf>) -> Self {
        self.failing_files.insert(data_file.into());
        self
    }

    /// Number of update calls so far.
    pub fn update_count(&self) -> usize {
        self.updates
    }

    pub fn dataset(&self) -> &SyntheticDataset {
        &self.dataset
    }

    fn read(&self) -> ReaderResult<ReaderOutput> {
        let (data, _conn) = self.state.files()?;
        if self.failing_files.contains(data) {
            return Err(ReaderError::Open {
                path: data.display().to_string(),
                reason: "injected failure".to_string(),
            });
        }
        self.dataset
            .raw(&self.state.active, self.state.time_index)?
            .into_output()
    }
}

impl DataReader for SyntheticReader {
    fn set_files(&mut self, data_file: &Path, conn_file: &Path) {
        self.state.data_file = Some(data_file.to_path_buf());
        self.state.conn_file = Some(conn_file.to_path_buf());
        self.state.available = self.dataset.variable_lists();
        self.state.timesteps = self.dataset.timesteps.clone();
        info!(
            data_file = %data_file.display(),
            variables = self.state.available.len(),
            "Bound synthetic dataset"
        );
    }

    fn set_layers(&mut self, midpoint: usize, interface: usize) {
        self.state.midpoint_layer = midpoint;
        self.state.interface_layer = interface;
    }

    fn set_active_variables(&mut self, variables: &VariableLists) {
        self.state.active = variables.clone();
    }

    fn set_time_index(&mut self, index: usize) {
        self.state.time_index = index;
    }

    fn attach_observer(&mut self, observer: Arc<ErrorObserver>) {
        self.state.observers.attach(observer);
    }

    fn update(&mut self) {
        self.updates += 1;
        debug!(update = self.updates, time_index = self.state.time_index, "Synthetic update");
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
