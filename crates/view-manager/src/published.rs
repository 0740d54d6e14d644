//! UI-facing state with explicit change notification.
//!
//! The manager mutates fields in batches, marks what changed and calls
//! [`PublishedState::flush`] once per event. Subscribers receive each
//! changed field exactly once per flush.

use std::collections::BTreeSet;

use serde::Serialize;

use quickview_common::LayoutItem;

/// A group of published fields the UI binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    Variables,
    Views,
    Layout,
    Colormap,
    LogScale,
    Invert,
    ColorRange,
    OverrideRange,
    Average,
    Colorbar,
    AvailableColormaps,
}

type Listener = Box<dyn FnMut(StateField, &PublishedState) + Send>;

/// Per-variable arrays are parallel to `variables`.
#[derive(Default, Serialize)]
pub struct PublishedState {
    pub variables: Vec<String>,
    /// Render reference names, parallel to `variables`.
    pub views: Vec<String>,
    pub layout: Vec<LayoutItem>,
    pub varcolor: Vec<String>,
    pub uselogscale: Vec<bool>,
    pub invert: Vec<bool>,
    pub varmin: Vec<f64>,
    pub varmax: Vec<f64>,
    pub override_range: Vec<bool>,
    pub varaverage: Vec<f64>,
    /// Colorbar PNG data URIs.
    pub colorbar_images: Vec<String>,
    pub colormaps: Vec<String>,

    #[serde(skip)]
    dirty: BTreeSet<StateField>,
    #[serde(skip)]
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for PublishedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishedState")
            .field("variables", &self.variables)
            .field("views", &self.views)
            .field("varcolor", &self.varcolor)
            .field("varmin", &self.varmin)
            .field("varmax", &self.varmax)
            .field("varaverage", &self.varaverage)
            .field("dirty", &self.dirty)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl PublishedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize every per-variable array to `variables.len()`.
    pub fn reset_variables(&mut self, variables: Vec<String>) {
        let n = variables.len();
        self.variables = variables;
        self.views = vec![String::new(); n];
        self.layout.clear();
        self.varcolor = vec![String::new(); n];
        self.uselogscale = vec![false; n];
        self.invert = vec![false; n];
        self.varmin = vec![f64::NAN; n];
        self.varmax = vec![f64::NAN; n];
        self.override_range = vec![false; n];
        self.varaverage = vec![f64::NAN; n];
        self.colorbar_images = vec![String::new(); n];
        self.mark_all();
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn mark(&mut self, field: StateField) {
        self.dirty.insert(field);
    }

    pub fn mark_all(&mut self) {
        self.dirty.extend([
            StateField::Variables,
            StateField::Views,
            StateField::Layout,
            StateField::Colormap,
            StateField::LogScale,
            StateField::Invert,
            StateField::ColorRange,
            StateField::OverrideRange,
            StateField::Average,
            StateField::Colorbar,
        ]);
    }

    pub fn is_dirty(&self, field: StateField) -> bool {
        self.dirty.contains(&field)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(StateField, &PublishedState) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Notify subscribers of every marked field and clear the marks.
    pub fn flush(&mut self) -> Vec<StateField> {
        let changed: Vec<StateField> = std::mem::take(&mut self.dirty).into_iter().collect();
        if changed.is_empty() {
            return changed;
        }

        let mut listeners = std::mem::take(&mut self.listeners);
        for field in &changed {
            for listener in listeners.iter_mut() {
                listener(*field, self);
            }
        }
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_reset_sizes_arrays() {
        let mut state = PublishedState::new();
        state.reset_variables(vec!["TS".to_string(), "PS".to_string()]);
        assert_eq!(state.varmin.len(), 2);
        assert_eq!(state.colorbar_images.len(), 2);
        assert!(state.varaverage[1].is_nan());
        assert!(state.is_dirty(StateField::Layout));
    }

    #[test]
    fn test_flush_notifies_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut state = PublishedState::new();
        state.subscribe(move |field, state| {
            sink.lock().unwrap().push((field, state.varcolor.clone()));
        });
        state.varcolor = vec!["Jet".to_string()];
        state.mark(StateField::Colormap);
        state.mark(StateField::Colormap);

        assert_eq!(state.flush(), vec![StateField::Colormap]);
        assert!(state.flush().is_empty());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, vec!["Jet".to_string()]);
    }
}
