//! Named pipeline outputs that representations bind to once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use quickview_common::Mesh;
use renderer::MeshSource;

/// Output name of the clipped, projected data surface.
pub const DATA_PORT: &str = "data";
/// Output name of the globe outline or coastlines.
pub const GLOBE_PORT: &str = "globe";
/// Output name of the graticule.
pub const GRIDLINES_PORT: &str = "gridlines";

/// A shared mesh handle whose content is replaced whole.
///
/// Readers always see either the previous or the new mesh, never a partial
/// one.
#[derive(Debug)]
pub struct OutputPort {
    name: String,
    mesh: RwLock<Arc<Mesh>>,
    generation: AtomicU64,
}

impl OutputPort {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            mesh: RwLock::new(Arc::new(Mesh::default())),
            generation: AtomicU64::new(0),
        })
    }

    /// Swap in a new mesh.
    pub fn publish(&self, mesh: Mesh) {
        let mut slot = self.mesh.write().unwrap_or_else(|e| e.into_inner());
        *slot = Arc::new(mesh);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of meshes published so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl MeshSource for OutputPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn current(&self) -> Arc<Mesh> {
        self.mesh.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// The three published outputs.
#[derive(Debug, Clone)]
pub struct OutputPorts {
    pub data: Arc<OutputPort>,
    pub globe: Arc<OutputPort>,
    pub gridlines: Arc<OutputPort>,
}

impl Default for OutputPorts {
    fn default() -> Self {
        Self {
            data: OutputPort::new(DATA_PORT),
            globe: OutputPort::new(GLOBE_PORT),
            gridlines: OutputPort::new(GRIDLINES_PORT),
        }
    }
}

impl OutputPorts {
    pub fn get(&self, name: &str) -> Option<&Arc<OutputPort>> {
        match name {
            DATA_PORT => Some(&self.data),
            GLOBE_PORT => Some(&self.globe),
            GRIDLINES_PORT => Some(&self.gridlines),
            _ => None,
        }
    }
}
