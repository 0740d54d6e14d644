//! Common types shared across the QuickView crates: the mesh data model,
//! geographic windows and bounds, variable lists, view layout and the
//! persisted session state.

pub mod bounds;
pub mod error;
pub mod layout;
pub mod mesh;
pub mod state;
pub mod variable;

pub use bounds::{Bounds, GeoWindow};
pub use error::{QuickViewError, QvResult};
pub use layout::{GridPlacement, LayoutItem};
pub use mesh::{CellArray, CellType, FieldMap, Mesh};
pub use state::SavedState;
pub use variable::{VariableCategory, VariableLists};
