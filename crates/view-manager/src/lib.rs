//! Views over the QuickView pipeline.
//!
//! - [`ViewRegistry`] keeps one [`ViewContext`] per variable, keyed by name,
//!   surviving deselection until the variable disappears from the data.
//! - [`ViewManager`] implements the refresh protocol over a
//!   [`renderer::RenderBackend`]: layout rebuilds, per-view color settings,
//!   linked cameras and deferred disposal of render targets.
//! - [`PublishedState`] is what the UI binds to; changes are announced by an
//!   explicit [`PublishedState::flush`].
//! - [`Session`] applies UI settings to the pipeline and converts to and
//!   from the persisted state file.

pub mod config;
pub mod context;
pub mod manager;
pub mod math;
pub mod published;
pub mod registry;
pub mod session;

pub use config::ViewDefaults;
pub use context::{ref_name, ViewContext};
pub use manager::{ViewManager, INITIAL_PARALLEL_SCALE};
pub use math::{area_weighted_average, data_range, fit_parallel_scale, pan_offset};
pub use published::{PublishedState, StateField};
pub use registry::ViewRegistry;
pub use session::{Session, SessionSettings};
