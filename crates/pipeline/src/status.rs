//! Pipeline lifecycle states.

use std::fmt;

/// `Unloaded -> Loading -> Valid | Invalid`; a later load may move between
/// `Valid` and `Invalid` through `Loading` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStatus {
    #[default]
    Unloaded,
    Loading,
    Valid,
    Invalid,
}

impl PipelineStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, PipelineStatus::Valid)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStatus::Unloaded => "unloaded",
            PipelineStatus::Loading => "loading",
            PipelineStatus::Valid => "valid",
            PipelineStatus::Invalid => "invalid",
        };
        f.write_str(name)
    }
}
