//! Supported projection names.

use std::fmt;
use std::str::FromStr;

use quickview_common::{QuickViewError, QvResult};

/// The closed set of map projections offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProjectionKind {
    /// Plate carrée: identity on (lon, lat).
    #[default]
    CylEquidistant,
    Robinson,
    Mollweide,
}

impl ProjectionKind {
    pub const ALL: [ProjectionKind; 3] = [
        ProjectionKind::CylEquidistant,
        ProjectionKind::Robinson,
        ProjectionKind::Mollweide,
    ];

    /// Parse a user-facing projection name.
    pub fn from_name(name: &str) -> QvResult<Self> {
        match name.trim() {
            "Cyl. Equidistant" => Ok(ProjectionKind::CylEquidistant),
            "Robinson" => Ok(ProjectionKind::Robinson),
            "Mollweide" => Ok(ProjectionKind::Mollweide),
            other => Err(QuickViewError::unsupported_projection(other)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProjectionKind::CylEquidistant => "Cyl. Equidistant",
            ProjectionKind::Robinson => "Robinson",
            ProjectionKind::Mollweide => "Mollweide",
        }
    }

    /// Whether output coordinates are meters rather than degrees.
    pub fn is_metric(&self) -> bool {
        !matches!(self, ProjectionKind::CylEquidistant)
    }
}

impl FromStr for ProjectionKind {
    type Err = QuickViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
