//! Variable categories and per-category name lists.

use serde::{Deserialize, Serialize};

/// Vertical placement of a scalar field in the atmosphere column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableCategory {
    /// Defined on the 2D surface.
    Surface,
    /// Defined at vertical-layer midpoints (`lev`).
    Midpoint,
    /// Defined at vertical-layer interfaces (`ilev`).
    Interface,
}

impl VariableCategory {
    pub const ALL: [VariableCategory; 3] = [
        VariableCategory::Surface,
        VariableCategory::Midpoint,
        VariableCategory::Interface,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VariableCategory::Surface => "2D",
            VariableCategory::Midpoint => "3Dm",
            VariableCategory::Interface => "3Di",
        }
    }
}

impl std::fmt::Display for VariableCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Variable names grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableLists {
    pub surface: Vec<String>,
    pub midpoint: Vec<String>,
    pub interface: Vec<String>,
}

impl VariableLists {
    pub fn new(surface: Vec<String>, midpoint: Vec<String>, interface: Vec<String>) -> Self {
        Self {
            surface,
            midpoint,
            interface,
        }
    }

    pub fn get(&self, category: VariableCategory) -> &[String] {
        match category {
            VariableCategory::Surface => &self.surface,
            VariableCategory::Midpoint => &self.midpoint,
            VariableCategory::Interface => &self.interface,
        }
    }

    pub fn get_mut(&mut self, category: VariableCategory) -> &mut Vec<String> {
        match category {
            VariableCategory::Surface => &mut self.surface,
            VariableCategory::Midpoint => &mut self.midpoint,
            VariableCategory::Interface => &mut self.interface,
        }
    }

    /// Surface, then midpoint, then interface names.
    pub fn ordered(&self) -> Vec<String> {
        self.surface
            .iter()
            .chain(self.midpoint.iter())
            .chain(self.interface.iter())
            .cloned()
            .collect()
    }

    pub fn category_of(&self, name: &str) -> Option<VariableCategory> {
        VariableCategory::ALL
            .into_iter()
            .find(|c| self.get(*c).iter().any(|v| v == name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.category_of(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.surface.len() + self.midpoint.len() + self.interface.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only names that also appear in `available` under the same category.
    pub fn restricted_to(&self, available: &VariableLists) -> VariableLists {
        let keep = |category: VariableCategory| -> Vec<String> {
            self.get(category)
                .iter()
                .filter(|v| available.get(category).contains(v))
                .cloned()
                .collect()
        };
        VariableLists {
            surface: keep(VariableCategory::Surface),
            midpoint: keep(VariableCategory::Midpoint),
            interface: keep(VariableCategory::Interface),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lists() -> VariableLists {
        VariableLists::new(
            vec!["TS".into(), "PS".into()],
            vec!["T".into()],
            vec!["OMEGA".into()],
        )
    }

    #[test]
    fn test_ordered_concatenation() {
        assert_eq!(lists().ordered(), vec!["TS", "PS", "T", "OMEGA"]);
    }

    #[test]
    fn test_category_lookup() {
        let l = lists();
        assert_eq!(l.category_of("T"), Some(VariableCategory::Midpoint));
        assert_eq!(l.category_of("OMEGA"), Some(VariableCategory::Interface));
        assert_eq!(l.category_of("Q"), None);
    }

    #[test]
    fn test_restricted_to() {
        let selected = VariableLists::new(vec!["TS".into(), "GONE".into()], vec![], vec![]);
        let r = selected.restricted_to(&lists());
        assert_eq!(r.surface, vec!["TS"]);
        assert_eq!(r.len(), 1);
    }
}
