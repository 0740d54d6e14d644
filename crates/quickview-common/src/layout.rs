//! Grid placement of views in the UI layout.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Views per row in the default layout.
pub const DEFAULT_COLUMNS: usize = 3;
/// Default view width in grid units.
pub const DEFAULT_WIDTH: u32 = 4;
/// Default view height in grid units.
pub const DEFAULT_HEIGHT: u32 = 3;

/// Position and size of one view in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPlacement {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridPlacement {
    /// Row-major default placement for the view at `index`.
    pub fn default_for(index: usize) -> Self {
        Self {
            x: ((index % DEFAULT_COLUMNS) as u32) * DEFAULT_WIDTH,
            y: ((index / DEFAULT_COLUMNS) as u32) * DEFAULT_HEIGHT,
            w: DEFAULT_WIDTH,
            h: DEFAULT_HEIGHT,
        }
    }

    pub fn with_index(self, i: usize) -> LayoutItem {
        LayoutItem {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
            i,
        }
    }
}

/// Published layout entry; `i` is the position in the active variable list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub i: usize,
}

impl LayoutItem {
    pub fn placement(&self) -> GridPlacement {
        GridPlacement {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }
}

/// Re-key a saved layout by variable name.
///
/// Indices that do not address `variables` are dropped.
pub fn rekey_by_name(items: &[LayoutItem], variables: &[String]) -> HashMap<String, GridPlacement> {
    items
        .iter()
        .filter_map(|item| {
            variables
                .get(item.i)
                .map(|name| (name.clone(), item.placement()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_is_row_major() {
        assert_eq!(GridPlacement::default_for(0), GridPlacement { x: 0, y: 0, w: 4, h: 3 });
        assert_eq!(GridPlacement::default_for(2), GridPlacement { x: 8, y: 0, w: 4, h: 3 });
        assert_eq!(GridPlacement::default_for(3), GridPlacement { x: 0, y: 3, w: 4, h: 3 });
        assert_eq!(GridPlacement::default_for(7), GridPlacement { x: 4, y: 6, w: 4, h: 3 });
    }

    #[test]
    fn test_rekey_by_name() {
        let vars = vec!["TS".to_string(), "T".to_string()];
        let items = vec![
            LayoutItem { x: 0, y: 0, w: 6, h: 4, i: 1 },
            LayoutItem { x: 6, y: 0, w: 6, h: 4, i: 0 },
            LayoutItem { x: 0, y: 4, w: 6, h: 4, i: 5 },
        ];
        let keyed = rekey_by_name(&items, &vars);
        assert_eq!(keyed.len(), 2);
        assert_eq!(keyed["T"].x, 0);
        assert_eq!(keyed["TS"].x, 6);
    }
}
