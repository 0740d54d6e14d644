//! Name-keyed store of view contexts.
//!
//! Contexts are keyed by variable name. The index into the active display
//! list is recomputed on every rebuild and stored on the context only as a
//! derived value. Registration order is tracked separately from the map and
//! always names exactly the registered variables.

use std::collections::HashMap;

use quickview_common::{QuickViewError, QvResult, VariableLists};

use crate::context::ViewContext;

#[derive(Debug, Default)]
pub struct ViewRegistry {
    contexts: HashMap<String, ViewContext>,
    order: Vec<String>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the context of `ctx.variable`.
    ///
    /// Replacing keeps the variable's original position in the order.
    pub fn register(&mut self, ctx: ViewContext) -> Option<ViewContext> {
        let variable = ctx.variable.clone();
        let previous = self.contexts.insert(variable.clone(), ctx);
        if previous.is_none() {
            self.order.push(variable);
        }
        previous
    }

    pub fn get(&self, variable: &str) -> Option<&ViewContext> {
        self.contexts.get(variable)
    }

    pub fn get_mut(&mut self, variable: &str) -> Option<&mut ViewContext> {
        self.contexts.get_mut(variable)
    }

    /// Like [`get_mut`](Self::get_mut), but a miss is a `ReferenceNotFound`.
    pub fn require_mut(&mut self, variable: &str) -> QvResult<&mut ViewContext> {
        self.contexts
            .get_mut(variable)
            .ok_or_else(|| QuickViewError::reference_not_found(variable))
    }

    pub fn remove(&mut self, variable: &str) -> Option<ViewContext> {
        let ctx = self.contexts.remove(variable)?;
        self.order.retain(|name| name != variable);
        Some(ctx)
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.contexts.contains_key(variable)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Registered variable names in registration order.
    pub fn ordered(&self) -> &[String] {
        &self.order
    }

    /// Contexts in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ViewContext> {
        self.order.iter().filter_map(|name| self.contexts.get(name))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ViewContext> {
        self.contexts.values_mut()
    }

    /// Drop contexts of variables no longer in `available` and return them
    /// in registration order.
    pub fn evict_unavailable(&mut self, available: &VariableLists) -> Vec<ViewContext> {
        let gone: Vec<String> = self
            .order
            .iter()
            .filter(|name| !available.contains(name))
            .cloned()
            .collect();
        gone.iter().filter_map(|name| self.remove(name)).collect()
    }

    pub fn clear(&mut self) -> Vec<ViewContext> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|name| self.contexts.remove(&name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lists(surface: &[&str]) -> VariableLists {
        VariableLists::new(surface.iter().map(|s| s.to_string()).collect(), Vec::new(), Vec::new())
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ViewRegistry::new();
        assert!(registry.register(ViewContext::new("TS", 0, "Jet")).is_none());
        assert!(registry.register(ViewContext::new("TS", 1, "Jet")).is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("TS").map(|c| c.index), Some(1));
    }

    #[test]
    fn test_require_mut_reports_missing() {
        let mut registry = ViewRegistry::new();
        let err = registry.require_mut("PS").unwrap_err();
        assert_eq!(err.kind(), "ReferenceNotFoundError");
    }

    #[test]
    fn test_evict_unavailable() {
        let mut registry = ViewRegistry::new();
        registry.register(ViewContext::new("TS", 0, "Jet"));
        registry.register(ViewContext::new("PS", 1, "Jet"));
        let evicted = registry.evict_unavailable(&lists(&["TS"]));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].variable, "PS");
        assert_eq!(registry.ordered(), ["TS".to_string()]);
    }

    #[test]
    fn test_order_follows_registration() {
        let mut registry = ViewRegistry::new();
        registry.register(ViewContext::new("TS", 0, "Jet"));
        registry.register(ViewContext::new("PS", 1, "Jet"));
        registry.register(ViewContext::new("T", 2, "Jet"));
        // Re-registering keeps the position
        registry.register(ViewContext::new("TS", 3, "Jet"));
        assert_eq!(registry.ordered(), ["TS", "PS", "T"]);

        registry.remove("PS");
        registry.register(ViewContext::new("PS", 1, "Jet"));
        assert_eq!(registry.ordered(), ["TS", "T", "PS"]);

        registry.evict_unavailable(&lists(&["PS", "TS"]));
        assert_eq!(registry.ordered(), ["TS", "PS"]);
        assert_eq!(registry.ordered().len(), registry.len());
        assert!(registry.ordered().iter().all(|name| registry.contains(name)));
        let visited: Vec<&str> = registry.iter().map(|c| c.variable.as_str()).collect();
        assert_eq!(visited, vec!["TS", "PS"]);

        let cleared = registry.clear();
        assert_eq!(cleared.len(), 2);
        assert!(registry.ordered().is_empty());
        assert!(registry.is_empty());
    }
}
