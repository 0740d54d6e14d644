//! Error observer polled by the owner of a reader after each update.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

/// Records that a reader reported an error.
///
/// Readers never return errors from `update`; they notify every attached
/// observer instead. The owner clears the flag before an update and checks
/// it afterwards.
#[derive(Debug, Default)]
pub struct ErrorObserver {
    occurred: AtomicBool,
    message: Mutex<Option<String>>,
}

impl ErrorObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notify(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(error = %message, "Reader reported an error");
        self.occurred.store(true, Ordering::SeqCst);
        let mut slot = self.message.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(message);
    }

    pub fn error_occurred(&self) -> bool {
        self.occurred.load(Ordering::SeqCst)
    }

    /// Message of the most recent error, if any.
    pub fn message(&self) -> Option<String> {
        self.message
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.occurred.store(false, Ordering::SeqCst);
        *self.message.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// The observers attached to one reader.
#[derive(Debug, Default, Clone)]
pub struct ObserverList {
    observers: Vec<Arc<ErrorObserver>>,
}

impl ObserverList {
    pub fn attach(&mut self, observer: Arc<ErrorObserver>) {
        if !self.observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            self.observers.push(observer);
        }
    }

    pub fn notify(&self, message: &str) {
        for observer in &self.observers {
            observer.notify(message);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_and_clear() {
        let observer = ErrorObserver::new();
        assert!(!observer.error_occurred());
        observer.notify("file missing");
        assert!(observer.error_occurred());
        assert_eq!(observer.message().as_deref(), Some("file missing"));
        observer.clear();
        assert!(!observer.error_occurred());
        assert!(observer.message().is_none());
    }

    #[test]
    fn test_attach_is_idempotent() {
        let observer = ErrorObserver::new();
        let mut list = ObserverList::default();
        list.attach(observer.clone());
        list.attach(observer.clone());
        assert_eq!(list.len(), 1);
        list.notify("boom");
        assert!(observer.error_occurred());
    }
}
