//! Single-subscriber callback slot.

use std::sync::Arc;

use parking_lot::Mutex;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Holds at most one callback. Registering a new one replaces the old.
///
/// The callback is cloned out of the lock before it runs, so it may re-register
/// without deadlocking.
pub(crate) struct Observer<T> {
    slot: Mutex<Option<Callback<T>>>,
}

impl<T> Observer<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn set<F>(&self, callback: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        *self.slot.lock() = Some(Arc::new(callback));
    }

    /// Invoke the current callback, if any. Returns whether one ran.
    pub fn emit(&self, value: &T) -> bool {
        let callback = self.slot.lock().clone();
        match callback {
            Some(callback) => {
                callback(value);
                true
            }
            None => false,
        }
    }
}
