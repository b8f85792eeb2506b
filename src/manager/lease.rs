//! Scoped model leases.
//!
//! A lease pins a resident model for as long as it lives. Dropping it (or
//! calling `release`) decrements the entry's reference count; the model
//! stays resident and merely becomes eligible for eviction again.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use super::resident::ResidentState;

/// RAII guard that keeps a model resident until dropped.
pub struct ModelLease<H> {
    model_id: String,
    handle: H,
    state: Arc<Mutex<ResidentState<H>>>,
}

impl<H> ModelLease<H> {
    /// Only created after the reference count was incremented.
    pub(crate) fn new(model_id: String, handle: H, state: Arc<Mutex<ResidentState<H>>>) -> Self {
        Self {
            model_id,
            handle,
            state,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Give up the lease now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl<H> Deref for ModelLease<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H> fmt::Debug for ModelLease<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelLease")
            .field("model_id", &self.model_id)
            .finish_non_exhaustive()
    }
}

impl<H> Drop for ModelLease<H> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        match state.get_mut(&self.model_id) {
            Some(entry) => {
                entry.active_refs = entry.active_refs.saturating_sub(1);
                tracing::trace!(
                    model_id = %self.model_id,
                    active_refs = entry.active_refs,
                    "lease released"
                );
            }
            // Pinned entries cannot be evicted, so this means a bookkeeping bug.
            None => tracing::error!(model_id = %self.model_id, "lease released for non-resident model"),
        }
    }
}
