use alloc::sync::Arc;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::any::{Map, TypeInfo};

/// Async mutex per type, created on first use.
///
/// Clones share the same mutexes. Distinct types never share one, so a holder may wait for
/// another type's mutex, but not for its own.
#[derive(Clone, Default)]
pub(crate) struct KeyedSharedLocks {
    locks: Arc<Mutex<Map<Arc<AsyncMutex<()>>>>>,
}

impl KeyedSharedLocks {
    #[must_use]
    pub(crate) fn get(&self, type_info: TypeInfo) -> Arc<AsyncMutex<()>> {
        self.locks.lock().entry(type_info).or_default().clone()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().len()
    }
}
