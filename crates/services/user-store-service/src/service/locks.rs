//! Per-identity mutual exclusion.
//!
//! Every read-modify-write of a record (in-place update, migration,
//! reconciliation of a marker) runs while holding the lock for the id it
//! starts from. Locks are in-process only.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Single-flight locks keyed by record id.
#[derive(Clone, Default)]
pub struct IdentityLocks {
    slots: Arc<Mutex<HashMap<Uuid, Weak<AsyncMutex<()>>>>>,
}

/// Held for the duration of one operation on an identity.
pub struct IdentityGuard {
    _guard: OwnedMutexGuard<()>,
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other task holds `id`, then hold it.
    pub async fn acquire(&self, id: Uuid) -> IdentityGuard {
        let lock = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.retain(|_, slot| slot.strong_count() > 0);

            match slots.get(&id).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    slots.insert(id, Arc::downgrade(&lock));
                    lock
                }
            }
        };

        IdentityGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of ids currently held or awaited.
    pub fn active(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.values().filter(|slot| slot.strong_count() > 0).count()
    }
}
