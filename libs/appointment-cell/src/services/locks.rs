// libs/appointment-cell/src/services/locks.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

type LockKey = (Uuid, NaiveDate);

/// Serializes check-then-insert for a single dentist's calendar day.
///
/// Bookings for different dentists, or for the same dentist on different days, never
/// wait on each other. Entries nobody holds are pruned on the next acquisition.
#[derive(Default)]
pub struct SchedulingLocks {
    slots: Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
}

impl SchedulingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, dentist_id: Uuid, date: NaiveDate) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            slots.retain(|_, lock| Arc::strong_count(lock) > 1);
            slots
                .entry((dentist_id, date))
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        debug!("Waiting for scheduling lock on dentist {} / {}", dentist_id, date);
        slot.lock_owned().await
    }

    pub fn tracked_keys(&self) -> usize {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}
