use crate::database::db_structs::SeasonId;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex}
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes recalculations per season. Two requests for the same season
/// queue behind each other; different seasons never wait on one another.
#[derive(Default)]
pub struct SeasonLocks {
    locks: Mutex<HashMap<SeasonId, Arc<AsyncMutex<()>>>>
}

impl SeasonLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, season: SeasonId) -> OwnedMutexGuard<()> {
        let lock = {
            // Never held across an await
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(locks.entry(season).or_default())
        };

        lock.lock_owned().await
    }
}
