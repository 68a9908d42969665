use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// One writer per league. Waiver processing, joins, trades, drafts and fixture
/// regeneration hold the league's guard across load, compute and persist.
#[derive(Clone, Default)]
pub struct LeagueLocks {
    locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl LeagueLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, league_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut guard = self.locks.lock().await;
            /* Nobody holds or waits on a lock the map alone references */
            guard.retain(|id, lock| *id == league_id || Arc::strong_count(lock) > 1);
            guard.entry(league_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
