use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::RwLock;

/// Read-through cache for JSON responses. Entries expire after `ttl`; writers
/// invalidate what they touch.
#[derive(Clone)]
pub struct TtlCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, (Value, Instant)>>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now()).await
    }

    async fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        {
            let guard = self.entries.read().await;
            match guard.get(key) {
                Some((value, stored)) if now.duration_since(*stored) < self.ttl => {
                    return Some(value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired.
        self.entries.write().await.remove(key);
        None
    }

    pub async fn set(&self, key: impl Into<String>, value: Value) {
        self.set_at(key.into(), value, Instant::now()).await;
    }

    async fn set_at(&self, key: String, value: Value, now: Instant) {
        self.entries.write().await.insert(key, (value, now));
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    pub async fn invalidate_prefix(&self, prefix: &str) {
        self.entries
            .write()
            .await
            .retain(|key, _| !key.starts_with(prefix));
    }
}

pub fn leagues_key() -> String {
    "leagues".to_string()
}

pub fn fixtures_key(league_id: i64) -> String {
    format!("league:{}:fixtures", league_id)
}

pub fn league_prefix(league_id: i64) -> String {
    format!("league:{}:", league_id)
}
