use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const DEFAULT_COOLDOWN_MS: u64 = 750;

/// Per-connection double-submit guard.
///
/// Keyed on `(connection id, action tag)`: a repeat of the same action
/// inside the cooldown window is rejected, different actions never block
/// each other. This absorbs accidental double-clicks, not abuse.
pub struct ActionLimiter {
    cooldown: Duration,
    entries: RwLock<HashMap<(String, &'static str), Instant>>,
}

impl ActionLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Reads `RATE_LIMIT_MS`, falling back to the default cooldown.
    pub fn from_env() -> Self {
        let millis = std::env::var("RATE_LIMIT_MS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_COOLDOWN_MS);
        Self::new(Duration::from_millis(millis))
    }

    /// Records the attempt and reports whether it may proceed.
    pub async fn allow(&self, conn_id: &str, action: &'static str) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let key = (conn_id.to_string(), action);
        match entries.get(&key) {
            Some(last) if now.duration_since(*last) < self.cooldown => false,
            _ => {
                entries.insert(key, now);
                true
            }
        }
    }

    /// Drops entries old enough that they can no longer block anything.
    /// Called from the sweep so the table stays bounded.
    pub async fn prune(&self) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, last| now.duration_since(*last) < self.cooldown);
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
