/// Callback state management for inline keyboard interactions.
///
/// Every rendered meal list (search results, favorites view, detail view)
/// stores its hits here under a short random key, so a button tap can be
/// resolved back to a concrete meal.
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// What a stored hit list is rendering. Removal buttons only exist on the
/// favorites view; search and detail views get heart toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Search,
    Favorites,
    Detail,
}

/// A single meal behind an inline keyboard row.
///
/// `id` is the upstream meal id when the hit came from the API; favorites
/// loaded from storage carry no id and resolve details by name.
#[derive(Debug, Clone)]
pub struct MealHit {
    pub id: Option<String>,
    pub name: String,
    pub thumbnail: Option<String>,
    pub area: Option<String>,
    pub tutorial: Option<String>,
}

/// Pending hit list waiting for user button-taps.
#[derive(Debug, Clone)]
pub struct PendingHits {
    pub chat_id: i64,
    pub kind: ViewKind,
    pub title: String,
    pub hits: Vec<MealHit>,
    pub created_at: std::time::Instant,
}

/// Thread-safe store for pending hit lists.
/// Uses peek (not take) so every button in a rendered list stays clickable.
#[derive(Clone)]
pub struct HitStateStore {
    inner: Arc<Mutex<HashMap<String, PendingHits>>>,
}

impl HitStateStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store a hit list keyed by a short random prefix.
    pub async fn store(&self, key: String, pending: PendingHits) {
        debug!("Storing hit state: key={}", key);
        self.inner.lock().await.insert(key, pending);
    }

    /// Return a clone without removing, so the buttons stay active.
    pub async fn peek(&self, key: &str) -> Option<PendingHits> {
        self.inner.lock().await.get(key).cloned()
    }

    /// Replace the hits of an existing entry (after a removal re-render).
    pub async fn update_hits(&self, key: &str, hits: Vec<MealHit>) {
        if let Some(pending) = self.inner.lock().await.get_mut(key) {
            pending.hits = hits;
        }
    }

    /// Remove expired entries (older than TTL).
    pub async fn cleanup_expired(&self, ttl_secs: u64) {
        let now = std::time::Instant::now();
        let mut map = self.inner.lock().await;
        let before = map.len();
        map.retain(|_, v| now.duration_since(v.created_at).as_secs() < ttl_secs);
        let removed = before - map.len();
        if removed > 0 {
            debug!("Cleaned up {} expired hit states", removed);
        }
    }
}

// ====== CALLBACK DATA ======
//
// Format: "op:key:index".
//   mv - open the detail view for a hit
//   mf - toggle the hit in the favorites list
//   fr - remove the hit from the favorites view

/// Encode a detail-view callback.
pub fn encode_view(key: &str, index: usize) -> String {
    format!("mv:{}:{}", key, index)
}

/// Encode a favorite-toggle callback.
pub fn encode_toggle(key: &str, index: usize) -> String {
    format!("mf:{}:{}", key, index)
}

/// Encode a favorites-view removal callback.
pub fn encode_remove(key: &str, index: usize) -> String {
    format!("fr:{}:{}", key, index)
}

/// Decode callback data. Returns (op, key, index).
pub fn decode_callback(data: &str) -> Option<(String, String, usize)> {
    let parts: Vec<&str> = data.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let index: usize = parts[2].parse().ok()?;
    Some((parts[0].to_string(), parts[1].to_string(), index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_roundtrip() {
        assert_eq!(
            decode_callback(&encode_view("a3f2b1", 2)),
            Some(("mv".to_string(), "a3f2b1".to_string(), 2))
        );
        assert_eq!(
            decode_callback(&encode_toggle("a3f2b1", 0)),
            Some(("mf".to_string(), "a3f2b1".to_string(), 0))
        );
        assert_eq!(
            decode_callback(&encode_remove("a3f2b1", 7)),
            Some(("fr".to_string(), "a3f2b1".to_string(), 7))
        );
    }

    #[test]
    fn malformed_callback_is_rejected() {
        assert_eq!(decode_callback("mv:onlykey"), None);
        assert_eq!(decode_callback("mv:key:notanumber"), None);
        assert_eq!(decode_callback(""), None);
    }

    #[tokio::test]
    async fn cleanup_evicts_old_entries() {
        let store = HitStateStore::new();
        store
            .store(
                "k1".to_string(),
                PendingHits {
                    chat_id: 1,
                    kind: ViewKind::Search,
                    title: "Search".to_string(),
                    hits: Vec::new(),
                    created_at: std::time::Instant::now(),
                },
            )
            .await;

        store.cleanup_expired(0).await;
        assert!(store.peek("k1").await.is_none());
    }
}
