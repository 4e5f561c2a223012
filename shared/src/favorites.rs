/// Persisted favorites list, stored as a JSON array in a single storage
/// slot per chat.
///
/// The slot behaves like a browser localStorage entry: every operation
/// reads the whole list, modifies it in memory, and writes it back.
/// Concurrent writers race on the slot and the last write wins.
use anyhow::Result;
use sqlx::SqlitePool;
use tracing::warn;

use crate::db;
use crate::models::FavoriteMeal;

/// Storage slot name for a chat's favorites list.
fn favorites_slot(chat_id: i64) -> String {
    format!("favorites:{}", chat_id)
}

/// Favorites list store. Records are keyed by meal name within each
/// chat's slot; insertion order is preserved.
#[derive(Clone)]
pub struct FavoritesStore {
    pool: SqlitePool,
}

impl FavoritesStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the current list for a chat.
    ///
    /// A missing slot reads as an empty list. A malformed slot is logged
    /// and also reads as empty rather than wedging every favorites
    /// operation on bad data; the next successful write repairs it.
    pub async fn list(&self, chat_id: i64) -> Result<Vec<FavoriteMeal>> {
        let slot = favorites_slot(chat_id);
        let raw = match db::slot_get(&self.pool, &slot).await? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };

        match serde_json::from_str(&raw) {
            Ok(list) => Ok(list),
            Err(e) => {
                warn!("Malformed favorites slot {}: {}", slot, e);
                Ok(Vec::new())
            }
        }
    }

    /// Membership test by meal name.
    pub async fn contains(&self, chat_id: i64, name: &str) -> Result<bool> {
        Ok(self.list(chat_id).await?.iter().any(|f| f.name == name))
    }

    /// Number of favorites for a chat.
    pub async fn count(&self, chat_id: i64) -> Result<usize> {
        Ok(self.list(chat_id).await?.len())
    }

    /// Add a meal. No-op when a record with the same name is already
    /// present. Returns true if the list changed.
    pub async fn add(&self, chat_id: i64, meal: FavoriteMeal) -> Result<bool> {
        let mut list = self.list(chat_id).await?;
        if list.iter().any(|f| f.name == meal.name) {
            return Ok(false);
        }

        list.push(meal);
        self.save(chat_id, &list).await?;
        Ok(true)
    }

    /// Remove a meal by name. No-op when absent. Returns true if the list
    /// changed.
    pub async fn remove(&self, chat_id: i64, name: &str) -> Result<bool> {
        let mut list = self.list(chat_id).await?;
        let before = list.len();
        list.retain(|f| f.name != name);
        if list.len() == before {
            return Ok(false);
        }

        self.save(chat_id, &list).await?;
        Ok(true)
    }

    /// Toggle membership: add when absent, remove when present.
    /// Returns true if the meal is a favorite after the call.
    pub async fn toggle(&self, chat_id: i64, meal: FavoriteMeal) -> Result<bool> {
        let mut list = self.list(chat_id).await?;
        match list.iter().position(|f| f.name == meal.name) {
            Some(pos) => {
                list.remove(pos);
                self.save(chat_id, &list).await?;
                Ok(false)
            }
            None => {
                list.push(meal);
                self.save(chat_id, &list).await?;
                Ok(true)
            }
        }
    }

    /// Serialize the whole list back into the slot (last write wins).
    async fn save(&self, chat_id: i64, list: &[FavoriteMeal]) -> Result<()> {
        let raw = serde_json::to_string(list)?;
        db::slot_put(&self.pool, &favorites_slot(chat_id), &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> FavoritesStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        FavoritesStore::new(pool)
    }

    fn meal(name: &str) -> FavoriteMeal {
        FavoriteMeal {
            name: name.to_string(),
            image: Some(format!("https://example.com/{}.jpg", name)),
            area: Some("Italian".to_string()),
        }
    }

    #[tokio::test]
    async fn empty_slot_reads_as_empty_list() {
        let store = test_store().await;
        assert!(store.list(1).await.unwrap().is_empty());
        assert!(!store.contains(1, "Arrabiata").await.unwrap());
    }

    #[tokio::test]
    async fn add_then_list_and_contains() {
        let store = test_store().await;
        assert!(store.add(1, meal("Arrabiata")).await.unwrap());

        let list = store.list(1).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Arrabiata");
        assert!(store.contains(1, "Arrabiata").await.unwrap());
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let store = test_store().await;
        assert!(store.add(1, meal("Lasagne")).await.unwrap());
        assert!(!store.add(1, meal("Lasagne")).await.unwrap());
        assert_eq!(store.count(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = test_store().await;
        store.add(1, meal("Lasagne")).await.unwrap();

        assert!(store.remove(1, "Lasagne").await.unwrap());
        assert!(!store.remove(1, "Lasagne").await.unwrap());
        assert!(store.list(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = test_store().await;
        store.add(1, meal("Arrabiata")).await.unwrap();
        store.add(1, meal("Lasagne")).await.unwrap();
        store.add(1, meal("Carbonara")).await.unwrap();
        store.remove(1, "Lasagne").await.unwrap();
        store.add(1, meal("Tiramisu")).await.unwrap();

        let names: Vec<String> = store
            .list(1)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Arrabiata", "Carbonara", "Tiramisu"]);
    }

    #[tokio::test]
    async fn toggle_roundtrip() {
        let store = test_store().await;
        assert!(store.toggle(1, meal("Poutine")).await.unwrap());
        assert!(store.contains(1, "Poutine").await.unwrap());

        assert!(!store.toggle(1, meal("Poutine")).await.unwrap());
        assert!(!store.contains(1, "Poutine").await.unwrap());
    }

    #[tokio::test]
    async fn chats_are_isolated() {
        let store = test_store().await;
        store.add(1, meal("Arrabiata")).await.unwrap();

        assert!(store.list(2).await.unwrap().is_empty());
        store.add(2, meal("Poutine")).await.unwrap();
        assert_eq!(store.count(1).await.unwrap(), 1);
        assert_eq!(store.count(2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn malformed_slot_reads_as_empty_and_is_repaired() {
        let store = test_store().await;
        crate::db::slot_put(&store.pool, "favorites:1", "{not json")
            .await
            .unwrap();

        assert!(store.list(1).await.unwrap().is_empty());

        // The next write replaces the bad payload
        assert!(store.add(1, meal("Arrabiata")).await.unwrap());
        let raw = crate::db::slot_get(&store.pool, "favorites:1")
            .await
            .unwrap()
            .unwrap();
        let parsed: Vec<FavoriteMeal> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[tokio::test]
    async fn persisted_shape_matches_browser_records() {
        let store = test_store().await;
        store.add(7, meal("Arrabiata")).await.unwrap();

        let raw = crate::db::slot_get(&store.pool, "favorites:7")
            .await
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let first = &value.as_array().unwrap()[0];
        assert!(first.get("name").is_some());
        assert!(first.get("image").is_some());
        assert!(first.get("area").is_some());
    }
}
