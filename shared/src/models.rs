/// Database and domain models shared across all Larder crates.
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Telegram user who contacted the bot or logged into the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub chat_id: i64,
    pub username: Option<String>,
    pub is_admin: bool,
    pub first_seen: NaiveDateTime,
    pub last_activity: NaiveDateTime,
}

/// A meal saved to a user's favorites list.
///
/// This is the persisted record: the whole list is serialized as a JSON
/// array into one storage slot per chat. `name` is the unique key within
/// the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteMeal {
    pub name: String,
    pub image: Option<String>,
    pub area: Option<String>,
}

/// Compact hit shown in search result lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealSummary {
    pub id: String,
    pub name: String,
    pub thumbnail: Option<String>,
    pub area: Option<String>,
}

impl MealSummary {
    /// Convert into the persisted favorite record.
    pub fn to_favorite(&self) -> FavoriteMeal {
        FavoriteMeal {
            name: self.name.clone(),
            image: self.thumbnail.clone(),
            area: self.area.clone(),
        }
    }
}
