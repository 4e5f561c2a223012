/// TheMealDB API client and wire types.
///
/// Every endpoint of the upstream returns a single JSON object whose
/// `meals` field is either an array of meal records or null. Null is the
/// upstream's way of reporting "no matches" and is always surfaced as an
/// empty list, never as an error.
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::MealDbError;
use crate::models::MealSummary;

/// Default public API root (v1, shared developer key).
pub const DEFAULT_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1";

/// Request timeout for upstream calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// ====== WIRE TYPES ======

/// Response envelope shared by all endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealsEnvelope {
    pub meals: Option<Vec<MealRecord>>,
}

impl MealsEnvelope {
    /// Parse from a raw JSON body.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Flatten the envelope: null becomes an empty list.
    pub fn into_meals(self) -> Vec<MealRecord> {
        self.meals.unwrap_or_default()
    }
}

/// Full meal record as returned by the API.
///
/// The upstream encodes ingredients as twenty numbered
/// `strIngredientN` / `strMeasureN` column pairs; those stay in `extra`
/// and are reassembled by [`MealRecord::ingredients`]. Filter endpoints
/// return partial records (id, name, thumbnail only), which deserialize
/// with the remaining fields as None.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealRecord {
    #[serde(rename = "idMeal")]
    pub id: String,
    #[serde(rename = "strMeal")]
    pub name: String,
    #[serde(rename = "strMealThumb")]
    pub thumbnail: Option<String>,
    #[serde(rename = "strArea")]
    pub area: Option<String>,
    #[serde(rename = "strCategory")]
    pub category: Option<String>,
    #[serde(rename = "strTags")]
    pub tags: Option<String>,
    #[serde(rename = "strInstructions")]
    pub instructions: Option<String>,
    #[serde(rename = "strYoutube")]
    pub youtube: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MealRecord {
    /// Compact summary for result lists.
    pub fn summary(&self) -> MealSummary {
        MealSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            thumbnail: self.thumbnail.clone(),
            area: self.area.clone(),
        }
    }

    /// Comma-separated tags split into a clean list.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reassemble (ingredient, measure) pairs from the numbered columns.
    /// Empty and null slots are skipped.
    pub fn ingredients(&self) -> Vec<(String, String)> {
        let field = |prefix: &str, i: usize| -> String {
            self.extra
                .get(&format!("{}{}", prefix, i))
                .and_then(|v| v.as_str())
                .map(str::trim)
                .unwrap_or("")
                .to_string()
        };

        let mut out = Vec::new();
        for i in 1..=20 {
            let ingredient = field("strIngredient", i);
            if ingredient.is_empty() {
                continue;
            }
            out.push((ingredient, field("strMeasure", i)));
        }
        out
    }

    /// YouTube tutorial link, if the record carries a non-empty one.
    pub fn tutorial_url(&self) -> Option<&str> {
        self.youtube.as_deref().filter(|u| !u.is_empty())
    }
}

/// Case-insensitive substring refinement of search hits.
///
/// The upstream search is fuzzy (it matches across words and typos); the
/// rendered list only shows meals whose name actually contains the query.
pub fn refine_by_name(meals: Vec<MealRecord>, query: &str) -> Vec<MealRecord> {
    let needle = query.to_lowercase();
    meals
        .into_iter()
        .filter(|m| m.name.to_lowercase().contains(&needle))
        .collect()
}

// ====== CLIENT ======

/// HTTP client for TheMealDB.
#[derive(Clone)]
pub struct MealDbClient {
    http: reqwest::Client,
    base_url: String,
}

impl MealDbClient {
    /// Create a client. `base_url` has no trailing slash; pass
    /// [`DEFAULT_BASE_URL`] for the public API.
    pub fn new(base_url: impl Into<String>) -> Result<Self, MealDbError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("larder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MealDbError::Network)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Perform one GET and unwrap the meals envelope.
    async fn fetch(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<MealRecord>, MealDbError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(MealDbError::Network)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MealDbError::Status(status.as_u16()));
        }

        let raw = resp.text().await.map_err(MealDbError::Network)?;
        let envelope =
            MealsEnvelope::from_json(&raw).map_err(|e| MealDbError::InvalidJson(e.to_string()))?;
        Ok(envelope.into_meals())
    }

    /// Search meals by name. Empty list when nothing matched.
    pub async fn search(&self, query: &str) -> Result<Vec<MealRecord>, MealDbError> {
        self.fetch("search.php", &[("s", query)]).await
    }

    /// Look up a single meal by its id.
    pub async fn lookup(&self, id: &str) -> Result<Option<MealRecord>, MealDbError> {
        Ok(self.fetch("lookup.php", &[("i", id)]).await?.into_iter().next())
    }

    /// Detail lookup by name: prefer the exact (case-insensitive) name
    /// match, otherwise take the first hit. The search endpoint is fuzzy,
    /// so a stored name can come back mid-list.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<MealRecord>, MealDbError> {
        let meals = self.search(name).await?;
        let exact = meals.iter().position(|m| m.name.eq_ignore_ascii_case(name));

        Ok(match exact {
            Some(i) => meals.into_iter().nth(i),
            None => meals.into_iter().next(),
        })
    }

    /// Fetch one random meal.
    pub async fn random(&self) -> Result<Option<MealRecord>, MealDbError> {
        Ok(self.fetch("random.php", &[]).await?.into_iter().next())
    }

    /// Filter meals by cuisine area ("Italian", "Mexican", ...).
    /// Returns partial records: id, name, thumbnail.
    pub async fn filter_by_area(&self, area: &str) -> Result<Vec<MealRecord>, MealDbError> {
        self.fetch("filter.php", &[("a", area)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARRABIATA: &str = r#"{
        "meals": [{
            "idMeal": "52771",
            "strMeal": "Spicy Arrabiata Penne",
            "strCategory": "Vegetarian",
            "strArea": "Italian",
            "strInstructions": "Bring a large pot of water to a boil.",
            "strMealThumb": "https://www.themealdb.com/images/media/meals/ustsqw1468250014.jpg",
            "strTags": "Pasta,Curry",
            "strYoutube": "https://www.youtube.com/watch?v=1IszT_guI08",
            "strIngredient1": "penne rigate",
            "strIngredient2": "olive oil",
            "strIngredient3": "",
            "strIngredient4": null,
            "strMeasure1": "1 pound",
            "strMeasure2": "1/4 cup",
            "strMeasure3": "",
            "strMeasure4": null
        }]
    }"#;

    #[test]
    fn parses_full_record() {
        let envelope = MealsEnvelope::from_json(ARRABIATA).unwrap();
        let meals = envelope.into_meals();
        assert_eq!(meals.len(), 1);

        let meal = &meals[0];
        assert_eq!(meal.id, "52771");
        assert_eq!(meal.name, "Spicy Arrabiata Penne");
        assert_eq!(meal.area.as_deref(), Some("Italian"));
        assert_eq!(meal.tag_list(), vec!["Pasta", "Curry"]);
        assert_eq!(
            meal.tutorial_url(),
            Some("https://www.youtube.com/watch?v=1IszT_guI08")
        );
    }

    #[test]
    fn null_meals_means_empty() {
        let envelope = MealsEnvelope::from_json(r#"{"meals": null}"#).unwrap();
        assert!(envelope.into_meals().is_empty());
    }

    #[test]
    fn ingredients_skip_blank_slots() {
        let meals = MealsEnvelope::from_json(ARRABIATA).unwrap().into_meals();
        let ingredients = meals[0].ingredients();
        assert_eq!(
            ingredients,
            vec![
                ("penne rigate".to_string(), "1 pound".to_string()),
                ("olive oil".to_string(), "1/4 cup".to_string()),
            ]
        );
    }

    #[test]
    fn parses_partial_filter_record() {
        let raw = r#"{"meals": [{"idMeal": "52771", "strMeal": "Spicy Arrabiata Penne",
            "strMealThumb": "https://example.com/t.jpg"}]}"#;
        let meals = MealsEnvelope::from_json(raw).unwrap().into_meals();
        assert_eq!(meals[0].area, None);
        assert!(meals[0].ingredients().is_empty());
        assert_eq!(meals[0].tutorial_url(), None);
    }

    #[test]
    fn refine_filters_by_substring_case_insensitive() {
        let raw = r#"{"meals": [
            {"idMeal": "1", "strMeal": "Chicken Parmesan"},
            {"idMeal": "2", "strMeal": "Beef Wellington"},
            {"idMeal": "3", "strMeal": "Thai Green Chicken Curry"}
        ]}"#;
        let meals = MealsEnvelope::from_json(raw).unwrap().into_meals();

        let refined = refine_by_name(meals, "CHICKEN");
        let names: Vec<&str> = refined.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Chicken Parmesan", "Thai Green Chicken Curry"]);
    }

    #[test]
    fn empty_tutorial_url_is_none() {
        let raw = r#"{"meals": [{"idMeal": "1", "strMeal": "Toast", "strYoutube": ""}]}"#;
        let meals = MealsEnvelope::from_json(raw).unwrap().into_meals();
        assert_eq!(meals[0].tutorial_url(), None);
    }

    #[test]
    fn summary_carries_list_fields() {
        let meals = MealsEnvelope::from_json(ARRABIATA).unwrap().into_meals();
        let summary = meals[0].summary();
        assert_eq!(summary.id, "52771");
        assert_eq!(summary.name, "Spicy Arrabiata Penne");
        assert_eq!(summary.area.as_deref(), Some("Italian"));
    }
}
