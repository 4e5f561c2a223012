/// Shared foundation for the Larder crates: domain models, error types,
/// SQLite-backed storage slots, the favorites list, and the TheMealDB client.
pub mod db;
pub mod errors;
pub mod favorites;
pub mod mealdb;
pub mod models;
