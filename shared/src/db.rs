/// Database connection pool and helpers for Larder.
use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Create SQLite connection pool with WAL mode and busy timeout.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(10))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!("Connected to database: {}", database_url);
    Ok(pool)
}

/// Run migrations from the migrations directory.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("../migrations").run(pool).await?;

    info!("Database migrations completed");
    Ok(())
}

/// Register or update user on first contact.
pub async fn upsert_user(pool: &SqlitePool, chat_id: i64, username: Option<&str>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (chat_id, username)
        VALUES (?, ?)
        ON CONFLICT(chat_id) DO UPDATE SET
            last_activity = CURRENT_TIMESTAMP,
            username = COALESCE(excluded.username, users.username)
        "#,
    )
    .bind(chat_id)
    .bind(username)
    .execute(pool)
    .await?;

    Ok(())
}

// ====== STORAGE SLOTS ======

/// Read the raw JSON value of a storage slot. Returns None when the slot
/// has never been written.
pub async fn slot_get(pool: &SqlitePool, slot: &str) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM storage WHERE slot = ?")
        .bind(slot)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.0))
}

/// Write a storage slot, replacing any previous value (last write wins).
pub async fn slot_put(pool: &SqlitePool, slot: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO storage (slot, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(slot) DO UPDATE SET
            value = excluded.value,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(slot)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a storage slot. No-op if absent.
pub async fn slot_delete(pool: &SqlitePool, slot: &str) -> Result<()> {
    sqlx::query("DELETE FROM storage WHERE slot = ?")
        .bind(slot)
        .execute(pool)
        .await?;

    Ok(())
}

// ====== SESSION MANAGEMENT ======

/// Create an OTP session (temporary, 5-min expiry).
pub async fn create_otp_session(pool: &SqlitePool, chat_id: i64, otp_code: &str) -> Result<()> {
    // Delete any existing OTP sessions for this user first
    sqlx::query("DELETE FROM sessions WHERE chat_id = ? AND token LIKE 'otp:%'")
        .bind(chat_id)
        .execute(pool)
        .await?;

    let token = format!("otp:{}", otp_code);
    sqlx::query(
        r#"
        INSERT INTO sessions (token, chat_id, expires_at)
        VALUES (?, ?, datetime('now', '+5 minutes'))
        "#,
    )
    .bind(&token)
    .bind(chat_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Verify an OTP code for a chat_id. Returns true if valid and not expired.
/// A verified OTP is single-use and deleted on success.
pub async fn verify_otp_session(pool: &SqlitePool, chat_id: i64, otp_code: &str) -> Result<bool> {
    let token = format!("otp:{}", otp_code);
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM sessions
        WHERE token = ? AND chat_id = ? AND expires_at > datetime('now')
        "#,
    )
    .bind(&token)
    .bind(chat_id)
    .fetch_optional(pool)
    .await?;

    let valid = row.map(|r| r.0 > 0).unwrap_or(false);

    if valid {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(&token)
            .execute(pool)
            .await?;
    }

    Ok(valid)
}

/// Create a JWT session (long-lived, configurable TTL).
pub async fn create_jwt_session(
    pool: &SqlitePool,
    chat_id: i64,
    token: &str,
    ttl_secs: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sessions (token, chat_id, expires_at)
        VALUES (?, ?, datetime('now', '+' || ? || ' seconds'))
        "#,
    )
    .bind(token)
    .bind(chat_id)
    .bind(ttl_secs)
    .execute(pool)
    .await?;

    Ok(())
}

/// Validate a session token. Returns the chat_id if valid and not expired.
pub async fn validate_session(pool: &SqlitePool, token: &str) -> Result<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT chat_id FROM sessions
        WHERE token = ? AND expires_at > datetime('now')
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.0))
}

/// Delete a session (logout).
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete all expired sessions.
pub async fn cleanup_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= datetime('now')")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Count recent OTP requests for rate limiting.
pub async fn count_recent_otp_requests(
    pool: &SqlitePool,
    chat_id: i64,
    window_secs: i64,
) -> Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM sessions
        WHERE chat_id = ? AND token LIKE 'otp:%'
            AND created_at > datetime('now', '-' || ? || ' seconds')
        "#,
    )
    .bind(chat_id)
    .bind(window_secs)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

// ====== ADMIN QUERIES ======

/// Get all users (admin).
pub async fn get_all_users(pool: &SqlitePool) -> Result<Vec<crate::models::User>> {
    let users = sqlx::query_as::<_, crate::models::User>(
        "SELECT * FROM users ORDER BY last_activity DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// System stats for the admin dashboard.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SystemStats {
    pub total_users: i64,
    pub active_sessions: i64,
    pub favorites_slots: i64,
    pub favorites_total: i64,
}

/// Get system-wide statistics.
///
/// `favorites_total` counts records inside every favorites slot via the
/// json_each table-valued function; a malformed slot contributes zero.
pub async fn get_system_stats(pool: &SqlitePool) -> Result<SystemStats> {
    let (total_users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    let (active_sessions,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sessions WHERE expires_at > datetime('now')",
    )
    .fetch_one(pool)
    .await?;
    let (favorites_slots,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM storage WHERE slot LIKE 'favorites:%'",
    )
    .fetch_one(pool)
    .await?;
    let (favorites_total,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM (
            SELECT value FROM storage
            WHERE slot LIKE 'favorites:%' AND json_valid(value)
        ) AS slots, json_each(slots.value)
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(SystemStats {
        total_users,
        active_sessions,
        favorites_slots,
        favorites_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn slot_roundtrip() {
        let pool = test_pool().await;
        assert_eq!(slot_get(&pool, "favorites:1").await.unwrap(), None);

        slot_put(&pool, "favorites:1", "[]").await.unwrap();
        assert_eq!(
            slot_get(&pool, "favorites:1").await.unwrap(),
            Some("[]".to_string())
        );
    }

    #[tokio::test]
    async fn slot_put_overwrites() {
        let pool = test_pool().await;
        slot_put(&pool, "s", "first").await.unwrap();
        slot_put(&pool, "s", "second").await.unwrap();
        assert_eq!(slot_get(&pool, "s").await.unwrap(), Some("second".into()));
    }

    #[tokio::test]
    async fn slot_delete_is_idempotent() {
        let pool = test_pool().await;
        slot_put(&pool, "s", "x").await.unwrap();
        slot_delete(&pool, "s").await.unwrap();
        slot_delete(&pool, "s").await.unwrap();
        assert_eq!(slot_get(&pool, "s").await.unwrap(), None);
    }

    #[tokio::test]
    async fn otp_session_is_single_use() {
        let pool = test_pool().await;
        upsert_user(&pool, 42, Some("alice")).await.unwrap();
        create_otp_session(&pool, 42, "123456").await.unwrap();

        assert!(verify_otp_session(&pool, 42, "123456").await.unwrap());
        // Second verification fails: the row was consumed
        assert!(!verify_otp_session(&pool, 42, "123456").await.unwrap());
    }

    #[tokio::test]
    async fn jwt_session_validates_and_logs_out() {
        let pool = test_pool().await;
        create_jwt_session(&pool, 7, "tok", 600).await.unwrap();
        assert_eq!(validate_session(&pool, "tok").await.unwrap(), Some(7));

        delete_session(&pool, "tok").await.unwrap();
        assert_eq!(validate_session(&pool, "tok").await.unwrap(), None);
    }

    #[tokio::test]
    async fn stats_count_favorites_records() {
        let pool = test_pool().await;
        upsert_user(&pool, 1, None).await.unwrap();
        slot_put(&pool, "favorites:1", r#"[{"name":"a"},{"name":"b"}]"#)
            .await
            .unwrap();
        slot_put(&pool, "favorites:2", "not json").await.unwrap();

        let stats = get_system_stats(&pool).await.unwrap();
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.favorites_slots, 2);
        assert_eq!(stats.favorites_total, 2);
    }
}
