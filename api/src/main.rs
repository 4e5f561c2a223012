/// Larder API Server
///
/// REST API for the Larder web dashboard. Provides OTP authentication,
/// recipe search proxying, and favorites management.
mod auth;
mod routes;

use axum::routing::{delete, get, post};
use axum::Router;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use larder_shared::favorites::FavoritesStore;
use larder_shared::mealdb::{MealDbClient, DEFAULT_BASE_URL};

/// Shared application state for all API handlers.
pub struct AppState {
    pub pool: SqlitePool,
    pub client: MealDbClient,
    pub favorites: FavoritesStore,
    pub bot_token: String,
    pub jwt_secret: String,
    pub admin_chat_id: i64,
    pub session_ttl: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "larder_api=info,tower_http=info".into()),
        )
        .init();

    // Config
    let database_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./larder.db".to_string());
    let database_path = std::path::Path::new(&database_path)
        .canonicalize()
        .unwrap_or_else(|_| std::path::PathBuf::from(&database_path));
    // Strip Windows UNC prefix (\\?\) which breaks SQLite URL parsing
    let db_path_str = database_path.display().to_string();
    let db_path_str = db_path_str
        .strip_prefix(r"\\?\")
        .unwrap_or(&db_path_str)
        .to_string();
    info!("Database path: {}", db_path_str);

    let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
        .or_else(|_| std::env::var("TELOXIDE_TOKEN"))
        .expect("TELEGRAM_BOT_TOKEN or TELOXIDE_TOKEN must be set");
    let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let admin_chat_id: i64 = std::env::var("ADMIN_CHAT_ID")
        .expect("ADMIN_CHAT_ID must be set")
        .parse()
        .expect("ADMIN_CHAT_ID must be a number");
    let session_ttl: i64 = std::env::var("SESSION_TTL_SECS")
        .unwrap_or_else(|_| "600".to_string())
        .parse()
        .unwrap_or(600);
    let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let api_port: u16 = std::env::var("API_PORT")
        .unwrap_or_else(|_| "8081".to_string())
        .parse()
        .unwrap_or(8081);
    let cleanup_interval: u64 = std::env::var("SESSION_CLEANUP_INTERVAL")
        .unwrap_or_else(|_| "300".to_string())
        .parse()
        .unwrap_or(300);
    let base_url =
        std::env::var("MEALDB_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

    // Database
    let database_url = format!("sqlite://{}?mode=rwc", db_path_str);
    let pool = larder_shared::db::create_pool(&database_url).await?;
    larder_shared::db::run_migrations(&pool).await?;

    // Recipe API client
    let client = MealDbClient::new(&base_url)?;
    info!("Recipe API client ready ({})", base_url);

    // App state
    let state = Arc::new(AppState {
        pool: pool.clone(),
        client,
        favorites: FavoritesStore::new(pool.clone()),
        bot_token,
        jwt_secret,
        admin_chat_id,
        session_ttl,
    });

    // Background session cleanup
    let cleanup_pool = pool.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(cleanup_interval));
        loop {
            interval.tick().await;
            match larder_shared::db::cleanup_expired_sessions(&cleanup_pool).await {
                Ok(n) if n > 0 => info!("Cleaned up {} expired sessions", n),
                Err(e) => tracing::warn!("Session cleanup error: {}", e),
                _ => {}
            }
        }
    });

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Router
    let app = Router::new()
        // Auth routes (no auth required)
        .route("/api/auth/request-otp", post(routes::request_otp))
        .route("/api/auth/verify-otp", post(routes::verify_otp))
        // Recipe routes (public, proxied upstream)
        .route("/api/search", get(routes::search))
        .route("/api/meals/random", get(routes::random_meal))
        .route("/api/meals/:id", get(routes::get_meal))
        // Auth-protected routes
        .route("/api/auth/logout", delete(routes::logout))
        .route(
            "/api/favorites",
            get(routes::list_favorites).put(routes::add_favorite),
        )
        .route("/api/favorites/:name", delete(routes::remove_favorite))
        // Admin routes
        .route("/api/admin/stats", get(routes::admin_stats))
        .layer(cors)
        .with_state(state);

    // Serve
    let addr = format!("{}:{}", api_host, api_port);
    info!("Larder API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
