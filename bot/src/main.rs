/// Larder Recipe Bot - Main Entry Point
///
/// Telegram bot built with teloxide that searches TheMealDB and manages
/// per-chat favorites persisted in SQLite storage slots.
mod callback_state;
mod commands;
mod query;

use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{error, info, warn};

use larder_shared::favorites::FavoritesStore;
use larder_shared::mealdb::{MealDbClient, DEFAULT_BASE_URL};

use callback_state::HitStateStore;
use commands::{AppState, Command};

#[tokio::main]
async fn main() {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("larder_bot=info".parse().unwrap())
                .add_directive("larder_shared=info".parse().unwrap()),
        )
        .init();

    info!("=== Larder Recipe Bot Starting ===");

    // Read configuration from environment
    let bot_token = std::env::var("TELOXIDE_TOKEN").expect("TELOXIDE_TOKEN must be set");
    let base_url =
        std::env::var("MEALDB_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let admin_chat_id = std::env::var("ADMIN_CHAT_ID")
        .ok()
        .and_then(|s| s.parse::<i64>().ok());
    let dashboard_url = std::env::var("DASHBOARD_URL").ok();

    // Build the recipe API client
    let client = match MealDbClient::new(&base_url) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to build recipe API client: {}", e);
            std::process::exit(1);
        }
    };
    info!("Recipe API client ready ({})", base_url);

    // Connect to the shared database (favorites live here)
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
    let database_url = format!("sqlite://{}?mode=rwc", db_path_str);
    info!("Database path: {}", db_path_str);

    let pool = match larder_shared::db::create_pool(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = larder_shared::db::run_migrations(&pool).await {
        error!("DB migration error: {}", e);
        std::process::exit(1);
    }

    // Initialize stores
    let favorites = FavoritesStore::new(pool.clone());
    let hits = HitStateStore::new();

    // Create shared application state
    let state = Arc::new(AppState {
        client,
        favorites,
        hits: hits.clone(),
        pool,
        admin_chat_id,
        dashboard_url,
    });

    // Build and start the Telegram bot
    let bot = Bot::new(bot_token);

    // Explicitly delete any existing webhook before polling
    // (prevents 409 Conflict if a webhook was previously set)
    match bot.delete_webhook().send().await {
        Ok(_) => info!("Webhook cleared (ready for polling)"),
        Err(e) => warn!("Failed to delete webhook: {} (continuing anyway)", e),
    }

    // Sync commands with Telegram (enables autocomplete menu)
    use teloxide::utils::command::BotCommands;
    match bot.set_my_commands(Command::bot_commands()).await {
        Ok(_) => info!("Bot commands synced with Telegram"),
        Err(e) => error!("Failed to sync bot commands: {}", e),
    }

    // Notify admin that bot is online
    if let Some(admin_id) = state.admin_chat_id {
        let msg = "Larder Bot online\nRecipe API: ready\nDB: connected".to_string();
        match bot.send_message(ChatId(admin_id), msg).await {
            Ok(_) => info!("Admin startup notification sent"),
            Err(e) => warn!("Failed to send admin notification: {}", e),
        }
    }

    info!("Bot initialized, starting dispatcher...");

    // Set up command handler, message handler, and callback query handler
    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint({
                    let state = state.clone();
                    move |bot: Bot, msg: Message, cmd: Command| {
                        let state = state.clone();
                        async move { commands::handle_command(bot, msg, cmd, state).await }
                    }
                }),
        )
        .branch(Update::filter_message().endpoint({
            let state = state.clone();
            move |bot: Bot, msg: Message| {
                let state = state.clone();
                async move { commands::handle_message(bot, msg, state).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let state = state.clone();
            move |bot: Bot, q: CallbackQuery| {
                let state = state.clone();
                async move { commands::handle_callback_query(bot, q, state).await }
            }
        }));

    // Spawn background cleanup task for expired hit lists
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            hits.cleanup_expired(300).await; // 5 min TTL
        }
    });

    // Run the bot
    Dispatcher::builder(bot, handler)
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.kind);
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Larder Recipe Bot stopped.");
}
