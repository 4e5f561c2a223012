/// Telegram bot command handlers.
///
/// Handles /start, /help, /search, /area, /meal, /random, /favorites,
/// /ping, /chatid, plain-text searches, and inline keyboard callbacks.
use std::collections::HashSet;
use std::sync::Arc;

use sqlx::SqlitePool;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId,
};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};
use uuid::Uuid;

use larder_shared::favorites::FavoritesStore;
use larder_shared::mealdb::{refine_by_name, MealDbClient, MealRecord};
use larder_shared::models::FavoriteMeal;

use crate::callback_state::{
    decode_callback, encode_remove, encode_toggle, encode_view, HitStateStore, MealHit,
    PendingHits, ViewKind,
};
use crate::query::{self, ParsedQuery};

/// Bot command definitions.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Larder Recipe Bot commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show help")]
    Help,
    #[command(description = "Search meals by name")]
    Search(String),
    #[command(description = "Browse meals from a cuisine")]
    Area(String),
    #[command(description = "Show details for a meal")]
    Meal(String),
    #[command(description = "Show a random meal")]
    Random,
    #[command(description = "Show your favorites list")]
    Favorites,
    #[command(description = "Health check")]
    Ping,
    #[command(description = "Show your Telegram Chat ID")]
    Chatid,
}

/// Shared application state passed to handlers.
pub struct AppState {
    pub client: MealDbClient,
    pub favorites: FavoritesStore,
    pub hits: HitStateStore,
    pub pool: SqlitePool,
    pub admin_chat_id: Option<i64>,
    pub dashboard_url: Option<String>,
}

/// Handle incoming commands.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    // Track user in DB (captures username from Telegram)
    let username = msg.from().and_then(|u| u.username.as_deref());
    let _ = larder_shared::db::upsert_user(&state.pool, msg.chat.id.0, username).await;

    match cmd {
        Command::Start => cmd_start(bot, msg, state).await,
        Command::Help => cmd_start(bot, msg, state).await,
        Command::Search(raw) => cmd_search(bot, msg, raw, state).await,
        Command::Area(raw) => cmd_area(bot, msg, raw, state).await,
        Command::Meal(raw) => cmd_meal(bot, msg, raw, state).await,
        Command::Random => cmd_random(bot, msg, state).await,
        Command::Favorites => cmd_favorites(bot, msg, state).await,
        Command::Ping => cmd_ping(bot, msg, state).await,
        Command::Chatid => cmd_chatid(bot, msg, state).await,
    }
}

/// /start and /help - Welcome message
async fn cmd_start(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    let mut help_text = String::from(
        "\
🍲 Larder Recipe Bot

Search recipes and keep a favorites list!

🔍 Find Recipes:
/search <name> — Search meals by name
/area <cuisine> — Browse a cuisine (e.g. /area Italian)
/meal <name> — Show full details for a meal
/random — Surprise me

Just type a meal name and I'll search for it.
Type area:Italian to browse a cuisine.

📖 Favorites:
/favorites — Show your saved meals
Tap the heart on any result to save or remove it.

ℹ️ Utilities:
/chatid — Show your Chat ID
/ping — Health check
/help — Show this message",
    );

    if let Some(url) = &state.dashboard_url {
        help_text.push_str(&format!(
            "\n\n🌐 Web Dashboard:\n{}\nLog in with your Chat ID to manage favorites",
            url
        ));
    }

    bot.send_message(msg.chat.id, help_text).await?;
    bot.send_message(msg.chat.id, format!("🔐 Your Chat ID: {}", chat_id))
        .await?;
    Ok(())
}

/// /chatid - Send the user their Telegram Chat ID
async fn cmd_chatid(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    let mut text = format!("🔐 Your Chat ID\n\n{}", chat_id);
    if let Some(url) = &state.dashboard_url {
        text.push_str(&format!(
            "\n\nAccess Dashboard:\n{}\n\nPaste your Chat ID there to log in.",
            url
        ));
    }
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// /search <name> - Search meals by name
async fn cmd_search(
    bot: Bot,
    msg: Message,
    raw: String,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let query = query::normalize(&raw);
    if query.is_empty() {
        bot.send_message(
            msg.chat.id,
            "🔍 Search Meals\n\nUsage: /search <name>\n\nExample: /search chicken curry",
        )
        .await?;
        return Ok(());
    }

    run_name_search(&bot, msg.chat.id, &query, &state).await
}

/// /area <cuisine> - Browse meals from a cuisine
async fn cmd_area(bot: Bot, msg: Message, raw: String, state: Arc<AppState>) -> ResponseResult<()> {
    let area = query::normalize(&raw);
    if area.is_empty() {
        bot.send_message(
            msg.chat.id,
            "🌍 Browse a Cuisine\n\nUsage: /area <cuisine>\n\nExample: /area Italian",
        )
        .await?;
        return Ok(());
    }

    run_area_search(&bot, msg.chat.id, &area, &state).await
}

/// /meal <name> - Full details for a meal, looked up by name
async fn cmd_meal(bot: Bot, msg: Message, raw: String, state: Arc<AppState>) -> ResponseResult<()> {
    let name = query::normalize(&raw);
    if name.is_empty() {
        bot.send_message(
            msg.chat.id,
            "🍽 Meal Details\n\nUsage: /meal <name>\n\nExample: /meal Arrabiata",
        )
        .await?;
        return Ok(());
    }

    let status = bot
        .send_message(msg.chat.id, format!("🔍 Looking up: {}", name))
        .await?;

    match state.client.find_by_name(&name).await {
        Ok(Some(record)) => {
            let _ = bot.delete_message(msg.chat.id, status.id).await;
            send_meal_detail(&bot, msg.chat.id, &record, &state).await?;
        }
        Ok(None) => {
            bot.edit_message_text(
                msg.chat.id,
                status.id,
                format!("No meal found for name {}.", name),
            )
            .await?;
        }
        Err(e) => {
            error!("Meal lookup failed for \"{}\": {}", name, e);
            bot.edit_message_text(msg.chat.id, status.id, format!("Lookup error: {}", e))
                .await?;
        }
    }

    Ok(())
}

/// /random - One random meal
async fn cmd_random(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let status = bot.send_message(msg.chat.id, "🎲 Rolling the menu...").await?;

    match state.client.random().await {
        Ok(Some(record)) => {
            let _ = bot.delete_message(msg.chat.id, status.id).await;
            send_meal_detail(&bot, msg.chat.id, &record, &state).await?;
        }
        Ok(None) => {
            bot.edit_message_text(msg.chat.id, status.id, "No meal came back. Try again.")
                .await?;
        }
        Err(e) => {
            error!("Random meal failed: {}", e);
            bot.edit_message_text(msg.chat.id, status.id, format!("Lookup error: {}", e))
                .await?;
        }
    }

    Ok(())
}

/// /favorites - Render the user's favorites list
async fn cmd_favorites(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id;

    match state.favorites.list(chat_id.0).await {
        Ok(list) if list.is_empty() => {
            bot.send_message(chat_id, "No favorite meals found.").await?;
        }
        Ok(list) => {
            let status = bot.send_message(chat_id, "📖 Loading favorites...").await?;
            let hits: Vec<MealHit> = list.iter().map(hit_from_favorite).collect();
            let title = format!("📖 Your favorite meals ({}):", list.len());
            render_hit_list(&bot, chat_id, status.id, title, hits, ViewKind::Favorites, &state)
                .await?;
        }
        Err(e) => {
            error!("Failed to load favorites for {}: {}", chat_id.0, e);
            bot.send_message(chat_id, "Could not load your favorites. Try again later.")
                .await?;
        }
    }

    Ok(())
}

/// /ping - Health check
async fn cmd_ping(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let started = std::time::Instant::now();
    let api_line = match state.client.random().await {
        Ok(_) => format!("ok ({} ms)", started.elapsed().as_millis()),
        Err(e) => format!("unreachable ({})", e),
    };

    let db_line = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => "connected",
        Err(_) => "offline",
    };

    let fav_count = state.favorites.count(msg.chat.id.0).await.unwrap_or(0);

    bot.send_message(
        msg.chat.id,
        format!(
            "✅ System Status\n\nRecipe API: {}\nDatabase: {}\nYour favorites: {}",
            api_line, db_line, fav_count
        ),
    )
    .await?;
    Ok(())
}

/// Handle plain messages (treated as searches).
pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        // Unrecognized /commands fall through to this branch; ignore them
        if text.starts_with('/') {
            return Ok(());
        }

        // Track user in DB (captures username from Telegram)
        let username = msg.from().and_then(|u| u.username.as_deref());
        let _ = larder_shared::db::upsert_user(&state.pool, msg.chat.id.0, username).await;

        match query::parse_query(text) {
            ParsedQuery::Name(q) => {
                info!("Plain-text search from {}: {}", msg.chat.id.0, q);
                run_name_search(&bot, msg.chat.id, &q, &state).await?;
            }
            ParsedQuery::Area(area) => {
                info!("Plain-text area filter from {}: {}", msg.chat.id.0, area);
                run_area_search(&bot, msg.chat.id, &area, &state).await?;
            }
            ParsedQuery::Empty => {}
        }
    }
    Ok(())
}

/// Run a name search and render the result list.
async fn run_name_search(
    bot: &Bot,
    chat_id: ChatId,
    query: &str,
    state: &AppState,
) -> ResponseResult<()> {
    let searching = bot
        .send_message(chat_id, format!("🔍 Searching for: {}", query))
        .await?;

    match state.client.search(query).await {
        Ok(meals) => {
            // The upstream search is fuzzy; only keep meals whose name
            // actually contains the query
            let meals = refine_by_name(meals, query);
            if meals.is_empty() {
                bot.edit_message_text(chat_id, searching.id, "No search results found.")
                    .await?;
                return Ok(());
            }

            let hits: Vec<MealHit> = meals.iter().map(hit_from_record).collect();
            let title = format!("Search: \"{}\" — tap a meal or a heart:", query);
            render_hit_list(bot, chat_id, searching.id, title, hits, ViewKind::Search, state)
                .await?;
        }
        Err(e) => {
            error!("Search failed for \"{}\": {}", query, e);
            bot.edit_message_text(chat_id, searching.id, format!("Search error: {}", e))
                .await?;
        }
    }

    Ok(())
}

/// Run a cuisine filter and render the result list.
async fn run_area_search(
    bot: &Bot,
    chat_id: ChatId,
    area: &str,
    state: &AppState,
) -> ResponseResult<()> {
    let searching = bot
        .send_message(chat_id, format!("🌍 Browsing cuisine: {}", area))
        .await?;

    match state.client.filter_by_area(area).await {
        Ok(meals) => {
            if meals.is_empty() {
                bot.edit_message_text(chat_id, searching.id, "No search results found.")
                    .await?;
                return Ok(());
            }

            // Filter responses are partial records without an area field;
            // fill it in from the query so hearts persist it
            let hits: Vec<MealHit> = meals
                .iter()
                .map(|m| {
                    let mut hit = hit_from_record(m);
                    hit.area.get_or_insert_with(|| area.to_string());
                    hit
                })
                .collect();

            let title = format!("Cuisine: {} — tap a meal or a heart:", area);
            render_hit_list(bot, chat_id, searching.id, title, hits, ViewKind::Search, state)
                .await?;
        }
        Err(e) => {
            error!("Area filter failed for \"{}\": {}", area, e);
            bot.edit_message_text(chat_id, searching.id, format!("Search error: {}", e))
                .await?;
        }
    }

    Ok(())
}

/// Store a hit list and swap the status message for the rendered keyboard.
async fn render_hit_list(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    title: String,
    hits: Vec<MealHit>,
    kind: ViewKind,
    state: &AppState,
) -> ResponseResult<()> {
    let key = Uuid::new_v4().to_string()[..6].to_string();
    let fav_names = favorite_names(state, chat_id.0).await;
    let keyboard = list_keyboard(&key, &hits, kind, &fav_names);

    state
        .hits
        .store(
            key,
            PendingHits {
                chat_id: chat_id.0,
                kind,
                title: title.clone(),
                hits,
                created_at: std::time::Instant::now(),
            },
        )
        .await;

    bot.edit_message_text(chat_id, message_id, title)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

/// Handle callback query from inline keyboard button press.
pub async fn handle_callback_query(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let data = match q.data {
        Some(ref d) => d.clone(),
        None => return Ok(()),
    };

    let (op, key, index) = match decode_callback(&data) {
        Some(decoded) => decoded,
        None => {
            let _ = bot.answer_callback_query(&q.id).await;
            return Ok(());
        }
    };

    let pending = match state.hits.peek(&key).await {
        Some(p) => p,
        None => {
            // Expired or evicted
            let _ = bot
                .answer_callback_query(&q.id)
                .text("This list expired. Run the search again.")
                .await;
            return Ok(());
        }
    };

    if index >= pending.hits.len() {
        let _ = bot.answer_callback_query(&q.id).await;
        return Ok(());
    }

    let hit = pending.hits[index].clone();
    let chat_id = ChatId(pending.chat_id);
    let message_id = match q.message {
        Some(ref m) => m.id,
        None => {
            let _ = bot.answer_callback_query(&q.id).await;
            return Ok(());
        }
    };

    match op.as_str() {
        // Open the detail view for a hit
        "mv" => {
            let _ = bot.answer_callback_query(&q.id).await;

            match resolve_hit_record(&state.client, &hit).await {
                Ok(Some(record)) => {
                    send_meal_detail(&bot, chat_id, &record, &state).await?;
                }
                Ok(None) => {
                    bot.send_message(chat_id, format!("No meal found for name {}.", hit.name))
                        .await?;
                }
                Err(e) => {
                    error!("Detail lookup failed for \"{}\": {}", hit.name, e);
                    bot.send_message(chat_id, format!("Could not load meal details: {}", e))
                        .await?;
                }
            }
        }

        // Toggle the hit in the favorites list, then rebuild this
        // message's keyboard so every heart reflects the stored list
        "mf" => {
            let fav = FavoriteMeal {
                name: hit.name.clone(),
                image: hit.thumbnail.clone(),
                area: hit.area.clone(),
            };

            let now_favorite = match state.favorites.toggle(pending.chat_id, fav).await {
                Ok(v) => v,
                Err(e) => {
                    error!("Favorite toggle failed for {}: {}", pending.chat_id, e);
                    let _ = bot
                        .answer_callback_query(&q.id)
                        .text("Could not update favorites.")
                        .await;
                    return Ok(());
                }
            };

            let note = if now_favorite {
                "Meal added to favorites"
            } else {
                "Meal removed from favorites"
            };
            let _ = bot.answer_callback_query(&q.id).text(note).await;

            match pending.kind {
                ViewKind::Detail => {
                    let keyboard = detail_keyboard(&key, hit.tutorial.as_deref(), now_favorite);
                    let _ = bot
                        .edit_message_reply_markup(chat_id, message_id)
                        .reply_markup(keyboard)
                        .await;
                }
                _ => {
                    let fav_names = favorite_names(&state, pending.chat_id).await;
                    let keyboard = list_keyboard(&key, &pending.hits, pending.kind, &fav_names);
                    let _ = bot
                        .edit_message_reply_markup(chat_id, message_id)
                        .reply_markup(keyboard)
                        .await;
                }
            }
        }

        // Remove the hit from the favorites view and re-render it from
        // the stored list
        "fr" => {
            let removed = match state.favorites.remove(pending.chat_id, &hit.name).await {
                Ok(v) => v,
                Err(e) => {
                    error!("Favorite removal failed for {}: {}", pending.chat_id, e);
                    let _ = bot
                        .answer_callback_query(&q.id)
                        .text("Could not update favorites.")
                        .await;
                    return Ok(());
                }
            };

            let note = if removed {
                "Meal removed from favorites"
            } else {
                "Already removed"
            };
            let _ = bot.answer_callback_query(&q.id).text(note).await;

            match state.favorites.list(pending.chat_id).await {
                Ok(list) if list.is_empty() => {
                    state.hits.update_hits(&key, Vec::new()).await;
                    let _ = bot
                        .edit_message_text(chat_id, message_id, "No favorite meals found.")
                        .await;
                }
                Ok(list) => {
                    let hits: Vec<MealHit> = list.iter().map(hit_from_favorite).collect();
                    let fav_names: HashSet<String> =
                        list.into_iter().map(|f| f.name).collect();
                    let keyboard =
                        list_keyboard(&key, &hits, ViewKind::Favorites, &fav_names);
                    let title = format!("📖 Your favorite meals ({}):", hits.len());
                    state.hits.update_hits(&key, hits).await;
                    let _ = bot
                        .edit_message_text(chat_id, message_id, title)
                        .reply_markup(keyboard)
                        .await;
                }
                Err(e) => {
                    error!("Failed to reload favorites for {}: {}", pending.chat_id, e);
                }
            }
        }

        _ => {
            let _ = bot.answer_callback_query(&q.id).await;
        }
    }

    Ok(())
}

/// Render a full meal detail view: photo, caption, tutorial and heart.
async fn send_meal_detail(
    bot: &Bot,
    chat_id: ChatId,
    record: &MealRecord,
    state: &AppState,
) -> ResponseResult<()> {
    let is_favorite = state
        .favorites
        .contains(chat_id.0, &record.name)
        .await
        .unwrap_or(false);

    let key = Uuid::new_v4().to_string()[..6].to_string();
    let caption = detail_caption(record);
    let keyboard = detail_keyboard(&key, record.tutorial_url(), is_favorite);

    state
        .hits
        .store(
            key,
            PendingHits {
                chat_id: chat_id.0,
                kind: ViewKind::Detail,
                title: record.name.clone(),
                hits: vec![hit_from_record(record)],
                created_at: std::time::Instant::now(),
            },
        )
        .await;

    // Prefer a photo message; fall back to text when the thumbnail is
    // missing or not a valid URL
    let photo = record.thumbnail.as_deref().and_then(|u| u.parse().ok());
    match photo {
        Some(url) => {
            bot.send_photo(chat_id, InputFile::url(url))
                .caption(caption)
                .reply_markup(keyboard)
                .await?;
        }
        None => {
            bot.send_message(chat_id, caption)
                .reply_markup(keyboard)
                .await?;
        }
    }

    Ok(())
}

/// Resolve a hit back to a full record: by id when the hit came from the
/// API, by name for favorites loaded from storage.
async fn resolve_hit_record(
    client: &MealDbClient,
    hit: &MealHit,
) -> Result<Option<MealRecord>, larder_shared::errors::MealDbError> {
    match &hit.id {
        Some(id) => client.lookup(id).await,
        None => client.find_by_name(&hit.name).await,
    }
}

/// Build the detail caption: name, origin, tags, ingredients,
/// truncated instructions. Telegram caps captions at 1024 chars.
fn detail_caption(record: &MealRecord) -> String {
    let mut caption = record.name.clone();

    let meta: Vec<&str> = [record.area.as_deref(), record.category.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !meta.is_empty() {
        caption.push('\n');
        caption.push_str(&meta.join(" · "));
    }

    let tags = record.tag_list();
    if !tags.is_empty() {
        caption.push_str(&format!("\nTags: {}", tags.join(", ")));
    }

    let ingredients = record.ingredients();
    if !ingredients.is_empty() {
        caption.push_str("\n\nIngredients:");
        for (ingredient, measure) in ingredients.iter().take(10) {
            if measure.is_empty() {
                caption.push_str(&format!("\n• {}", ingredient));
            } else {
                caption.push_str(&format!("\n• {} ({})", ingredient, measure));
            }
        }
        if ingredients.len() > 10 {
            caption.push_str(&format!("\n… and {} more", ingredients.len() - 10));
        }
    }

    if let Some(instructions) = record
        .instructions
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        caption.push_str("\n\n");
        caption.push_str(&truncate_chars(instructions.trim(), 450));
    }

    caption
}

/// Build the keyboard for a result or favorites list. Search rows carry a
/// heart reflecting current membership; favorites rows carry a remove
/// button.
fn list_keyboard(
    key: &str,
    hits: &[MealHit],
    kind: ViewKind,
    fav_names: &HashSet<String>,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    for (i, hit) in hits.iter().enumerate() {
        let label = match hit.area.as_deref() {
            Some(area) => truncate_chars(&format!("{} ({})", hit.name, area), 40),
            None => truncate_chars(&hit.name, 40),
        };

        let action = match kind {
            ViewKind::Favorites => InlineKeyboardButton::callback("✖", encode_remove(key, i)),
            _ => {
                let icon = if fav_names.contains(&hit.name) {
                    "❤️"
                } else {
                    "🤍"
                };
                InlineKeyboardButton::callback(icon, encode_toggle(key, i))
            }
        };

        rows.push(vec![
            InlineKeyboardButton::callback(label, encode_view(key, i)),
            action,
        ]);
    }

    InlineKeyboardMarkup::new(rows)
}

/// Build the keyboard under a detail view.
fn detail_keyboard(key: &str, tutorial: Option<&str>, is_favorite: bool) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    if let Some(url) = tutorial.and_then(|u| u.parse().ok()) {
        rows.push(vec![InlineKeyboardButton::url("▶ Watch Tutorial", url)]);
    }

    let toggle = if is_favorite {
        InlineKeyboardButton::callback("❤️ Remove from favorites", encode_toggle(key, 0))
    } else {
        InlineKeyboardButton::callback("🤍 Add to favorites", encode_toggle(key, 0))
    };
    rows.push(vec![toggle]);

    InlineKeyboardMarkup::new(rows)
}

/// Current favorite names for a chat, for heart rendering.
async fn favorite_names(state: &AppState, chat_id: i64) -> HashSet<String> {
    match state.favorites.list(chat_id).await {
        Ok(list) => list.into_iter().map(|f| f.name).collect(),
        Err(e) => {
            warn!("Failed to load favorites for {}: {}", chat_id, e);
            HashSet::new()
        }
    }
}

fn hit_from_record(record: &MealRecord) -> MealHit {
    MealHit {
        id: Some(record.id.clone()),
        name: record.name.clone(),
        thumbnail: record.thumbnail.clone(),
        area: record.area.clone(),
        tutorial: record.tutorial_url().map(String::from),
    }
}

fn hit_from_favorite(fav: &FavoriteMeal) -> MealHit {
    MealHit {
        id: None,
        name: fav.name.clone(),
        thumbnail: fav.image.clone(),
        area: fav.area.clone(),
        tutorial: None,
    }
}

/// Char-safe truncation with an ellipsis.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}…", s.chars().take(max - 1).collect::<String>())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate_chars("short", 40), "short");
        let truncated = truncate_chars("Bœuf bourguignon à la façon de grand-mère", 10);
        assert_eq!(truncated.chars().count(), 10);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn search_keyboard_marks_favorites() {
        let hits = vec![
            MealHit {
                id: Some("1".into()),
                name: "Arrabiata".into(),
                thumbnail: None,
                area: Some("Italian".into()),
                tutorial: None,
            },
            MealHit {
                id: Some("2".into()),
                name: "Poutine".into(),
                thumbnail: None,
                area: Some("Canadian".into()),
                tutorial: None,
            },
        ];
        let favs: HashSet<String> = ["Arrabiata".to_string()].into_iter().collect();

        let kb = list_keyboard("k1", &hits, ViewKind::Search, &favs);
        assert_eq!(kb.inline_keyboard.len(), 2);
        assert_eq!(kb.inline_keyboard[0][1].text, "❤️");
        assert_eq!(kb.inline_keyboard[1][1].text, "🤍");
    }

    #[test]
    fn favorites_keyboard_uses_remove_buttons() {
        let hits = vec![MealHit {
            id: None,
            name: "Arrabiata".into(),
            thumbnail: None,
            area: None,
            tutorial: None,
        }];
        let favs: HashSet<String> = ["Arrabiata".to_string()].into_iter().collect();

        let kb = list_keyboard("k1", &hits, ViewKind::Favorites, &favs);
        assert_eq!(kb.inline_keyboard[0][1].text, "✖");
    }
}
