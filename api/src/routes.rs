/// API route handlers for the Larder Dashboard.
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use larder_shared::db;
use larder_shared::errors::MealDbError;
use larder_shared::mealdb::refine_by_name;
use larder_shared::models::{FavoriteMeal, MealSummary};

use crate::auth;
use crate::AppState;

// ====== REQUEST / RESPONSE TYPES ======

#[derive(Deserialize)]
pub struct RequestOtpBody {
    pub chat_id: i64,
}

#[derive(Deserialize)]
pub struct VerifyOtpBody {
    pub chat_id: i64,
    pub otp: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: i64,
    pub chat_id: i64,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub area: Option<String>,
}

type ApiError = (StatusCode, Json<MessageResponse>);

fn fail(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(MessageResponse {
            message: message.into(),
        }),
    )
}

/// Map upstream client failures to gateway-style responses.
fn upstream_error(e: MealDbError) -> ApiError {
    warn!("Upstream recipe API error: {}", e);
    fail(StatusCode::BAD_GATEWAY, format!("Recipe API error: {}", e))
}

// ====== AUTH ROUTES ======

/// POST /api/auth/request-otp
pub async fn request_otp(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RequestOtpBody>,
) -> Result<impl IntoResponse, ApiError> {
    let chat_id = body.chat_id;

    // Ensure user exists in DB before creating session rows
    let _ = db::upsert_user(&state.pool, chat_id, None).await;

    // Rate limit: max 3 OTP requests per hour
    let recent = db::count_recent_otp_requests(&state.pool, chat_id, 3600)
        .await
        .unwrap_or(0);
    if recent >= 3 {
        return Err(fail(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many OTP requests. Try again later.",
        ));
    }

    let otp = auth::generate_otp();

    if let Err(e) = db::create_otp_session(&state.pool, chat_id, &otp).await {
        warn!("Failed to create OTP session: {}", e);
        return Err(fail(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to create OTP session",
        ));
    }

    if let Err(e) = auth::deliver_otp(&state.bot_token, chat_id, &otp).await {
        warn!("Failed to send OTP: {}", e);
        return Err(fail(
            StatusCode::BAD_GATEWAY,
            format!("Failed to send OTP via Telegram: {}", e),
        ));
    }

    info!("OTP requested for chat_id {}", chat_id);
    Ok(Json(MessageResponse {
        message: "OTP sent to your Telegram. Check your messages.".to_string(),
    }))
}

/// POST /api/auth/verify-otp
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<impl IntoResponse, ApiError> {
    let chat_id = body.chat_id;
    let otp = body.otp.trim().to_string();

    if otp.len() != 6 || otp.parse::<u32>().is_err() {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            "Invalid OTP format. Must be 6 digits.",
        ));
    }

    let valid = db::verify_otp_session(&state.pool, chat_id, &otp)
        .await
        .unwrap_or(false);
    if !valid {
        return Err(fail(
            StatusCode::UNAUTHORIZED,
            "Invalid or expired OTP code.",
        ));
    }

    let _ = db::upsert_user(&state.pool, chat_id, None).await;

    let token = auth::issue_jwt(chat_id, &state.jwt_secret, state.session_ttl)
        .map_err(|e| fail(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to create session: {}", e)))?;

    if let Err(e) = db::create_jwt_session(&state.pool, chat_id, &token, state.session_ttl).await {
        warn!("Failed to store JWT session: {}", e);
        return Err(fail(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to create session",
        ));
    }

    info!("User {} authenticated via OTP", chat_id);

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        auth::SESSION_COOKIE,
        token,
        state.session_ttl
    );
    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", cookie.parse().unwrap());

    Ok((
        headers,
        Json(AuthResponse {
            token,
            expires_in: state.session_ttl,
            chat_id,
        }),
    ))
}

/// DELETE /api/auth/logout
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Ok(user) = auth::require_user(&headers, &state).await {
        let _ = db::delete_session(&state.pool, &user.token).await;
        info!("User {} logged out", user.chat_id);
    }

    // Clear cookie
    let mut resp_headers = HeaderMap::new();
    resp_headers.insert(
        "Set-Cookie",
        format!(
            "{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0",
            auth::SESSION_COOKIE
        )
        .parse()
        .unwrap(),
    );

    (
        resp_headers,
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

// ====== RECIPE ROUTES ======

/// GET /api/search?q=<name> or ?area=<cuisine>
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(q) = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let meals = state.client.search(q).await.map_err(upstream_error)?;
        let meals = refine_by_name(meals, q);
        let summaries: Vec<MealSummary> = meals.iter().map(|m| m.summary()).collect();
        return Ok(Json(serde_json::json!({ "query": q, "meals": summaries })));
    }

    if let Some(area) = params
        .area
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let meals = state
            .client
            .filter_by_area(area)
            .await
            .map_err(upstream_error)?;
        let summaries: Vec<MealSummary> = meals
            .iter()
            .map(|m| {
                let mut summary = m.summary();
                // Filter responses are partial records without an area
                summary.area.get_or_insert_with(|| area.to_string());
                summary
            })
            .collect();
        return Ok(Json(serde_json::json!({ "area": area, "meals": summaries })));
    }

    Err(fail(
        StatusCode::BAD_REQUEST,
        "Provide a 'q' or 'area' query parameter",
    ))
}

/// GET /api/meals/random
pub async fn random_meal(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let meal = state.client.random().await.map_err(upstream_error)?;
    match meal {
        Some(record) => Ok(Json(serde_json::json!({ "meal": record }))),
        None => Err(fail(StatusCode::NOT_FOUND, "No meal returned")),
    }
}

/// GET /api/meals/:id
pub async fn get_meal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let meal = state.client.lookup(&id).await.map_err(upstream_error)?;
    match meal {
        Some(record) => Ok(Json(serde_json::json!({ "meal": record }))),
        None => Err(fail(StatusCode::NOT_FOUND, format!("No meal with id {}", id))),
    }
}

// ====== FAVORITES ROUTES ======

/// GET /api/favorites
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<FavoriteMeal>>, ApiError> {
    let user = auth::require_user(&headers, &state).await?;

    let list = state.favorites.list(user.chat_id).await.map_err(|e| {
        warn!("Failed to load favorites for {}: {}", user.chat_id, e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load favorites")
    })?;

    Ok(Json(list))
}

/// PUT /api/favorites - add a meal (idempotent)
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<FavoriteMeal>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let user = auth::require_user(&headers, &state).await?;

    if body.name.trim().is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "Meal name is required"));
    }

    let added = state
        .favorites
        .add(user.chat_id, body)
        .await
        .map_err(|e| {
            warn!("Failed to add favorite for {}: {}", user.chat_id, e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save favorite")
        })?;
    let count = state.favorites.count(user.chat_id).await.unwrap_or(0);

    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(serde_json::json!({ "added": added, "count": count })),
    ))
}

/// DELETE /api/favorites/:name - remove a meal (idempotent)
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = auth::require_user(&headers, &state).await?;

    let removed = state
        .favorites
        .remove(user.chat_id, &name)
        .await
        .map_err(|e| {
            warn!("Failed to remove favorite for {}: {}", user.chat_id, e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to remove favorite")
        })?;
    let count = state.favorites.count(user.chat_id).await.unwrap_or(0);

    Ok(Json(
        serde_json::json!({ "removed": removed, "count": count }),
    ))
}

// ====== ADMIN ROUTES ======

/// GET /api/admin/stats
pub async fn admin_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<db::SystemStats>, ApiError> {
    auth::require_admin(&headers, &state).await?;

    let stats = db::get_system_stats(&state.pool).await.map_err(|e| {
        warn!("Failed to compute stats: {}", e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to compute stats")
    })?;

    Ok(Json(stats))
}
