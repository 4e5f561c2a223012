/// OTP generation, JWT management, and auth helpers for the dashboard API.
///
/// Login is a two-step flow: the user requests a one-time code, the bot
/// delivers it over Telegram, and verifying it yields a JWT that is also
/// recorded as a session row. Requests must present a token that passes
/// both JWT validation and the session-row liveness check.
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::routes::MessageResponse;
use crate::AppState;

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "larder_token";

/// JWT claims payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: chat_id as string
    pub sub: String,
    /// Expiration (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub chat_id: i64,
    pub token: String,
}

type AuthError = (StatusCode, Json<MessageResponse>);

fn reject(status: StatusCode, message: impl Into<String>) -> AuthError {
    (
        status,
        Json(MessageResponse {
            message: message.into(),
        }),
    )
}

/// Generate a random 6-digit OTP code.
pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..999_999);
    code.to_string()
}

/// Deliver an OTP code to a Telegram user via the Bot API.
pub async fn deliver_otp(bot_token: &str, chat_id: i64, otp: &str) -> Result<(), String> {
    let url = format!("https://api.telegram.org/bot{}/sendMessage", bot_token);
    let body = serde_json::json!({
        "chat_id": chat_id,
        "text": format!(
            "Your Larder Dashboard code:\n\n<code>{}</code>\n\nThis code expires in 5 minutes.\nDo not share it with anyone.",
            otp
        ),
        "parse_mode": "HTML"
    });

    let resp = reqwest::Client::new()
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("Failed to send Telegram message: {}", e))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        error!("Telegram API error {}: {}", status, text);
        return Err(format!("Telegram API error: {}", status));
    }

    info!("OTP sent to chat_id {}", chat_id);
    Ok(())
}

/// Issue a JWT for a chat_id.
pub fn issue_jwt(chat_id: i64, secret: &str, ttl_secs: i64) -> Result<String, String> {
    let now = Utc::now();
    let claims = Claims {
        sub: chat_id.to_string(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode error: {}", e))
}

/// Validate a JWT and return its claims.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("JWT validation error: {}", e))
}

/// Pull the session token from `Authorization: Bearer` or the cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    let prefix = format!("{}=", SESSION_COOKIE);
    if let Some(cookies) = headers.get("cookie").and_then(|v| v.to_str().ok()) {
        for cookie in cookies.split(';').map(|c| c.trim()) {
            if let Some(token) = cookie.strip_prefix(&prefix) {
                return Some(token.to_string());
            }
        }
    }

    None
}

/// Authenticate the caller. The JWT must verify AND its session row must
/// still be live (logout and TTL cleanup kill the row).
pub async fn require_user(headers: &HeaderMap, state: &AppState) -> Result<AuthUser, AuthError> {
    let token = extract_token(headers)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "No authentication token provided"))?;

    let claims = verify_jwt(&token, &state.jwt_secret)
        .map_err(|e| reject(StatusCode::UNAUTHORIZED, e))?;

    let chat_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| reject(StatusCode::UNAUTHORIZED, "Invalid token subject"))?;

    let live = larder_shared::db::validate_session(&state.pool, &token)
        .await
        .map_err(|_| reject(StatusCode::INTERNAL_SERVER_ERROR, "Session validation failed"))?;

    if live.is_none() {
        return Err(reject(
            StatusCode::UNAUTHORIZED,
            "Session expired or invalid",
        ));
    }

    Ok(AuthUser { chat_id, token })
}

/// Authenticate and require the admin chat id.
pub async fn require_admin(headers: &HeaderMap, state: &AppState) -> Result<AuthUser, AuthError> {
    let user = require_user(headers, state).await?;

    if user.chat_id != state.admin_chat_id {
        return Err(reject(StatusCode::FORBIDDEN, "Admin access required"));
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..50 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.parse::<u32>().is_ok());
        }
    }

    #[test]
    fn jwt_roundtrip() {
        let token = issue_jwt(4242, "secret", 600).unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, "4242");
    }

    #[test]
    fn jwt_rejects_wrong_secret() {
        let token = issue_jwt(4242, "secret", 600).unwrap();
        assert!(verify_jwt(&token, "other-secret").is_err());
    }

    #[test]
    fn token_extraction_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer abc123".parse().unwrap());
        headers.insert("cookie", "larder_token=from-cookie".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn token_extraction_falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            "other=x; larder_token=from-cookie".parse().unwrap(),
        );
        assert_eq!(extract_token(&headers), Some("from-cookie".to_string()));
    }
}
