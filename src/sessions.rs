//! Session lifecycle: issuing, validating and revoking bearer tokens.
//!
//! A token is live while a matching `session_tokens` row exists. Validation
//! always re-reads the store, so a revoked token fails on the very next
//! request even if the JWT itself still verifies.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::JwtConfig;
use crate::models::user::{DbUser, User};
use crate::utils::utc_now;

/// Signs a token for the user and appends it to their active session list.
/// Each login gets its own row; multi-device logins coexist.
pub async fn issue_token(pool: &SqlitePool, jwt: &JwtConfig, user_id: Uuid) -> AppResult<String> {
    let token = jwt.encode(user_id)?;

    sqlx::query("INSERT INTO session_tokens (id, user_id, token, created_at) VALUES (?, ?, ?, ?)")
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&token)
        .bind(utc_now())
        .execute(pool)
        .await?;

    Ok(token)
}

/// Resolves a raw bearer token to its user, or fails with the generic
/// authentication error. Signature problems, unknown users, revoked tokens
/// and store failures are deliberately indistinguishable to the caller.
pub async fn validate_token(pool: &SqlitePool, jwt: &JwtConfig, token: &str) -> AppResult<DbUser> {
    let claims = jwt.decode(token).map_err(|_| AppError::unauthenticated())?;

    let user = sqlx::query_as::<_, DbUser>(
        "SELECT u.id, u.name, u.role, u.email, u.password_hash, u.contact_no, u.address, u.created_at, u.updated_at \
         FROM users u \
         INNER JOIN session_tokens s ON s.user_id = u.id \
         WHERE u.id = ? AND s.token = ?",
    )
    .bind(claims.sub)
    .bind(token)
    .fetch_optional(pool)
    .await
    .map_err(|_| AppError::unauthenticated())?
    .ok_or_else(AppError::unauthenticated)?;

    Ok(user)
}

/// Removes one token from the user's session list (single-device logout).
pub async fn revoke_token(pool: &SqlitePool, user_id: Uuid, token: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM session_tokens WHERE user_id = ? AND token = ?")
        .bind(user_id)
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

/// Clears the user's entire session list (logout everywhere).
pub async fn revoke_all(pool: &SqlitePool, user_id: Uuid) -> AppResult<()> {
    sqlx::query("DELETE FROM session_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// The authenticated caller, resolved fresh from the store on every request.
/// Keeps the raw token so logout can revoke exactly the presented session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(AppError::unauthenticated)?;

        let db_user = validate_token(&state.pool, &state.jwt, token).await?;

        Ok(CurrentUser {
            user: db_user.try_into()?,
            token: token.to_string(),
        })
    }
}
