use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Role;
use crate::errors::{AppError, AppResult};
use crate::models::user::{AuthResponse, DbUser, LoginRequest, RegisterRequest, User};
use crate::sessions::{self, CurrentUser};
use crate::utils::{hash_password, utc_now, verify_password};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    message: String,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Malformed record content"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name: user name required"));
    }
    if !payload.email.contains('@') {
        return Err(AppError::bad_request("email: email is invalid"));
    }

    ensure_email_available(&state.pool, &payload.email).await?;

    let password_hash = hash_password(&payload.password)?;
    let role = payload.role.unwrap_or(Role::Employee);
    let now = utc_now();
    let user_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO users (id, name, role, email, password_hash, contact_no, address, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(payload.name.trim())
    .bind(role)
    .bind(&payload.email)
    .bind(password_hash)
    .bind(&payload.contact_no)
    .bind(&payload.address)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let db_user = fetch_user_by_id(&state.pool, user_id).await?;
    let token = sessions::issue_token(&state.pool, &state.jwt, user_id).await?;
    let user: User = db_user.try_into()?;

    tracing::info!(user_id = %user.id, role = ?user.role, "user registered");

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    // Unknown email and wrong password fall through to the same response.
    let db_user = sqlx::query_as::<_, DbUser>(
        "SELECT id, name, role, email, password_hash, contact_no, address, created_at, updated_at \
         FROM users WHERE email = ?",
    )
    .bind(&payload.email)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(AppError::unauthenticated)?;

    let password_ok = verify_password(&payload.password, &db_user.password_hash)?;
    if !password_ok {
        return Err(AppError::unauthenticated());
    }

    let token = sessions::issue_token(&state.pool, &state.jwt, db_user.id).await?;
    let user: User = db_user.try_into()?;

    Ok(Json(AuthResponse { token, user }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Current session revoked"))
)]
pub async fn logout(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    sessions::revoke_token(&state.pool, caller.id(), &caller.token).await?;

    Ok(Json(MessageResponse {
        message: "logged out".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout-all",
    tag = "Auth",
    responses((status = 200, description = "All sessions revoked"))
)]
pub async fn logout_all(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    sessions::revoke_all(&state.pool, caller.id()).await?;

    Ok(Json(MessageResponse {
        message: "logged out everywhere".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses((status = 200, description = "Current user", body = User))
)]
pub async fn me(caller: CurrentUser) -> AppResult<Json<User>> {
    Ok(Json(caller.user))
}

pub(crate) async fn ensure_email_available(pool: &SqlitePool, email: &str) -> AppResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await?;

    if count > 0 {
        return Err(AppError::conflict("email already in use"));
    }

    Ok(())
}

async fn fetch_user_by_id(pool: &SqlitePool, user_id: Uuid) -> AppResult<DbUser> {
    sqlx::query_as::<_, DbUser>(
        "SELECT id, name, role, email, password_hash, contact_no, address, created_at, updated_at \
         FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("user not found"))
}
