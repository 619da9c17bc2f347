use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{self, Action, Resource, Role};
use crate::errors::{AppError, AppResult};
use crate::models::user::{DbUser, User, UserUpdateRequest};
use crate::sessions::CurrentUser;
use crate::utils::{hash_password, utc_now};

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "List users, optionally filtered by role", body = [User]),
        (status = 403, description = "Caller is not a manager")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
    caller: CurrentUser,
) -> AppResult<Json<Vec<User>>> {
    if !authz::can_perform(caller.user.role, Resource::User, Action::Read, false) {
        return Err(AppError::forbidden("only managers can list users"));
    }

    let rows = match query.role {
        Some(role) => {
            sqlx::query_as::<_, DbUser>(
                "SELECT id, name, role, email, password_hash, contact_no, address, created_at, updated_at \
                 FROM users WHERE role = ? ORDER BY created_at DESC",
            )
            .bind(role)
            .fetch_all(&state.pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, DbUser>(
                "SELECT id, name, role, email, password_hash, contact_no, address, created_at, updated_at \
                 FROM users ORDER BY created_at DESC",
            )
            .fetch_all(&state.pool)
            .await?
        }
    };

    let users: Vec<User> = rows.into_iter().map(User::try_from).collect::<Result<_, _>>()?;
    Ok(Json(users))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "Target user id")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 403, description = "Field set not permitted for this caller"),
        (status = 404, description = "Target user not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    caller: CurrentUser,
    Json(payload): Json<UserUpdateRequest>,
) -> AppResult<Json<User>> {
    let is_self = caller.id() == id;

    if !authz::can_perform(caller.user.role, Resource::User, Action::Update, is_self) {
        return Err(AppError::forbidden("can't update other users"));
    }
    authz::ensure_fields_allowed(
        &payload.fields(),
        authz::permitted_user_fields(caller.user.role, is_self),
    )?;

    let mut target = fetch_user(&state.pool, id).await?;

    let UserUpdateRequest {
        name,
        role,
        email,
        password,
        contact_no,
        address,
    } = payload;

    if let Some(name) = name {
        target.name = name;
    }
    if let Some(role) = role {
        target.role = role;
    }
    if let Some(email) = email {
        if email != target.email {
            super::auth::ensure_email_available(&state.pool, &email).await?;
        }
        target.email = email;
    }
    if let Some(password) = password {
        target.password_hash = hash_password(&password)?;
    }
    if let Some(contact_no) = contact_no {
        target.contact_no = Some(contact_no);
    }
    if let Some(address) = address {
        target.address = Some(address);
    }

    let now = utc_now();
    sqlx::query(
        "UPDATE users SET name = ?, role = ?, email = ?, password_hash = ?, contact_no = ?, address = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&target.name)
    .bind(target.role)
    .bind(&target.email)
    .bind(&target.password_hash)
    .bind(&target.contact_no)
    .bind(&target.address)
    .bind(now)
    .bind(target.id)
    .execute(&state.pool)
    .await?;

    let user: User = fetch_user(&state.pool, id).await?.try_into()?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "Target user id")),
    responses(
        (status = 204, description = "User, their sessions and their tasks deleted"),
        (status = 403, description = "Caller is not a manager"),
        (status = 404, description = "Target user not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    caller: CurrentUser,
) -> AppResult<StatusCode> {
    if !authz::can_perform(caller.user.role, Resource::User, Action::Delete, caller.id() == id) {
        return Err(AppError::forbidden("you have no rights for this operation"));
    }

    // One logical operation: the assignee's tasks and sessions go with the
    // account, inside a single transaction.
    let mut tx = state.pool.begin().await?;

    sqlx::query("DELETE FROM tasks WHERE assigned_to = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM session_tokens WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let affected = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("user not found"));
    }

    tx.commit().await?;

    tracing::info!(user_id = %id, deleted_by = %caller.id(), "user deleted with task cascade");

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn fetch_user(pool: &SqlitePool, user_id: Uuid) -> AppResult<DbUser> {
    sqlx::query_as::<_, DbUser>(
        "SELECT id, name, role, email, password_hash, contact_no, address, created_at, updated_at \
         FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("user not found"))
}
