use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{self, Action, Resource};
use crate::errors::{AppError, AppResult};
use crate::models::task::{DbTask, Task, TaskCreateRequest, TaskUpdateRequest, DEFAULT_PRIORITY};
use crate::query::{TaskListParams, TaskQuery};
use crate::sessions::CurrentUser;
use crate::utils::utc_now;

#[utoipa::path(
    post,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "Employee the task is assigned to")),
    request_body = TaskCreateRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 403, description = "Caller is not a manager"),
        (status = 404, description = "Target employee not found")
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    caller: CurrentUser,
    Json(payload): Json<TaskCreateRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    if !authz::can_perform(caller.user.role, Resource::Task, Action::Create, false) {
        return Err(AppError::forbidden("only managers can create tasks"));
    }

    let description = payload.description.trim();
    if description.is_empty() {
        return Err(AppError::bad_request("description: task description required"));
    }

    // Assignee must be a real account; it is fixed for the task's lifetime.
    super::users::fetch_user(&state.pool, id)
        .await
        .map_err(|_| AppError::not_found("employee not found"))?;

    let task_id = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO tasks (id, description, priority, status, comment, last_changed_by, assigned_by, assigned_to, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(task_id)
    .bind(description)
    .bind(payload.priority.unwrap_or(DEFAULT_PRIORITY))
    .bind(payload.status.unwrap_or_default())
    .bind(&payload.comment)
    .bind(Option::<Uuid>::None)
    .bind(caller.id())
    .bind(id)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let task: Task = fetch_task(&state.pool, task_id).await?.try_into()?;

    tracing::info!(task_id = %task.id, assigned_to = %id, "task created");

    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    get,
    path = "/tasks",
    tag = "Tasks",
    responses((status = 200, description = "Tasks visible to the caller", body = [Task]))
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
    caller: CurrentUser,
) -> AppResult<Json<Vec<Task>>> {
    let query = TaskQuery::for_caller(caller.user.role, caller.id(), &params);
    let tasks = query.fetch(&state.pool).await?;
    Ok(Json(tasks))
}

#[utoipa::path(
    patch,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = TaskUpdateRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 403, description = "Field set not permitted for this caller"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    caller: CurrentUser,
    Json(payload): Json<TaskUpdateRequest>,
) -> AppResult<Json<Task>> {
    let mut task = fetch_task(&state.pool, id).await?;
    let is_owner = task.assigned_to == caller.id();

    if !authz::can_perform(caller.user.role, Resource::Task, Action::Update, is_owner) {
        return Err(AppError::forbidden("not allowed to update this task"));
    }

    let requested = payload.fields();
    authz::ensure_fields_allowed(
        &requested,
        authz::permitted_task_fields(caller.user.role, is_owner),
    )?;

    // Nothing requested: no mutation, no last-modifier stamp.
    if requested.is_empty() {
        return Ok(Json(task.try_into()?));
    }

    let TaskUpdateRequest {
        description,
        priority,
        status,
        comment,
    } = payload;

    if let Some(description) = description {
        if description.trim().is_empty() {
            return Err(AppError::bad_request("description: task description required"));
        }
        task.description = description.trim().to_string();
    }
    if let Some(priority) = priority {
        task.priority = priority;
    }
    if let Some(status) = status {
        task.status = status;
    }
    if let Some(comment) = comment {
        task.comment = Some(comment);
    }

    let now = utc_now();
    sqlx::query(
        "UPDATE tasks SET description = ?, priority = ?, status = ?, comment = ?, last_changed_by = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&task.description)
    .bind(task.priority)
    .bind(task.status)
    .bind(&task.comment)
    .bind(caller.id())
    .bind(now)
    .bind(task.id)
    .execute(&state.pool)
    .await?;

    let task: Task = fetch_task(&state.pool, id).await?.try_into()?;
    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 403, description = "Caller is not a manager"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    caller: CurrentUser,
) -> AppResult<StatusCode> {
    if !authz::can_perform(caller.user.role, Resource::Task, Action::Delete, false) {
        return Err(AppError::forbidden("you are not eligible for this operation"));
    }

    let affected = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("task not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_task(pool: &SqlitePool, task_id: Uuid) -> AppResult<DbTask> {
    sqlx::query_as::<_, DbTask>(
        "SELECT id, description, priority, status, comment, last_changed_by, assigned_by, assigned_to, created_at, updated_at \
         FROM tasks WHERE id = ?",
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("task not found"))
}
