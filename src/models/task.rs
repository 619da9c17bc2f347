use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::TaskField;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
pub enum TaskStatus {
    #[serde(rename = "To Do")]
    #[sqlx(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Process")]
    #[sqlx(rename = "In Process")]
    InProcess,
    #[serde(rename = "Completed")]
    #[sqlx(rename = "Completed")]
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::ToDo
    }
}

/// Lower priority value means higher urgency.
pub const DEFAULT_PRIORITY: i64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub description: String,
    pub priority: i64,
    pub status: TaskStatus,
    pub comment: Option<String>,
    /// Id of the last caller whose mutation was accepted; null until first edit.
    pub last_changed_by: Option<Uuid>,
    pub assigned_by: Uuid,
    pub assigned_to: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbTask {
    pub id: Uuid,
    pub description: String,
    pub priority: i64,
    pub status: TaskStatus,
    pub comment: Option<String>,
    pub last_changed_by: Option<Uuid>,
    pub assigned_by: Uuid,
    pub assigned_to: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbTask> for Task {
    type Error = AppError;

    fn try_from(value: DbTask) -> Result<Self, Self::Error> {
        Ok(Task {
            id: value.id,
            description: value.description,
            priority: value.priority,
            status: value.status,
            comment: value.comment,
            last_changed_by: value.last_changed_by,
            assigned_by: value.assigned_by,
            assigned_to: value.assigned_to,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// Assigner and assignee come from the caller and the path target, never
/// from the payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TaskCreateRequest {
    #[schema(example = "Prepare quarterly report")]
    pub description: String,
    #[schema(example = 2)]
    pub priority: Option<i64>,
    pub status: Option<TaskStatus>,
    pub comment: Option<String>,
}

/// Partial task update. The assignee is deliberately absent: reassignment is
/// not representable, and unknown keys fail deserialization rather than being
/// silently dropped.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct TaskUpdateRequest {
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub status: Option<TaskStatus>,
    pub comment: Option<String>,
}

impl TaskUpdateRequest {
    pub fn fields(&self) -> Vec<TaskField> {
        let mut fields = Vec::new();
        if self.description.is_some() {
            fields.push(TaskField::Description);
        }
        if self.priority.is_some() {
            fields.push(TaskField::Priority);
        }
        if self.status.is_some() {
            fields.push(TaskField::Status);
        }
        if self.comment.is_some() {
            fields.push(TaskField::Comment);
        }
        fields
    }
}
