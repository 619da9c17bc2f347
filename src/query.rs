//! Task listing queries: caller-supplied filters folded together with the
//! role-derived visibility scope into a single SQL statement.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::Role;
use crate::errors::AppResult;
use crate::models::task::{DbTask, Task};

/// Optional criteria from the query string. All of them are independent;
/// absent parameters simply contribute nothing.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListParams {
    /// Manager-only narrowing to one assignee. Ignored for employees.
    pub employee_id: Option<Uuid>,
    /// "high" sorts most urgent (lowest value) first; any other value sorts
    /// least urgent first.
    pub priority: Option<String>,
    pub min_date: Option<DateTime<Utc>>,
    pub max_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    All,
    Assignee(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSort {
    CreatedDesc,
    PriorityAsc,
    PriorityDesc,
}

#[derive(Debug, Clone)]
pub struct TaskQuery {
    pub scope: TaskScope,
    pub sort: TaskSort,
    pub created_within: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

const TASK_COLUMNS: &str =
    "id, description, priority, status, comment, last_changed_by, assigned_by, assigned_to, created_at, updated_at";

impl TaskQuery {
    /// Combines the caller's role with their optional parameters.
    ///
    /// Employees are always scoped to their own tasks; a supplied
    /// `employee_id` cannot widen that. The date filter only engages when
    /// both bounds are present.
    pub fn for_caller(role: Role, caller_id: Uuid, params: &TaskListParams) -> Self {
        let scope = match role {
            Role::Manager => match params.employee_id {
                Some(employee_id) => TaskScope::Assignee(employee_id),
                None => TaskScope::All,
            },
            Role::Employee => TaskScope::Assignee(caller_id),
        };

        let sort = match params.priority.as_deref() {
            Some("high") => TaskSort::PriorityAsc,
            Some(_) => TaskSort::PriorityDesc,
            None => TaskSort::CreatedDesc,
        };

        let created_within = match (params.min_date, params.max_date) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        };

        Self {
            scope,
            sort,
            created_within,
        }
    }

    /// Renders the statement. Bind order: assignee (if scoped), then the two
    /// range bounds (if filtered).
    pub fn to_sql(&self) -> String {
        let mut clauses: Vec<&str> = Vec::new();
        if matches!(self.scope, TaskScope::Assignee(_)) {
            clauses.push("assigned_to = ?");
        }
        if self.created_within.is_some() {
            clauses.push("created_at >= ? AND created_at <= ?");
        }

        let mut sql = format!("SELECT {} FROM tasks", TASK_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        sql.push_str(match self.sort {
            TaskSort::CreatedDesc => " ORDER BY created_at DESC",
            TaskSort::PriorityAsc => " ORDER BY priority ASC",
            TaskSort::PriorityDesc => " ORDER BY priority DESC",
        });

        sql
    }

    /// Runs the query and returns the full ordered result set. Employee scope
    /// can legitimately yield zero or many rows; callers must not assume one.
    pub async fn fetch(&self, pool: &SqlitePool) -> AppResult<Vec<Task>> {
        let sql = self.to_sql();
        let mut query = sqlx::query_as::<_, DbTask>(&sql);

        if let TaskScope::Assignee(assignee) = self.scope {
            query = query.bind(assignee);
        }
        if let Some((min, max)) = self.created_within {
            query = query.bind(min).bind(max);
        }

        let rows = query.fetch_all(pool).await?;
        rows.into_iter().map(Task::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn params() -> TaskListParams {
        TaskListParams::default()
    }

    #[test]
    fn manager_without_target_sees_everything() {
        let query = TaskQuery::for_caller(Role::Manager, Uuid::new_v4(), &params());
        assert_eq!(query.scope, TaskScope::All);
        assert_eq!(query.sort, TaskSort::CreatedDesc);
        assert!(query.created_within.is_none());
        assert_eq!(
            query.to_sql(),
            format!("SELECT {} FROM tasks ORDER BY created_at DESC", TASK_COLUMNS)
        );
    }

    #[test]
    fn manager_can_narrow_to_one_assignee() {
        let target = Uuid::new_v4();
        let query = TaskQuery::for_caller(
            Role::Manager,
            Uuid::new_v4(),
            &TaskListParams {
                employee_id: Some(target),
                ..params()
            },
        );
        assert_eq!(query.scope, TaskScope::Assignee(target));
        assert!(query.to_sql().contains("WHERE assigned_to = ?"));
    }

    #[test]
    fn employee_cannot_widen_scope() {
        let caller = Uuid::new_v4();
        let someone_else = Uuid::new_v4();
        let query = TaskQuery::for_caller(
            Role::Employee,
            caller,
            &TaskListParams {
                employee_id: Some(someone_else),
                ..params()
            },
        );
        assert_eq!(query.scope, TaskScope::Assignee(caller));
    }

    #[test]
    fn priority_parameter_picks_the_sort_direction() {
        let high = TaskQuery::for_caller(
            Role::Manager,
            Uuid::new_v4(),
            &TaskListParams {
                priority: Some("high".to_string()),
                ..params()
            },
        );
        assert_eq!(high.sort, TaskSort::PriorityAsc);

        let low = TaskQuery::for_caller(
            Role::Manager,
            Uuid::new_v4(),
            &TaskListParams {
                priority: Some("low".to_string()),
                ..params()
            },
        );
        assert_eq!(low.sort, TaskSort::PriorityDesc);
    }

    #[test]
    fn date_filter_needs_both_bounds() {
        let min = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
        let max = Utc.with_ymd_and_hms(2023, 5, 5, 0, 0, 0).unwrap();

        let only_min = TaskQuery::for_caller(
            Role::Manager,
            Uuid::new_v4(),
            &TaskListParams {
                min_date: Some(min),
                ..params()
            },
        );
        assert!(only_min.created_within.is_none());

        let both = TaskQuery::for_caller(
            Role::Manager,
            Uuid::new_v4(),
            &TaskListParams {
                min_date: Some(min),
                max_date: Some(max),
                ..params()
            },
        );
        assert_eq!(both.created_within, Some((min, max)));
        assert!(both
            .to_sql()
            .contains("WHERE created_at >= ? AND created_at <= ?"));
    }

    #[test]
    fn scope_and_filter_combine_conjunctively() {
        let min = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
        let max = Utc.with_ymd_and_hms(2023, 5, 5, 0, 0, 0).unwrap();
        let query = TaskQuery::for_caller(
            Role::Employee,
            Uuid::new_v4(),
            &TaskListParams {
                priority: Some("high".to_string()),
                min_date: Some(min),
                max_date: Some(max),
                ..params()
            },
        );
        assert_eq!(
            query.to_sql(),
            format!(
                "SELECT {} FROM tasks WHERE assigned_to = ? AND created_at >= ? AND created_at <= ? ORDER BY priority ASC",
                TASK_COLUMNS
            )
        );
    }
}
