//! Manager-facing load report: mean task priority per assignee, computed by
//! the store's aggregation over the full task set. Read-only and independent
//! of the task listing filters.

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Query-string form; anything that isn't "asc" sorts descending, which
    /// is also the default when the parameter is absent.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some(value) if value.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AssigneeLoad {
    pub assignee: Uuid,
    /// Arithmetic mean of the assignee's task priorities.
    pub avg_priority: f64,
}

pub async fn load_report(pool: &SqlitePool, direction: SortDirection) -> AppResult<Vec<AssigneeLoad>> {
    let sql = match direction {
        SortDirection::Asc => {
            "SELECT assigned_to AS assignee, AVG(priority) AS avg_priority \
             FROM tasks GROUP BY assigned_to ORDER BY avg_priority ASC"
        }
        SortDirection::Desc => {
            "SELECT assigned_to AS assignee, AVG(priority) AS avg_priority \
             FROM tasks GROUP BY assigned_to ORDER BY avg_priority DESC"
        }
    };

    let rows = sqlx::query_as::<_, AssigneeLoad>(sql).fetch_all(pool).await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_defaults_to_descending() {
        assert_eq!(SortDirection::from_param(None), SortDirection::Desc);
        assert_eq!(SortDirection::from_param(Some("DESC")), SortDirection::Desc);
        assert_eq!(SortDirection::from_param(Some("asc")), SortDirection::Asc);
        assert_eq!(SortDirection::from_param(Some("ASC")), SortDirection::Asc);
        assert_eq!(SortDirection::from_param(Some("sideways")), SortDirection::Desc);
    }
}
