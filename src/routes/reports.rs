use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::app::AppState;
use crate::authz::{self, Action, Resource};
use crate::errors::{AppError, AppResult};
use crate::reports::{self, AssigneeLoad, SortDirection};
use crate::sessions::CurrentUser;

#[derive(Debug, Default, Deserialize)]
pub struct LoadReportQuery {
    /// "asc" or "desc"; defaults to descending.
    pub direction: Option<String>,
}

#[utoipa::path(
    get,
    path = "/reports/load",
    tag = "Reports",
    responses(
        (status = 200, description = "Mean task priority per assignee", body = [AssigneeLoad]),
        (status = 403, description = "Caller is not a manager")
    )
)]
pub async fn load_report(
    State(state): State<AppState>,
    Query(query): Query<LoadReportQuery>,
    caller: CurrentUser,
) -> AppResult<Json<Vec<AssigneeLoad>>> {
    if !authz::can_perform(caller.user.role, Resource::Report, Action::Read, false) {
        return Err(AppError::forbidden("only managers can view load reports"));
    }

    let direction = SortDirection::from_param(query.direction.as_deref());
    let report = reports::load_report(&state.pool, direction).await?;
    Ok(Json(report))
}
