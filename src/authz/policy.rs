use crate::errors::AppError;

use super::{Action, Resource, Role, TaskField, UpdateField, UserField};

/// Permit/deny verdict for an operation, before any field-level check.
///
/// `is_owner` means: for tasks, the caller is the assignee; for users, the
/// target record is the caller's own.
pub fn can_perform(role: Role, resource: Resource, action: Action, is_owner: bool) -> bool {
    match (resource, action, role) {
        // Registration is open; everything else on tasks is manager-driven.
        (Resource::User, Action::Create, _) => true,
        (Resource::Task, Action::Create, Role::Manager) => true,
        (Resource::Task, Action::Create, Role::Employee) => false,

        // Reads are always permitted; the query scope narrows what is visible.
        (Resource::Task, Action::Read, _) => true,
        (Resource::User, Action::Read, Role::Manager) => true,
        (Resource::User, Action::Read, Role::Employee) => is_owner,

        (Resource::Task, Action::Update, Role::Manager) => true,
        (Resource::Task, Action::Update, Role::Employee) => is_owner,
        (Resource::Task, Action::Delete, Role::Manager) => true,
        (Resource::Task, Action::Delete, Role::Employee) => false,

        (Resource::User, Action::Update, Role::Manager) => true,
        (Resource::User, Action::Update, Role::Employee) => is_owner,
        (Resource::User, Action::Delete, Role::Manager) => true,
        (Resource::User, Action::Delete, Role::Employee) => false,

        // Reports are read-only and manager-only.
        (Resource::Report, Action::Read, Role::Manager) => true,
        (Resource::Report, _, _) => false,
    }
}

pub fn permitted_task_fields(role: Role, is_owner: bool) -> &'static [TaskField] {
    match role {
        Role::Manager => &[
            TaskField::Description,
            TaskField::Priority,
            TaskField::Status,
            TaskField::Comment,
        ],
        Role::Employee if is_owner => &[TaskField::Status, TaskField::Comment],
        Role::Employee => &[],
    }
}

pub fn permitted_user_fields(role: Role, is_self: bool) -> &'static [UserField] {
    match role {
        Role::Manager => &[
            UserField::Name,
            UserField::Role,
            UserField::Email,
            UserField::Password,
            UserField::ContactNo,
            UserField::Address,
        ],
        Role::Employee if is_self => &[UserField::Name, UserField::ContactNo, UserField::Address],
        Role::Employee => &[],
    }
}

/// Rejects the whole update when any requested field falls outside the
/// allowlist. Partial application is never attempted.
pub fn ensure_fields_allowed<F: UpdateField>(
    requested: &[F],
    permitted: &[F],
) -> Result<(), AppError> {
    let rejected: Vec<&str> = requested
        .iter()
        .filter(|field| !permitted.contains(*field))
        .map(|field| field.name())
        .collect();

    if rejected.is_empty() {
        return Ok(());
    }

    tracing::debug!(fields = ?rejected, "update rejected by field allowlist");
    Err(AppError::forbidden(format!(
        "invalid updates: {}",
        rejected.join(", ")
    )))
}
