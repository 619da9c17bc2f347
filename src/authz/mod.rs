//! Authorization module - role/ownership policy engine
//!
//! Two roles, three resource kinds. Every decision is a pure function over
//! (role, resource, action, ownership), kept as exhaustive matches so an
//! unhandled combination is a compile error rather than a silent no-op.

mod policy;

pub use policy::{
    can_perform, ensure_fields_allowed, permitted_task_fields, permitted_user_fields,
};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The sole axis of authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Manager,
    Employee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Task,
    User,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

/// A mutable field on some resource kind, as named in update payloads.
pub trait UpdateField: Copy + PartialEq {
    fn name(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Description,
    Priority,
    Status,
    Comment,
}

impl UpdateField for TaskField {
    fn name(self) -> &'static str {
        match self {
            TaskField::Description => "description",
            TaskField::Priority => "priority",
            TaskField::Status => "status",
            TaskField::Comment => "comment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Name,
    Role,
    Email,
    Password,
    ContactNo,
    Address,
}

impl UpdateField for UserField {
    fn name(self) -> &'static str {
        match self {
            UserField::Name => "name",
            UserField::Role => "role",
            UserField::Email => "email",
            UserField::Password => "password",
            UserField::ContactNo => "contact_no",
            UserField::Address => "address",
        }
    }
}
