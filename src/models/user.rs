use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{Role, UserField};
use crate::errors::AppError;

/// Public view of an account. The credential hash and session tokens never
/// leave the store through this type.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub email: String,
    pub contact_no: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub email: String,
    pub password_hash: String,
    pub contact_no: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbUser> for User {
    type Error = AppError;

    fn try_from(value: DbUser) -> Result<Self, Self::Error> {
        Ok(User {
            id: value.id,
            name: value.name,
            role: value.role,
            email: value.email,
            contact_no: value.contact_no,
            address: value.address,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
    /// Defaults to employee when absent.
    pub role: Option<Role>,
    #[schema(example = "+62 811 000 111")]
    pub contact_no: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Partial account update. Which of these fields a caller may set is decided
/// by the authorization policy, never by the payload shape. Unknown keys fail
/// deserialization rather than being silently dropped.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UserUpdateRequest {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub contact_no: Option<String>,
    pub address: Option<String>,
}

impl UserUpdateRequest {
    /// Fields the caller is actually asking to change.
    pub fn fields(&self) -> Vec<UserField> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push(UserField::Name);
        }
        if self.role.is_some() {
            fields.push(UserField::Role);
        }
        if self.email.is_some() {
            fields.push(UserField::Email);
        }
        if self.password.is_some() {
            fields.push(UserField::Password);
        }
        if self.contact_no.is_some() {
            fields.push(UserField::ContactNo);
        }
        if self.address.is_some() {
            fields.push(UserField::Address);
        }
        fields
    }
}
