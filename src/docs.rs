use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::authz::Role;
use crate::models::task::{Task, TaskCreateRequest, TaskStatus, TaskUpdateRequest};
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest, User, UserUpdateRequest};
use crate::reports::AssigneeLoad;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::logout_all,
        crate::routes::auth::me,
        crate::routes::users::list_users,
        crate::routes::users::update_user,
        crate::routes::users::delete_user,
        crate::routes::tasks::create_task,
        crate::routes::tasks::list_tasks,
        crate::routes::tasks::update_task,
        crate::routes::tasks::delete_task,
        crate::routes::reports::load_report,
        crate::routes::health::health,
    ),
    components(schemas(
        User,
        Role,
        AuthResponse,
        LoginRequest,
        RegisterRequest,
        UserUpdateRequest,
        Task,
        TaskStatus,
        TaskCreateRequest,
        TaskUpdateRequest,
        AssigneeLoad,
    )),
    tags(
        (name = "Auth", description = "Registration, login and session revocation"),
        (name = "Users", description = "Account management"),
        (name = "Tasks", description = "Task assignment and tracking"),
        (name = "Reports", description = "Manager-facing load statistics"),
        (name = "Health", description = "Service liveness")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
