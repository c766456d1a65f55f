use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::register::UserData;
use super::require_permission;
use super::resolve;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::models::RequestContext;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::Permission;
use crate::domain::user::models::Role;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

/// Create a user with an explicit role. Requires `users:create`.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<CreateUserRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    require_permission(&caller, Permission::UsersCreate)?;

    let command = RegisterCommand {
        name: body.name,
        email: body.email,
        password: body.password,
        role: body.role,
    };

    let result = state.auth_service.register(&ctx, command).await;
    resolve(result, &ctx, state.expose_fault_details).map(|ref user| ApiSuccess::new(StatusCode::CREATED, user.into()))
}

/// HTTP request body for creating a user (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default = "default_role")]
    role: Role,
}

fn default_role() -> Role {
    Role::User
}
