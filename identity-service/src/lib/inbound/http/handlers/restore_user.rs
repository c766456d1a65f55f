use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::require_permission;
use super::resolve;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::auth::models::RequestContext;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::Permission;
use crate::domain::user::models::UserId;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

/// Restore a soft-deleted user. Requires `users:update`.
pub async fn restore_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<()>, ApiError> {
    require_permission(&caller, Permission::UsersUpdate)?;

    let user_id = UserId::from_string(&id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let result = state
        .auth_service
        .restore_user(&ctx, &user_id, Some(caller.user_id))
        .await;
    resolve(result, &ctx, state.expose_fault_details).map(|_| ApiSuccess::new(StatusCode::NO_CONTENT, ()))
}
