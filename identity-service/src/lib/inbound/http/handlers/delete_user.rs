use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::require_permission;
use super::resolve;
use crate::domain::auth::models::RequestContext;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::Permission;
use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<()>, ApiError> {
    require_permission(&caller, Permission::UsersDelete)?;

    let user_id = UserId::from_string(&id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let result = state
        .auth_service
        .delete_user(&ctx, &user_id, Some(caller.user_id))
        .await;
    resolve(result, &ctx, state.expose_fault_details).map(|_| ApiSuccess::new(StatusCode::NO_CONTENT, ()))
}
