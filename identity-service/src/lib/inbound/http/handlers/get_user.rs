use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::register::UserData;
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

pub async fn get_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    require_permission(&caller, Permission::UsersRead)?;

    let user_id = UserId::from_string(&user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let result = state.auth_service.get_user(&ctx, &user_id).await;
    resolve(result, &ctx, state.expose_fault_details).map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}
