use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;

use super::refresh::RefreshTokenRequest;
use super::resolve;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::auth::models::RequestContext;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    let result = state.auth_service.logout(&ctx, &body.refresh_token).await;
    resolve(result, &ctx, state.expose_fault_details).map(|_| ApiSuccess::new(StatusCode::NO_CONTENT, ()))
}
