use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::login::TokenData;
use super::resolve;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::auth::models::RequestContext;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn refresh(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<ApiSuccess<TokenData>, ApiError> {
    let result = state.auth_service.refresh(&ctx, &body.refresh_token).await;
    resolve(result, &ctx, state.expose_fault_details).map(|tokens| ApiSuccess::new(StatusCode::OK, tokens.into()))
}

/// Body shared by refresh and logout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub refresh_token: String,
}
