use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::resolve;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::models::RequestContext;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::auth::models::SessionTokens;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<TokenData>, ApiError> {
    let command = LoginCommand {
        email: body.email,
        password: body.password,
    };

    let result = state.auth_service.login(&ctx, command).await;
    resolve(result, &ctx, state.expose_fault_details).map(|tokens| ApiSuccess::new(StatusCode::OK, tokens.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Token pair returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenData {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl From<SessionTokens> for TokenData {
    fn from(tokens: SessionTokens) -> Self {
        Self {
            access_token: tokens.access_token.token,
            token_type: "Bearer",
            expires_at: tokens.access_token.expires_at,
            refresh_token: tokens.refresh_token.token,
            refresh_token_expires_at: tokens.refresh_token.expires_at,
        }
    }
}
