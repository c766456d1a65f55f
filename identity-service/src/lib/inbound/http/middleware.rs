use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use crate::domain::audit::events::SecurityAuditEvent;
use crate::domain::auth::models::RequestContext;
use crate::domain::auth::tokens::AccessTokenClaims;
use crate::domain::user::models::Permission;
use crate::domain::user::models::Role;
use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

pub const CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

const MAX_CORRELATION_ID_LENGTH: usize = 128;

/// Extension type to store the authenticated caller in request and response extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub permissions: Vec<String>,
}

impl AuthenticatedUser {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.iter().any(|p| p == permission.as_str())
    }
}

impl From<AccessTokenClaims> for AuthenticatedUser {
    fn from(claims: AccessTokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
            permissions: claims.permissions,
        }
    }
}

/// Middleware that attaches a [`RequestContext`] to every request.
///
/// A well-formed `x-correlation-id` header is reused, otherwise a new id is generated.
/// The id is echoed on the response.
pub async fn correlate(mut req: Request, next: Next) -> Response {
    let ctx = req
        .headers()
        .get(&CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty() && value.len() <= MAX_CORRELATION_ID_LENGTH)
        .map(RequestContext::new)
        .unwrap_or_else(RequestContext::generate);

    let header_value = HeaderValue::from_str(&ctx.correlation_id).ok();
    req.extensions_mut().insert(ctx);

    let mut response = next.run(req).await;
    if let Some(value) = header_value {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

/// Middleware that validates bearer access tokens.
///
/// The caller is stored in request extensions for handlers and copied to the response
/// extensions so the request audit can attribute the request.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_token_from_header(&req)?;

    let claims = state.token_issuer.validate_access_token(token).map_err(|e| {
        tracing::warn!("Access token validation failed: {}", e);
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;

    let user = AuthenticatedUser::from(claims);
    req.extensions_mut().insert(user.clone());

    let mut response = next.run(req).await;
    response.extensions_mut().insert(user);
    Ok(response)
}

/// Middleware that writes one security audit event per completed request.
pub async fn audit_request(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let correlation_id = req
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.correlation_id.clone())
        .unwrap_or_default();

    let response = next.run(req).await;

    let caller = response.extensions().get::<AuthenticatedUser>();
    let event = SecurityAuditEvent {
        timestamp: Utc::now(),
        actor: caller.map(|user| user.user_id),
        role: caller.map(|user| user.role),
        permissions: caller.map(|user| user.permissions.clone()).unwrap_or_default(),
        method,
        path,
        status_code: response.status().as_u16(),
        correlation_id,
    };

    if let Err(e) = state.audit.write_security(&event).await {
        tracing::error!(correlation_id = %event.correlation_id, "Failed to write request audit event: {}", e);
    }

    response
}

fn extract_token_from_header(req: &Request) -> Result<&str, ApiError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

    auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthorized("Invalid Authorization header format. Expected: Bearer <token>".to_string())
    })
}
