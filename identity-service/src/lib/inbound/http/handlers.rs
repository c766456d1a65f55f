use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::domain::auth::models::RequestContext;
use crate::domain::errors::DomainError;
use crate::domain::errors::Fault;
use crate::domain::errors::Outcome;
use crate::domain::user::models::Permission;
use crate::inbound::http::middleware::AuthenticatedUser;

pub mod create_user;
pub mod delete_user;
pub mod get_user;
pub mod health;
pub mod login;
pub mod logout;
pub mod refresh;
pub mod register;
pub mod restore_user;

const INTERNAL_ERROR_MESSAGE: &str = "An unexpected internal server error has occurred.";

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Expected failure decided by the domain
    Domain(DomainError),
    /// Unexpected failure; `detail` is only set when fault details are exposed
    Internal {
        trace_id: String,
        detail: Option<String>,
    },
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
}

impl ApiError {
    /// Log a fault and turn it into a generic internal error.
    ///
    /// # Arguments
    /// * `fault` - Failure that terminated the request
    /// * `ctx` - Request context; its correlation id becomes the trace id
    /// * `expose_details` - Include the fault text in the response body
    pub fn fault(fault: Fault, ctx: &RequestContext, expose_details: bool) -> Self {
        tracing::error!(correlation_id = %ctx.correlation_id, "Request failed: {}", fault);

        ApiError::Internal {
            trace_id: ctx.correlation_id.clone(),
            detail: expose_details.then(|| fault.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(error) => domain_status(error),
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

fn domain_status(error: &DomainError) -> StatusCode {
    match error {
        DomainError::NameRequired
        | DomainError::EmailRequired
        | DomainError::EmailInvalid
        | DomainError::PasswordRequired
        | DomainError::RefreshTokenRequired => StatusCode::BAD_REQUEST,
        DomainError::InvalidCredentials
        | DomainError::RefreshTokenExpired
        | DomainError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
        DomainError::Deleted => StatusCode::FORBIDDEN,
        DomainError::NotFound => StatusCode::NOT_FOUND,
        DomainError::EmailAlreadyExists | DomainError::AlreadyDeleted | DomainError::NotDeleted => {
            StatusCode::CONFLICT
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        ApiError::Domain(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let data = match self {
            ApiError::Domain(error) => ApiErrorData::new(error.code(), error.to_string()),
            ApiError::Internal { trace_id, detail } => ApiErrorData {
                code: "server.internal".to_string(),
                message: INTERNAL_ERROR_MESSAGE.to_string(),
                trace_id: Some(trace_id),
                detail,
            },
            ApiError::BadRequest(msg) => ApiErrorData::new("request.invalid", msg),
            ApiError::Unauthorized(msg) => ApiErrorData::new("auth.unauthorized", msg),
            ApiError::Forbidden(msg) => ApiErrorData::new("auth.forbidden", msg),
        };

        (status, Json(ApiResponseBody::new(status, data))).into_response()
    }
}

/// Split a service result into the success value or an [`ApiError`].
pub fn resolve<T>(
    result: Result<Outcome<T>, Fault>,
    ctx: &RequestContext,
    expose_fault_details: bool,
) -> Result<T, ApiError> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(ApiError::Domain(error)),
        Err(fault) => Err(ApiError::fault(fault, ctx, expose_fault_details)),
    }
}

/// Reject callers whose access token does not grant `permission`.
pub fn require_permission(user: &AuthenticatedUser, permission: Permission) -> Result<(), ApiError> {
    if user.has_permission(permission) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.user_id, permission = %permission, "Permission denied");
        Err(ApiError::Forbidden(format!("Missing permission {}", permission)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiErrorData {
    fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            trace_id: None,
            detail: None,
        }
    }
}
