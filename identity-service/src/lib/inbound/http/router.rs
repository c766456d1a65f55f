use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::create_user::create_user;
use super::handlers::delete_user::delete_user;
use super::handlers::get_user::get_user;
use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::refresh::refresh;
use super::handlers::register::register;
use super::handlers::restore_user::restore_user;
use super::middleware::audit_request;
use super::middleware::authenticate as auth_middleware;
use super::middleware::correlate;
use crate::domain::audit::ports::AuditSink;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::auth::tokens::TokenIssuer;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub token_issuer: Arc<TokenIssuer>,
    pub audit: Arc<dyn AuditSink>,
    pub expose_fault_details: bool,
}

pub fn create_router(
    auth_service: Arc<dyn AuthServicePort>,
    token_issuer: Arc<TokenIssuer>,
    audit: Arc<dyn AuditSink>,
    expose_fault_details: bool,
) -> Router {
    let state = AppState {
        auth_service,
        token_issuer,
        audit,
        expose_fault_details,
    };

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout));

    let protected_routes = Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/:user_id", get(get_user).delete(delete_user))
        .route("/api/users/:user_id/restore", post(restore_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            let correlation_id = request
                .headers()
                .get("x-correlation-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
                correlation_id = %correlation_id,
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(state.clone(), audit_request))
        .layer(middleware::from_fn(correlate))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
