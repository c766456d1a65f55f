use std::sync::Arc;

use auth::PasswordHasher;
use identity_service::config::BootstrapConfig;
use identity_service::config::Config;
use identity_service::domain::auth::models::RegisterCommand;
use identity_service::domain::auth::models::RequestContext;
use identity_service::domain::auth::ports::AuthServicePort;
use identity_service::domain::auth::service::AuthService;
use identity_service::domain::auth::tokens::TokenIssuer;
use identity_service::domain::errors::DomainError;
use identity_service::domain::user::models::Role;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::audit::ChannelAuditSink;
use identity_service::outbound::audit::TracingAuditSink;
use identity_service::outbound::repositories::InMemoryRefreshTokenRepository;
use identity_service::outbound::repositories::InMemoryUserRepository;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug,audit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        jwt_issuer = %config.jwt.issuer,
        jwt_audience = %config.jwt.audience,
        access_token_minutes = config.jwt.access_token_minutes,
        refresh_token_days = config.jwt.refresh_token_days,
        operation_timeout_ms = config.storage.operation_timeout_ms,
        "Configuration loaded"
    );

    let password_hasher = PasswordHasher::with_params((&config.password).into())?;
    let token_issuer = Arc::new(TokenIssuer::new(
        config.jwt.secret.as_bytes(),
        &config.jwt.issuer,
        &config.jwt.audience,
        chrono::Duration::minutes(config.jwt.access_token_minutes),
        chrono::Duration::days(config.jwt.refresh_token_days),
    )?);

    let user_repository = Arc::new(InMemoryUserRepository::new());
    let refresh_token_repository = Arc::new(InMemoryRefreshTokenRepository::new());
    let (audit_sink, audit_worker) = ChannelAuditSink::spawn(Arc::new(TracingAuditSink::new()));
    let audit_sink = Arc::new(audit_sink);

    let auth_service = Arc::new(AuthService::new(
        user_repository,
        refresh_token_repository,
        Arc::clone(&audit_sink),
        password_hasher,
        Arc::clone(&token_issuer),
        config.storage.operation_timeout(),
    ));

    if let Some(bootstrap) = &config.bootstrap {
        bootstrap_admin(auth_service.as_ref(), bootstrap).await?;
    }

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        auth_service,
        token_issuer,
        audit_sink,
        config.server.expose_fault_details,
    );

    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    // Every sink handle is gone once the router is dropped; wait for queued audit events
    audit_worker.await?;
    tracing::info!("Server exited successfully");

    Ok(())
}

async fn bootstrap_admin(service: &dyn AuthServicePort, bootstrap: &BootstrapConfig) -> Result<(), anyhow::Error> {
    let ctx = RequestContext::generate();
    let command = RegisterCommand {
        name: bootstrap.admin_name.clone(),
        email: bootstrap.admin_email.clone(),
        password: bootstrap.admin_password.clone(),
        role: Role::Admin,
    };

    match service.register(&ctx, command).await? {
        Ok(admin) => tracing::info!(user_id = %admin.id, "Bootstrap administrator created"),
        Err(DomainError::EmailAlreadyExists) => tracing::info!("Bootstrap administrator already exists"),
        Err(error) => tracing::warn!(code = error.code(), "Bootstrap administrator rejected: {}", error),
    }

    Ok(())
}
