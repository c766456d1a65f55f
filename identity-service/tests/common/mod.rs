#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use auth::PasswordHasher;
use auth::PasswordParams;
use identity_service::domain::audit::ports::AuditSink;
use identity_service::domain::auth::models::RegisterCommand;
use identity_service::domain::auth::models::RequestContext;
use identity_service::domain::auth::ports::AuthServicePort;
use identity_service::domain::auth::service::AuthService;
use identity_service::domain::auth::tokens::TokenIssuer;
use identity_service::domain::user::models::Role;
use identity_service::domain::user::models::User;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::audit::InMemoryAuditSink;
use identity_service::outbound::repositories::InMemoryRefreshTokenRepository;
use identity_service::outbound::repositories::InMemoryUserRepository;
use serde_json::json;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const ADMIN_EMAIL: &str = "admin@x.com";
pub const ADMIN_PASSWORD: &str = "Admin1!";

pub type TestAuthService = AuthService<InMemoryUserRepository, InMemoryRefreshTokenRepository, InMemoryAuditSink>;

/// Service wired to in-memory adapters with cheap Argon2 parameters.
pub struct TestServices {
    pub auth_service: Arc<TestAuthService>,
    pub token_issuer: Arc<TokenIssuer>,
    pub users: Arc<InMemoryUserRepository>,
    pub refresh_tokens: Arc<InMemoryRefreshTokenRepository>,
    pub audit: Arc<InMemoryAuditSink>,
}

impl TestServices {
    pub fn new() -> Self {
        Self::with_refresh_lifetime(chrono::Duration::days(7))
    }

    pub fn with_refresh_lifetime(refresh_lifetime: chrono::Duration) -> Self {
        let password_hasher = PasswordHasher::with_params(PasswordParams {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .expect("valid Argon2 parameters");
        let token_issuer = Arc::new(TokenIssuer::new(
            TEST_SECRET,
            "identity-test",
            "identity-test-clients",
            chrono::Duration::minutes(15),
            refresh_lifetime,
        )
        .expect("valid secret"));
        let users = Arc::new(InMemoryUserRepository::new());
        let refresh_tokens = Arc::new(InMemoryRefreshTokenRepository::new());
        let audit = Arc::new(InMemoryAuditSink::new());

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&users),
            Arc::clone(&refresh_tokens),
            Arc::clone(&audit),
            password_hasher,
            Arc::clone(&token_issuer),
            Duration::from_secs(2),
        ));

        Self {
            auth_service,
            token_issuer,
            users,
            refresh_tokens,
            audit,
        }
    }

    /// Register a user directly through the service.
    pub async fn register(&self, name: &str, email: &str, password: &str, role: Role) -> User {
        self.auth_service
            .register(
                &RequestContext::generate(),
                RegisterCommand {
                    name: name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    role,
                },
            )
            .await
            .expect("no fault")
            .expect("registration should succeed")
    }
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub services: TestServices,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with(TestServices::new(), false).await
    }

    pub async fn spawn_with(services: TestServices, expose_fault_details: bool) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let router = create_router(
            Arc::clone(&services.auth_service) as Arc<dyn AuthServicePort>,
            Arc::clone(&services.token_issuer),
            Arc::clone(&services.audit) as Arc<dyn AuditSink>,
            expose_fault_details,
        );

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            services,
            api_client: reqwest::Client::new(),
        }
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Log in over HTTP and return the response body
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Create the administrator and return its access token
    pub async fn admin_token(&self) -> String {
        self.services
            .register("Admin", ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin)
            .await;

        let body: serde_json::Value = self
            .login(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .json()
            .await
            .expect("Failed to parse response");

        body["data"]["access_token"]
            .as_str()
            .expect("login should return an access token")
            .to_string()
    }
}
