use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::HashedPassword;
use auth::PasswordError;
use auth::PasswordHasher;
use chrono::Utc;

use crate::domain::audit::events::AuditEventType;
use crate::domain::audit::events::BusinessAuditEvent;
use crate::domain::audit::ports::AuditSink;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::models::RefreshTokenRecord;
use crate::domain::auth::models::RefreshTokenState;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::models::RequestContext;
use crate::domain::auth::models::SessionTokens;
use crate::domain::auth::models::TokenFamilyId;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::auth::ports::RefreshTokenRepository;
use crate::domain::auth::tokens::TokenIssuer;
use crate::domain::errors::DomainError;
use crate::domain::errors::Fault;
use crate::domain::errors::Outcome;
use crate::domain::errors::RepositoryError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;

// Verified against when the email is unknown, so both credential failures cost one derivation.
const UNKNOWN_USER_HASH: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";
const UNKNOWN_USER_SALT: &str = "AAAAAAAAAAAAAAAAAAAAAA==";

/// Domain service implementation for authentication and account lifecycle.
///
/// Each operation runs an ordered list of guards. The first failing guard records one
/// business audit event and returns its [`DomainError`]; nothing is written to the
/// stores before every guard has passed. Store calls are bounded by the configured
/// operation timeout and surface as [`Fault::Timeout`].
pub struct AuthService<UR, TR, AS>
where
    UR: UserRepository,
    TR: RefreshTokenRepository,
    AS: AuditSink,
{
    users: Arc<UR>,
    refresh_tokens: Arc<TR>,
    audit: Arc<AS>,
    password_hasher: PasswordHasher,
    token_issuer: Arc<TokenIssuer>,
    operation_timeout: Duration,
}

impl<UR, TR, AS> AuthService<UR, TR, AS>
where
    UR: UserRepository,
    TR: RefreshTokenRepository,
    AS: AuditSink,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `users` - User persistence implementation
    /// * `refresh_tokens` - Refresh token persistence implementation
    /// * `audit` - Audit event sink
    /// * `password_hasher` - Configured Argon2id hasher
    /// * `token_issuer` - Access and refresh token issuer
    /// * `operation_timeout` - Upper bound for each store call
    pub fn new(
        users: Arc<UR>,
        refresh_tokens: Arc<TR>,
        audit: Arc<AS>,
        password_hasher: PasswordHasher,
        token_issuer: Arc<TokenIssuer>,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            audit,
            password_hasher,
            token_issuer,
            operation_timeout,
        }
    }

    async fn bounded<F, T>(&self, operation: F) -> Result<T, Fault>
    where
        F: Future<Output = T> + Send,
    {
        tokio::time::timeout(self.operation_timeout, operation)
            .await
            .map_err(|_| Fault::Timeout(self.operation_timeout))
    }

    async fn store<F, T>(&self, operation: F) -> Result<T, Fault>
    where
        F: Future<Output = Result<T, RepositoryError>> + Send,
    {
        self.bounded(operation).await?.map_err(Fault::from)
    }

    async fn record(&self, event: BusinessAuditEvent) {
        if let Err(e) = self.audit.write_business(&event).await {
            tracing::error!(
                correlation_id = %event.correlation_id,
                "Failed to write {} audit event: {}",
                event.event_type,
                e
            );
        }
    }

    async fn reject<T>(&self, event: BusinessAuditEvent, error: DomainError) -> Result<Outcome<T>, Fault> {
        tracing::debug!(
            correlation_id = %event.correlation_id,
            code = error.code(),
            "{} rejected",
            event.event_type
        );
        self.record(event.with_reason(error)).await;
        Ok(Err(error))
    }

    async fn hash_password(&self, password: String) -> Result<HashedPassword, Fault> {
        let hasher = self.password_hasher.clone();
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))??;
        Ok(hashed)
    }

    async fn verify_password(&self, password: String, hash: String, salt: String) -> Result<bool, Fault> {
        let hasher = self.password_hasher.clone();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash, &salt))
            .await
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
        Ok(verified)
    }
}

#[async_trait]
impl<UR, TR, AS> AuthServicePort for AuthService<UR, TR, AS>
where
    UR: UserRepository,
    TR: RefreshTokenRepository,
    AS: AuditSink,
{
    async fn register(&self, ctx: &RequestContext, command: RegisterCommand) -> Result<Outcome<User>, Fault> {
        let failed = BusinessAuditEvent::new(AuditEventType::UserCreationFailed, None, &ctx.correlation_id)
            .with("email", &command.email);

        if command.name.trim().is_empty() {
            return self.reject(failed, DomainError::NameRequired).await;
        }

        let email = match EmailAddress::parse(&command.email) {
            Ok(email) => email,
            Err(error) => return self.reject(failed, error).await,
        };

        if command.password.trim().is_empty() {
            return self.reject(failed, DomainError::PasswordRequired).await;
        }

        if !self.store(self.users.is_email_unique(email.as_str())).await? {
            return self.reject(failed, DomainError::EmailAlreadyExists).await;
        }

        let password = self.hash_password(command.password).await?;
        let user = User::register(command.name, email, password, command.role);

        match self.bounded(self.users.add(user.clone())).await? {
            Ok(()) => {}
            // Lost a race against a concurrent registration for the same email
            Err(RepositoryError::EmailAlreadyExists(_)) => {
                return self.reject(failed, DomainError::EmailAlreadyExists).await;
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.id, "User registered");
        self.record(
            BusinessAuditEvent::new(AuditEventType::UserCreated, Some(user.id), &ctx.correlation_id)
                .with("email", &user.email)
                .with("role", user.role()),
        )
        .await;

        Ok(Ok(user))
    }

    async fn login(&self, ctx: &RequestContext, command: LoginCommand) -> Result<Outcome<SessionTokens>, Fault> {
        let failed = BusinessAuditEvent::new(AuditEventType::UserLoginFailed, None, &ctx.correlation_id)
            .with("email", &command.email);

        if command.email.trim().is_empty() {
            return self.reject(failed, DomainError::EmailRequired).await;
        }

        if command.password.trim().is_empty() {
            return self.reject(failed, DomainError::PasswordRequired).await;
        }

        let user = match self.store(self.users.find_by_email(&command.email)).await? {
            Some(user) => user,
            None => {
                self.verify_password(
                    command.password,
                    UNKNOWN_USER_HASH.to_string(),
                    UNKNOWN_USER_SALT.to_string(),
                )
                .await?;
                return self.reject(failed, DomainError::InvalidCredentials).await;
            }
        };

        if user.is_deleted() {
            let event = BusinessAuditEvent::new(AuditEventType::UserIsDeleted, Some(user.id), &ctx.correlation_id)
                .with("email", &user.email);
            return self.reject(event, DomainError::Deleted).await;
        }

        let verified = self
            .verify_password(
                command.password,
                user.password_hash().to_string(),
                user.password_salt().to_string(),
            )
            .await?;
        if !verified {
            return self.reject(failed, DomainError::InvalidCredentials).await;
        }

        let now = Utc::now();
        let access_token = self.token_issuer.issue_access_token(&user, now)?;
        let refresh_token = self.token_issuer.issue_refresh_token(now);
        let record = RefreshTokenRecord::issue(user.id, TokenFamilyId::new(), &refresh_token, now);
        let refresh_token_id = record.id;

        self.store(self.refresh_tokens.insert(record)).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        self.record(
            BusinessAuditEvent::new(AuditEventType::UserLoginSucceeded, Some(user.id), &ctx.correlation_id)
                .with("email", &user.email)
                .with("refresh_token_id", refresh_token_id),
        )
        .await;

        Ok(Ok(SessionTokens {
            access_token,
            refresh_token,
        }))
    }

    async fn refresh(&self, ctx: &RequestContext, refresh_token: &str) -> Result<Outcome<SessionTokens>, Fault> {
        let failed = BusinessAuditEvent::new(AuditEventType::TokenRefreshFailed, None, &ctx.correlation_id);

        if refresh_token.trim().is_empty() {
            return self.reject(failed, DomainError::RefreshTokenRequired).await;
        }

        let token_hash = auth::opaque::digest(refresh_token);
        let current = match self.store(self.refresh_tokens.find_by_hash(&token_hash)).await? {
            Some(record) => record,
            None => return self.reject(failed, DomainError::InvalidRefreshToken).await,
        };

        let now = Utc::now();
        let failed = BusinessAuditEvent {
            actor: Some(current.user_id),
            ..failed
        }
        .with("token_id", current.id);

        match current.status_at(now) {
            RefreshTokenState::Active => {}
            RefreshTokenState::Rotated => {
                let revoked = self.store(self.refresh_tokens.revoke_family(&token_hash)).await?;
                tracing::warn!(
                    user_id = %current.user_id,
                    family_id = %current.family_id,
                    "Rotated refresh token presented again, revoked {} token(s)",
                    revoked
                );
                let event = BusinessAuditEvent::new(
                    AuditEventType::RefreshTokenReuseDetected,
                    Some(current.user_id),
                    &ctx.correlation_id,
                )
                .with("token_id", current.id)
                .with("family_id", current.family_id)
                .with("revoked_tokens", revoked);
                return self.reject(event, DomainError::InvalidRefreshToken).await;
            }
            RefreshTokenState::Revoked => {
                return self.reject(failed, DomainError::InvalidRefreshToken).await;
            }
            RefreshTokenState::Expired => {
                return self.reject(failed, DomainError::RefreshTokenExpired).await;
            }
        }

        let user = match self.store(self.users.find_by_id(&current.user_id)).await? {
            Some(user) => user,
            None => return self.reject(failed, DomainError::InvalidRefreshToken).await,
        };

        let access_token = self.token_issuer.issue_access_token(&user, now)?;
        let refresh_token = self.token_issuer.issue_refresh_token(now);
        let replacement = RefreshTokenRecord::issue(user.id, current.family_id, &refresh_token, now);
        let replacement_id = replacement.id;

        if !self.store(self.refresh_tokens.rotate(&token_hash, replacement)).await? {
            // Another request rotated or revoked the token after it was read
            return self.reject(failed, DomainError::InvalidRefreshToken).await;
        }

        self.record(
            BusinessAuditEvent::new(AuditEventType::TokenRefreshed, Some(user.id), &ctx.correlation_id)
                .with("old_token_id", current.id)
                .with("new_token_id", replacement_id),
        )
        .await;

        Ok(Ok(SessionTokens {
            access_token,
            refresh_token,
        }))
    }

    async fn logout(&self, ctx: &RequestContext, refresh_token: &str) -> Result<Outcome<()>, Fault> {
        let failed = BusinessAuditEvent::new(AuditEventType::LogoutFailed, None, &ctx.correlation_id);

        if refresh_token.trim().is_empty() {
            return self.reject(failed, DomainError::RefreshTokenRequired).await;
        }

        let token_hash = auth::opaque::digest(refresh_token);
        let current = match self.store(self.refresh_tokens.find_by_hash(&token_hash)).await? {
            Some(record) => record,
            None => return self.reject(failed, DomainError::InvalidRefreshToken).await,
        };

        let failed = BusinessAuditEvent {
            actor: Some(current.user_id),
            ..failed
        }
        .with("token_id", current.id);

        if current.status_at(Utc::now()) != RefreshTokenState::Active {
            return self.reject(failed, DomainError::InvalidRefreshToken).await;
        }

        if !self.store(self.refresh_tokens.revoke(&token_hash)).await? {
            return self.reject(failed, DomainError::InvalidRefreshToken).await;
        }

        self.record(
            BusinessAuditEvent::new(AuditEventType::UserLoggedOut, Some(current.user_id), &ctx.correlation_id)
                .with("token_id", current.id),
        )
        .await;

        Ok(Ok(()))
    }

    async fn get_user(&self, ctx: &RequestContext, user_id: &UserId) -> Result<Outcome<User>, Fault> {
        match self.store(self.users.find_by_id(user_id)).await? {
            Some(user) => Ok(Ok(user)),
            None => {
                tracing::debug!(correlation_id = %ctx.correlation_id, user_id = %user_id, "User lookup missed");
                Ok(Err(DomainError::NotFound))
            }
        }
    }

    async fn delete_user(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        performed_by: Option<UserId>,
    ) -> Result<Outcome<()>, Fault> {
        let failed = BusinessAuditEvent::new(AuditEventType::UserDeletionFailed, performed_by, &ctx.correlation_id)
            .with("user_id", user_id);

        let mut user = match self.store(self.users.find_by_id(user_id)).await? {
            Some(user) => user,
            None => {
                let error = match self.store(self.users.find_deleted_by_id(user_id)).await? {
                    Some(_) => DomainError::AlreadyDeleted,
                    None => DomainError::NotFound,
                };
                return self.reject(failed, error).await;
            }
        };

        if let Err(error) = user.mark_deleted(performed_by, Utc::now()) {
            return self.reject(failed, error).await;
        }

        match self.bounded(self.users.update(user, false)).await? {
            Ok(()) => {}
            // Deleted by a concurrent request after the lookup
            Err(RepositoryError::Conflict(_)) => {
                return self.reject(failed, DomainError::AlreadyDeleted).await;
            }
            Err(e) => return Err(e.into()),
        }
        let revoked = self.store(self.refresh_tokens.revoke_for_user(user_id)).await?;

        tracing::info!(user_id = %user_id, "User deleted, revoked {} session(s)", revoked);
        self.record(
            BusinessAuditEvent::new(AuditEventType::UserDeleted, performed_by, &ctx.correlation_id)
                .with("user_id", user_id)
                .with("performed_by", performer(performed_by))
                .with("revoked_tokens", revoked),
        )
        .await;

        Ok(Ok(()))
    }

    async fn restore_user(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        performed_by: Option<UserId>,
    ) -> Result<Outcome<()>, Fault> {
        let failed = BusinessAuditEvent::new(AuditEventType::UserRestorationFailed, performed_by, &ctx.correlation_id)
            .with("user_id", user_id);

        let mut user = match self.store(self.users.find_deleted_by_id(user_id)).await? {
            Some(user) => user,
            None => {
                let error = match self.store(self.users.find_by_id(user_id)).await? {
                    Some(_) => DomainError::NotDeleted,
                    None => DomainError::NotFound,
                };
                return self.reject(failed, error).await;
            }
        };

        if !self.store(self.users.is_email_unique(user.email.as_str())).await? {
            return self.reject(failed, DomainError::EmailAlreadyExists).await;
        }

        if let Err(error) = user.restore() {
            return self.reject(failed, error).await;
        }

        match self.bounded(self.users.update(user, true)).await? {
            Ok(()) => {}
            Err(RepositoryError::EmailAlreadyExists(_)) => {
                return self.reject(failed, DomainError::EmailAlreadyExists).await;
            }
            Err(RepositoryError::Conflict(_)) => {
                return self.reject(failed, DomainError::NotDeleted).await;
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user_id, "User restored");
        self.record(
            BusinessAuditEvent::new(AuditEventType::UserRestored, performed_by, &ctx.correlation_id)
                .with("user_id", user_id)
                .with("performed_by", performer(performed_by)),
        )
        .await;

        Ok(Ok(()))
    }
}

fn performer(performed_by: Option<UserId>) -> String {
    performed_by.map_or_else(|| "system".to_string(), |id| id.to_string())
}
