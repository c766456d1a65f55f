use async_trait::async_trait;

use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::models::RefreshTokenRecord;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::models::RequestContext;
use crate::domain::auth::models::SessionTokens;
use crate::domain::errors::Fault;
use crate::domain::errors::Outcome;
use crate::domain::errors::RepositoryError;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Persistence operations for refresh tokens.
///
/// Records are keyed by the digest of the raw token. State transitions are
/// conditional so that concurrent refreshes of one token cannot both rotate it.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + 'static {
    /// Store a newly issued token.
    async fn insert(&self, record: RefreshTokenRecord) -> Result<(), RepositoryError>;

    /// Look up a token by the digest of its raw value.
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, RepositoryError>;

    /// Mark the token at `token_hash` as rotated and store `replacement`.
    ///
    /// # Returns
    /// `false` without changing anything when the token is no longer active
    async fn rotate(
        &self,
        token_hash: &str,
        replacement: RefreshTokenRecord,
    ) -> Result<bool, RepositoryError>;

    /// Revoke one active token.
    ///
    /// # Returns
    /// `false` when the token is missing or not active
    async fn revoke(&self, token_hash: &str) -> Result<bool, RepositoryError>;

    /// Revoke every active token in the family of the token at `token_hash`.
    ///
    /// # Returns
    /// Number of tokens revoked
    async fn revoke_family(&self, token_hash: &str) -> Result<usize, RepositoryError>;

    /// Revoke every active token owned by `user_id`.
    ///
    /// # Returns
    /// Number of tokens revoked
    async fn revoke_for_user(&self, user_id: &UserId) -> Result<usize, RepositoryError>;
}

/// Authentication and account lifecycle operations.
///
/// Every operation returns `Ok(Outcome)` for decided requests, including expected
/// failures, and `Err(Fault)` only when storage or crypto failed unexpectedly.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Returns
    /// The created user, or the first failing validation
    async fn register(&self, ctx: &RequestContext, command: RegisterCommand) -> Result<Outcome<User>, Fault>;

    /// Authenticate with email and password and open a session.
    async fn login(&self, ctx: &RequestContext, command: LoginCommand) -> Result<Outcome<SessionTokens>, Fault>;

    /// Exchange a refresh token for a new token pair.
    ///
    /// The presented token is rotated and cannot be used again. Presenting an already
    /// rotated token revokes its whole family.
    async fn refresh(&self, ctx: &RequestContext, refresh_token: &str) -> Result<Outcome<SessionTokens>, Fault>;

    /// Revoke a refresh token.
    async fn logout(&self, ctx: &RequestContext, refresh_token: &str) -> Result<Outcome<()>, Fault>;

    /// Look up a live user.
    ///
    /// Deleted users are reported as `NotFound`.
    async fn get_user(&self, ctx: &RequestContext, user_id: &UserId) -> Result<Outcome<User>, Fault>;

    /// Soft-delete a user and revoke its sessions.
    ///
    /// # Arguments
    /// * `user_id` - User to delete
    /// * `performed_by` - Acting user, recorded in the audit trail
    async fn delete_user(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        performed_by: Option<UserId>,
    ) -> Result<Outcome<()>, Fault>;

    /// Restore a soft-deleted user.
    async fn restore_user(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        performed_by: Option<UserId>,
    ) -> Result<Outcome<()>, Fault>;
}
