use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::user::models::Role;
use crate::domain::user::models::UserId;

/// Per-request context threaded through every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Identifier tying audit records and logs back to the originating request
    pub correlation_id: String,
}

impl RequestContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
        }
    }

    /// Context with a freshly generated correlation id.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}

/// Command to register a new user.
///
/// Fields are raw input; the service validates them in a fixed order.
#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Command to log in with email and password.
#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

/// Signed access token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Raw refresh token value handed to the client, and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Token pair returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

/// Refresh token record identifier, safe to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshTokenId(pub Uuid);

impl RefreshTokenId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RefreshTokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RefreshTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier shared by a login's refresh token and all of its rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenFamilyId(pub Uuid);

impl TokenFamilyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TokenFamilyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TokenFamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a refresh token.
///
/// `Expired` is never stored; it is derived from the expiry by
/// [`RefreshTokenRecord::status_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Active,
    Rotated,
    Revoked,
    Expired,
}

/// Persisted refresh token, keyed by the digest of its raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: RefreshTokenId,
    pub token_hash: String,
    pub user_id: UserId,
    pub family_id: TokenFamilyId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub state: RefreshTokenState,
    pub replaced_by: Option<RefreshTokenId>,
}

impl RefreshTokenRecord {
    /// Build the active record for a freshly issued token.
    ///
    /// # Arguments
    /// * `user_id` - Owner of the token
    /// * `family_id` - Family the token belongs to
    /// * `token` - Issued token; only its digest is kept
    /// * `issued_at` - Issue instant
    pub fn issue(
        user_id: UserId,
        family_id: TokenFamilyId,
        token: &RefreshToken,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RefreshTokenId::new(),
            token_hash: auth::opaque::digest(&token.token),
            user_id,
            family_id,
            issued_at,
            expires_at: token.expires_at,
            state: RefreshTokenState::Active,
            replaced_by: None,
        }
    }

    /// Effective state at `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        match self.state {
            RefreshTokenState::Active if now > self.expires_at => RefreshTokenState::Expired,
            state => state,
        }
    }
}
