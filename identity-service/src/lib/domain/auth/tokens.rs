use auth::Claims;
use auth::JwtError;
use auth::JwtHandler;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::auth::models::AccessToken;
use crate::domain::auth::models::RefreshToken;
use crate::domain::user::models::Permission;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

const EMAIL_CLAIM: &str = "email";
const ROLE_CLAIM: &str = "role";
const PERMISSIONS_CLAIM: &str = "permissions";

/// Identity carried by a validated access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenClaims {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub permissions: Vec<String>,
}

impl AccessTokenClaims {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.iter().any(|p| p == permission.as_str())
    }
}

/// Issues signed access tokens and opaque refresh tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    jwt: JwtHandler,
    issuer: String,
    audience: String,
    access_token_lifetime: Duration,
    refresh_token_lifetime: Duration,
}

impl TokenIssuer {
    /// Create an issuer signing with `secret`.
    ///
    /// # Arguments
    /// * `secret` - HS256 signing secret
    /// * `issuer` - Value of the `iss` claim, required on validation
    /// * `audience` - Value of the `aud` claim, required on validation
    /// * `access_token_lifetime` - Access token validity
    /// * `refresh_token_lifetime` - Refresh token validity
    ///
    /// # Errors
    /// * `WeakSecret` - Secret is too short for HS256
    pub fn new(
        secret: &[u8],
        issuer: impl Into<String>,
        audience: impl Into<String>,
        access_token_lifetime: Duration,
        refresh_token_lifetime: Duration,
    ) -> Result<Self, JwtError> {
        let issuer = issuer.into();
        let audience = audience.into();
        let jwt = JwtHandler::new(secret)?
            .with_issuer(issuer.clone())
            .with_audience(audience.clone());

        Ok(Self {
            jwt,
            issuer,
            audience,
            access_token_lifetime,
            refresh_token_lifetime,
        })
    }

    /// Sign an access token for `user`, valid from `now`.
    ///
    /// The token carries the subject, email, role and the role's permissions, plus a
    /// unique `jti`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing failed
    pub fn issue_access_token(&self, user: &User, now: DateTime<Utc>) -> Result<AccessToken, JwtError> {
        let expires_at = now + self.access_token_lifetime;
        let permissions: Vec<&str> = user.role().permissions().iter().map(Permission::as_str).collect();

        let claims = Claims::for_subject(user.id, now, self.access_token_lifetime)
            .with_issuer(self.issuer.clone())
            .with_audience(self.audience.clone())
            .with_jwt_id(Uuid::new_v4())
            .with_extra(EMAIL_CLAIM, user.email.as_str())
            .with_extra(ROLE_CLAIM, user.role().as_str())
            .with_extra(PERMISSIONS_CLAIM, permissions);

        let token = self.jwt.encode(&claims)?;

        Ok(AccessToken { token, expires_at })
    }

    /// Generate a refresh token valid from `now`.
    pub fn issue_refresh_token(&self, now: DateTime<Utc>) -> RefreshToken {
        RefreshToken {
            token: auth::opaque::generate_token(),
            expires_at: now + self.refresh_token_lifetime,
        }
    }

    /// Verify an access token's signature, expiry, issuer and audience.
    ///
    /// # Errors
    /// * `TokenExpired` - Token is past its expiry
    /// * `MissingClaim` - Subject or role is absent
    /// * `InvalidToken` - Signature, issuer, audience or claim contents are wrong
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, JwtError> {
        let claims: Claims = self.jwt.decode(token)?;

        let subject = claims
            .sub
            .as_deref()
            .ok_or_else(|| JwtError::MissingClaim("sub".to_string()))?;
        let user_id = UserId::from_string(subject).map_err(|e| JwtError::InvalidToken(e.to_string()))?;

        let role = claims
            .extra_str(ROLE_CLAIM)
            .ok_or_else(|| JwtError::MissingClaim(ROLE_CLAIM.to_string()))?
            .parse::<Role>()
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

        Ok(AccessTokenClaims {
            user_id,
            email: claims.extra_str(EMAIL_CLAIM).unwrap_or_default().to_string(),
            role,
            permissions: claims.extra_strings(PERMISSIONS_CLAIM),
        })
    }
}
