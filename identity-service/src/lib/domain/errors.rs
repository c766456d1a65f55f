use std::time::Duration;

use thiserror::Error;

/// Expected failure of an identity operation.
///
/// Each variant has a stable code (see [`DomainError::code`]) that clients and audit
/// records rely on, and a default description given by its `Display` output.
/// Two errors are equal when their codes are equal.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Hash)]
pub enum DomainError {
    #[error("The user was not found.")]
    NotFound,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("The name is required.")]
    NameRequired,

    #[error("The email is required.")]
    EmailRequired,

    #[error("The email format is invalid.")]
    EmailInvalid,

    #[error("The email is already in use.")]
    EmailAlreadyExists,

    #[error("The password is required.")]
    PasswordRequired,

    #[error("The user has been deleted.")]
    Deleted,

    #[error("The user is already deleted.")]
    AlreadyDeleted,

    #[error("The user is not deleted.")]
    NotDeleted,

    #[error("The refresh token is required.")]
    RefreshTokenRequired,

    #[error("The refresh token has expired.")]
    RefreshTokenExpired,

    #[error("The refresh token is invalid.")]
    InvalidRefreshToken,
}

impl DomainError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NotFound => "user.notfound",
            DomainError::InvalidCredentials => "user.invalidcredentials",
            DomainError::NameRequired => "user.namerequired",
            DomainError::EmailRequired => "user.emailrequired",
            DomainError::EmailInvalid => "user.emailinvalid",
            DomainError::EmailAlreadyExists => "user.emailalreadyexists",
            DomainError::PasswordRequired => "user.passwordrequired",
            DomainError::Deleted => "user.deleted",
            DomainError::AlreadyDeleted => "user.alreadydeleted",
            DomainError::NotDeleted => "user.notdeleted",
            DomainError::RefreshTokenRequired => "auth.refreshtokenrequired",
            DomainError::RefreshTokenExpired => "auth.refreshtokenexpired",
            DomainError::InvalidRefreshToken => "auth.invalidrefreshtoken",
        }
    }
}

/// Success value or exactly one [`DomainError`].
pub type Outcome<T> = Result<T, DomainError>;

/// Error for storage adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// A live user already holds this email
    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    /// Stored state no longer matches what the caller read
    #[error("Record changed concurrently: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Unexpected failure that terminates the current request.
///
/// Faults never travel inside an [`Outcome`]; operations return
/// `Result<Outcome<T>, Fault>` so the boundary can answer with a generic internal error.
#[derive(Debug, Clone, Error)]
pub enum Fault {
    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Token signing failed: {0}")]
    Token(#[from] auth::JwtError),

    #[error("Password hashing failed: {0}")]
    Password(#[from] auth::PasswordError),
}

impl From<RepositoryError> for Fault {
    fn from(err: RepositoryError) -> Self {
        Fault::Storage(err.to_string())
    }
}
