use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use auth::HashedPassword;
use chrono::DateTime;
use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::errors::Outcome;
use crate::domain::user::errors::RoleError;
use crate::domain::user::errors::UserIdError;

/// User aggregate entity.
///
/// Users are never physically removed. Deletion is recorded on the entity and can be
/// undone with [`User::restore`]. The role is fixed at registration.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: EmailAddress,
    pub created_at: DateTime<Utc>,
    role: Role,
    password: HashedPassword,
    deletion: Option<Deletion>,
}

/// Soft-delete audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deletion {
    pub deleted_at: DateTime<Utc>,
    pub deleted_by: Option<UserId>,
}

impl User {
    /// Create a newly registered user.
    ///
    /// # Arguments
    /// * `name` - Display name
    /// * `email` - Validated email address
    /// * `password` - Hash and salt produced by the password hasher
    /// * `role` - Role granted at registration
    ///
    /// # Returns
    /// Live (non-deleted) user with a fresh identifier
    pub fn register(name: String, email: EmailAddress, password: HashedPassword, role: Role) -> Self {
        Self {
            id: UserId::new(),
            name,
            email,
            created_at: Utc::now(),
            role,
            password,
            deletion: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn password_hash(&self) -> &str {
        &self.password.hash
    }

    pub fn password_salt(&self) -> &str {
        &self.password.salt
    }

    pub fn is_deleted(&self) -> bool {
        self.deletion.is_some()
    }

    pub fn deletion(&self) -> Option<&Deletion> {
        self.deletion.as_ref()
    }

    /// Soft-delete the user.
    ///
    /// # Errors
    /// * `AlreadyDeleted` - User is already deleted; the existing trail is kept
    pub fn mark_deleted(&mut self, deleted_by: Option<UserId>, deleted_at: DateTime<Utc>) -> Outcome<()> {
        if self.is_deleted() {
            return Err(DomainError::AlreadyDeleted);
        }

        self.deletion = Some(Deletion {
            deleted_at,
            deleted_by,
        });
        Ok(())
    }

    /// Clear the deletion state.
    ///
    /// # Errors
    /// * `NotDeleted` - User is not deleted
    pub fn restore(&mut self) -> Outcome<()> {
        self.deletion
            .take()
            .map(|_| ())
            .ok_or(DomainError::NotDeleted)
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

/// Email address type
///
/// Accepts `local@domain.tld` shapes: no whitespace, exactly one `@`, and a dot inside
/// the domain part with text on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and wrap a raw email.
    ///
    /// # Errors
    /// * `EmailRequired` - Email is empty or whitespace
    /// * `EmailInvalid` - Email does not have the expected shape
    pub fn parse(email: &str) -> Outcome<Self> {
        if email.trim().is_empty() {
            return Err(DomainError::EmailRequired);
        }

        if !EMAIL_PATTERN.is_match(email) {
            return Err(DomainError::EmailInvalid);
        }

        Ok(Self(email.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role granted to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
        }
    }

    /// Permissions granted to this role.
    pub fn permissions(&self) -> &'static [Permission] {
        ROLE_PERMISSIONS
            .iter()
            .find(|(role, _)| role == self)
            .map(|(_, permissions)| *permissions)
            .unwrap_or(&[])
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Role::User),
            "Admin" => Ok(Role::Admin),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

/// Permission carried in access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    UsersRead,
    UsersCreate,
    UsersUpdate,
    UsersDelete,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::UsersRead => "users:read",
            Permission::UsersCreate => "users:create",
            Permission::UsersUpdate => "users:update",
            Permission::UsersDelete => "users:delete",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role to permission table.
pub const ROLE_PERMISSIONS: [(Role, &[Permission]); 2] = [
    (
        Role::Admin,
        &[
            Permission::UsersRead,
            Permission::UsersCreate,
            Permission::UsersUpdate,
            Permission::UsersDelete,
        ],
    ),
    (Role::User, &[Permission::UsersRead]),
];
