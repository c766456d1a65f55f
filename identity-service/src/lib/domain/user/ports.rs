use async_trait::async_trait;

use crate::domain::errors::RepositoryError;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Persistence operations for user aggregate.
///
/// Implementations must make the email uniqueness check inside [`UserRepository::add`]
/// atomic with the insert, so two concurrent registrations for one email cannot both
/// succeed. [`UserRepository::update`] is a compare-and-set on the deletion state.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Retrieve a live (non-deleted) user by identifier.
    ///
    /// # Errors
    /// * `Unavailable` - Storage operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Retrieve a deleted user by identifier.
    ///
    /// # Errors
    /// * `Unavailable` - Storage operation failed
    async fn find_deleted_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Retrieve a user by email address.
    ///
    /// A live user wins over deleted users sharing the same email.
    ///
    /// # Errors
    /// * `Unavailable` - Storage operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Check that no live user holds `email`.
    ///
    /// # Errors
    /// * `Unavailable` - Storage operation failed
    async fn is_email_unique(&self, email: &str) -> Result<bool, RepositoryError>;

    /// Persist a new user.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - A live user already holds the email
    /// * `Unavailable` - Storage operation failed
    async fn add(&self, user: User) -> Result<(), RepositoryError>;

    /// Replace a stored user whose deletion state is still `expected_deleted`.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Conflict` - Stored deletion state differs from `expected_deleted`
    /// * `EmailAlreadyExists` - A live user already holds the email of a restored user
    /// * `Unavailable` - Storage operation failed
    async fn update(&self, user: User, expected_deleted: bool) -> Result<(), RepositoryError>;
}
