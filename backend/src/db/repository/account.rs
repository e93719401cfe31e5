//! Account repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{NewUser, User, UserId};

/// Repository trait for user accounts.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the storage backend is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Users ====================

    /// Store a new account.
    ///
    /// # Returns
    /// * `Ok(User)` - The stored account with its assigned ID
    /// * `Err(RepositoryError::ValidationError)` - If the email is already registered
    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User>;

    /// Retrieve an account by ID.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the account doesn't exist
    async fn get_user(&self, id: UserId) -> RepositoryResult<User>;

    /// Look up an account by email (exact match).
    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
}
