use async_trait::async_trait;

use crate::auth::application::domain::entities::{Account, UserId};

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Inserts a `pending`, active account.
    async fn create_account(&self, email: &str) -> Result<Account, AccountRepositoryError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<Account>, AccountRepositoryError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccountRepositoryError {
    #[error("Account already exists")]
    AccountAlreadyExists,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
