pub mod account_repository;
pub mod clock;
pub mod pending_deletion_repository;
pub mod token_provider;
pub mod verification_token_repository;

pub use account_repository::{AccountRepository, AccountRepositoryError};
pub use clock::Clock;
pub use pending_deletion_repository::{PendingDeletionRepository, PendingDeletionRepositoryError};
pub use token_provider::{TokenClaims, TokenError, TokenProvider};
pub use verification_token_repository::{
    VerificationTokenRepository, VerificationTokenRepositoryError,
};
