pub mod account_repository_postgres;
mod db_error;
pub mod jwt;
pub mod pending_deletion_repository_postgres;
pub mod sea_orm_entity;
pub mod system_clock;
mod user_row_lock;
pub mod verification_token_repository_postgres;

pub use account_repository_postgres::AccountRepositoryPostgres;
pub use pending_deletion_repository_postgres::PendingDeletionRepositoryPostgres;
pub use system_clock::SystemClock;
pub use verification_token_repository_postgres::VerificationTokenRepositoryPostgres;
