pub mod pending_deletions;
pub mod users;
pub mod verification_tokens;
