pub mod api;
pub mod config;
pub mod error_kind;
pub mod retry;
