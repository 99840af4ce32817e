pub mod access_token_verifier;
pub mod jwt_config;

pub use access_token_verifier::JwtAccessTokenVerifier;
pub use jwt_config::JwtConfig;
