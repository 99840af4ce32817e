use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::adapter::outgoing::jwt::{JwtAccessTokenVerifier, JwtConfig};
use crate::auth::application::domain::entities::UserId;
use crate::auth::application::ports::outgoing::{TokenClaims, TokenProvider};

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_only_0123456789";

/// Mints a token the way the authentication service would.
pub fn sign_token(secret: &str, user_id: Uuid, token_type: &str, ttl: Duration) -> String {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id,
        exp: (now + ttl).timestamp(),
        iat: now.timestamp(),
        nbf: now.timestamp(),
        token_type: token_type.to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("test token should encode")
}

pub fn access_token_for(user_id: UserId) -> String {
    sign_token(
        TEST_JWT_SECRET,
        user_id.value(),
        "access",
        Duration::minutes(30),
    )
}

pub fn bearer_for(user_id: UserId) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", access_token_for(user_id)))
}

pub fn test_token_provider() -> Arc<dyn TokenProvider + Send + Sync> {
    Arc::new(JwtAccessTokenVerifier::new(JwtConfig::new(TEST_JWT_SECRET)))
}
