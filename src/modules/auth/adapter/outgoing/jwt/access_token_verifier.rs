use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::fmt;

use crate::auth::application::ports::outgoing::token_provider::{
    TokenClaims, TokenError, TokenProvider,
};

use super::jwt_config::JwtConfig;

const ACCESS_TOKEN_TYPE: &str = "access";

/// Verifies HS256 access tokens minted by the authentication service.
#[derive(Clone)]
pub struct JwtAccessTokenVerifier {
    config: JwtConfig,
    decoding_key: DecodingKey,
}

#[cfg(not(tarpaulin_include))]
impl fmt::Debug for JwtAccessTokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAccessTokenVerifier")
            .field("leeway", &self.config.leeway)
            .finish()
    }
}

impl JwtAccessTokenVerifier {
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());
        Self {
            config,
            decoding_key,
        }
    }
}

impl TokenProvider for JwtAccessTokenVerifier {
    fn verify_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.config.leeway;
        validation.validate_nbf = true;

        let decoded =
            decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;

                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::warn!("Token verification failed: Token expired");
                        TokenError::TokenExpired
                    }
                    ErrorKind::ImmatureSignature => {
                        tracing::warn!("Token verification failed: Token not yet valid");
                        TokenError::TokenNotYetValid
                    }
                    ErrorKind::InvalidSignature => {
                        tracing::error!("Security alert: Invalid token signature detected");
                        TokenError::InvalidSignature
                    }
                    ErrorKind::InvalidToken | ErrorKind::InvalidAlgorithm => {
                        tracing::error!("Security alert: Malformed or invalid algorithm token");
                        TokenError::MalformedToken
                    }
                    ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                        tracing::warn!("Token verification failed: Malformed token");
                        TokenError::MalformedToken
                    }
                    _ => {
                        tracing::warn!("Token verification failed: Unknown error");
                        TokenError::MalformedToken
                    }
                }
            })?;

        if decoded.claims.token_type != ACCESS_TOKEN_TYPE {
            tracing::warn!(
                token_type = %decoded.claims.token_type,
                "Token type mismatch: expected 'access'"
            );
            return Err(TokenError::InvalidTokenType(ACCESS_TOKEN_TYPE.to_string()));
        }

        Ok(decoded.claims)
    }
}
