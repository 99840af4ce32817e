use crate::shared::config::AppConfig;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret_key: String,
    /// Clock skew tolerated on `exp`/`nbf`, in seconds.
    pub leeway: u64,
}

impl JwtConfig {
    pub const DEFAULT_LEEWAY_SECS: u64 = 30;

    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            leeway: Self::DEFAULT_LEEWAY_SECS,
        }
    }

    /// The secret length (HS256 needs at least 32 bytes) is checked when
    /// `AppConfig` is loaded.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(config.jwt_secret.clone())
    }
}
