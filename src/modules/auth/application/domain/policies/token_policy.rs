use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    pub token_expiration: Duration,
}

impl TokenPolicy {
    pub const DEFAULT_EXPIRATION_MS: i64 = 3_600_000;
    /// Length of the alphanumeric secret handed to the user.
    pub const TOKEN_LENGTH: usize = 64;

    pub fn new(token_expiration: Duration) -> Self {
        Self { token_expiration }
    }

    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        issued_at + self.token_expiration
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self::new(Duration::milliseconds(Self::DEFAULT_EXPIRATION_MS))
    }
}
