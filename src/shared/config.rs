use std::env;
use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::auth::application::domain::policies::{DeletionPolicy, ResendPolicy, TokenPolicy};
use crate::shared::retry::RetryPolicy;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpConfig {
    /// Mailpit / MailHog style relay without TLS or credentials.
    Local { host: String, port: u16 },
    Relay {
        server: String,
        username: String,
        password: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rust_env: String,
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub app_base_url: String,
    pub email_from: String,
    pub smtp: SmtpConfig,
    pub jwt_secret: String,
    pub verification_token_expiration: Duration,
    pub max_resend_attempts: u32,
    pub resend_cooldown: Duration,
    pub deletion_grace_period: Duration,
    pub storage_retry_attempts: u32,
}

impl AppConfig {
    pub const MIN_JWT_SECRET_LEN: usize = 32;

    /// Reads the process environment. `.env` files are loaded by the caller.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let rust_env = lookup("RUST_ENV").unwrap_or_else(|| "development".to_string());

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < Self::MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!(
                    "must be at least {} characters for HS256",
                    Self::MIN_JWT_SECRET_LEN
                ),
            });
        }

        let smtp = if rust_env == "test" {
            SmtpConfig::Local {
                host: lookup("SMTP_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: parse_or("SMTP_PORT", lookup("SMTP_PORT"), 1025)?,
            }
        } else {
            SmtpConfig::Relay {
                server: required("SMTP_SERVER")?,
                username: required("SMTP_USERNAME")?,
                password: required("SMTP_PASSWORD")?,
            }
        };

        let expiration_ms: i64 = parse_or(
            "VERIFICATION_TOKEN_EXPIRATION_MS",
            lookup("VERIFICATION_TOKEN_EXPIRATION_MS"),
            TokenPolicy::DEFAULT_EXPIRATION_MS,
        )?;
        positive("VERIFICATION_TOKEN_EXPIRATION_MS", expiration_ms)?;

        let cooldown_ms: i64 = parse_or(
            "RESEND_COOLDOWN_MS",
            lookup("RESEND_COOLDOWN_MS"),
            ResendPolicy::DEFAULT_RESEND_COOLDOWN_MS,
        )?;
        if cooldown_ms < 0 {
            return Err(ConfigError::Invalid {
                key: "RESEND_COOLDOWN_MS",
                reason: "must not be negative".to_string(),
            });
        }

        let grace_days: i64 = parse_or(
            "DELETION_GRACE_PERIOD_DAYS",
            lookup("DELETION_GRACE_PERIOD_DAYS"),
            DeletionPolicy::DEFAULT_GRACE_PERIOD_DAYS,
        )?;
        positive("DELETION_GRACE_PERIOD_DAYS", grace_days)?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: required("HOST")?,
            port: parse_or("PORT", Some(required("PORT")?), 0)?,
            app_base_url: lookup("APP_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            email_from: required("EMAIL_FROM")?,
            smtp,
            jwt_secret,
            verification_token_expiration: Duration::milliseconds(expiration_ms),
            max_resend_attempts: parse_or(
                "MAX_RESEND_ATTEMPTS",
                lookup("MAX_RESEND_ATTEMPTS"),
                ResendPolicy::DEFAULT_MAX_RESEND_ATTEMPTS,
            )?,
            resend_cooldown: Duration::milliseconds(cooldown_ms),
            deletion_grace_period: Duration::days(grace_days),
            storage_retry_attempts: parse_or(
                "STORAGE_RETRY_ATTEMPTS",
                lookup("STORAGE_RETRY_ATTEMPTS"),
                RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            )?,
            rust_env,
        })
    }

    pub fn is_production(&self) -> bool {
        self.rust_env == "production"
    }

    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn token_policy(&self) -> TokenPolicy {
        TokenPolicy::new(self.verification_token_expiration)
    }

    pub fn resend_policy(&self) -> ResendPolicy {
        ResendPolicy::new(self.max_resend_attempts, self.resend_cooldown)
    }

    pub fn deletion_policy(&self) -> DeletionPolicy {
        DeletionPolicy::new(self.deletion_grace_period)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.storage_retry_attempts,
            StdDuration::from_millis(RetryPolicy::DEFAULT_BASE_DELAY_MS),
        )
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

fn positive(key: &'static str, value: i64) -> Result<(), ConfigError> {
    if value <= 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}
