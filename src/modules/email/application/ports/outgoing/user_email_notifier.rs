use chrono::{DateTime, Utc};

use crate::auth::application::domain::entities::{PlaintextToken, UserId};

/// Everything needed to render and deliver a verification message.
#[derive(Debug, Clone)]
pub struct VerificationEmail {
    pub user_id: UserId,
    pub email: String,
    pub token: PlaintextToken,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UserEmailNotificationError {
    #[error("Email sending failed: {0}")]
    EmailSendingFailed(String),
}

#[async_trait::async_trait]
pub trait UserEmailNotifier: Send + Sync {
    async fn send_verification_email(
        &self,
        email: VerificationEmail,
    ) -> Result<(), UserEmailNotificationError>;
}
