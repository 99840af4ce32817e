use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::email::application::ports::outgoing::{
    EmailSender, UserEmailNotificationError, UserEmailNotifier, VerificationEmail,
};

pub const VERIFICATION_SUBJECT: &str = "Verify your email address";

/// Renders verification messages and hands them to an [`EmailSender`].
#[derive(Clone)]
pub struct UserEmailService {
    sender: Arc<dyn EmailSender>,
    base_url: String,
}

impl fmt::Debug for UserEmailService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserEmailService")
            .field("sender", &"<dyn EmailSender>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl UserEmailService {
    pub fn new(sender: Arc<dyn EmailSender>, base_url: impl Into<String>) -> Self {
        Self {
            sender,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/verify-email?token={}", self.base_url, token)
    }

    fn render_verification_body(&self, email: &VerificationEmail) -> String {
        let link = self.verification_link(email.token.expose());
        format!(
            "<p>Welcome!</p>\
             <p>Please confirm your email address by opening the link below:</p>\
             <p><a href=\"{link}\">{link}</a></p>\
             <p>This link expires at {expires} UTC and can be used once.</p>\
             <p>If you did not create an account, you can ignore this message.</p>",
            link = link,
            expires = email.expires_at.format("%Y-%m-%d %H:%M"),
        )
    }
}

#[async_trait]
impl UserEmailNotifier for UserEmailService {
    async fn send_verification_email(
        &self,
        email: VerificationEmail,
    ) -> Result<(), UserEmailNotificationError> {
        let body = self.render_verification_body(&email);

        self.sender
            .send_email(&email.email, VERIFICATION_SUBJECT, &body)
            .await
            .map_err(UserEmailNotificationError::EmailSendingFailed)
    }
}
