use crate::email::application::ports::outgoing::EmailSender;
use crate::shared::config::SmtpConfig;
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{
    message::header::ContentType, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Message) -> Result<(), String>;
}

#[async_trait]
impl Mailer for AsyncSmtpTransport<Tokio1Executor> {
    async fn send(&self, email: Message) -> Result<(), String> {
        AsyncTransport::send(self, email)
            .await
            .map(|_resp| ())
            .map_err(|e| e.to_string())
    }
}

pub struct SmtpEmailSender {
    mailer: Box<dyn Mailer>,
    from_email: String,
}

impl SmtpEmailSender {
    pub fn new_with_mailer(mailer: Box<dyn Mailer>, from_email: &str) -> Self {
        Self {
            mailer,
            from_email: from_email.to_string(),
        }
    }

    /// Builds the transport described by `config`. A relay gets STARTTLS and
    /// credentials; a local relay (Mailpit, MailHog) gets neither.
    pub fn from_config(
        config: &SmtpConfig,
        from_email: &str,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let transport = match config {
            SmtpConfig::Relay {
                server,
                username,
                password,
            } => AsyncSmtpTransport::<Tokio1Executor>::relay(server)?
                .credentials(Credentials::new(username.clone(), password.clone()))
                .timeout(Some(SMTP_TIMEOUT))
                .build(),
            SmtpConfig::Local { host, port } => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                    .port(*port)
                    .timeout(Some(SMTP_TIMEOUT))
                    .build()
            }
        };

        Ok(Self::new_with_mailer(Box::new(transport), from_email))
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        let email = Message::builder()
            .from(self.from_email.parse().map_err(|e| format!("{:?}", e))?)
            .to(to.parse().map_err(|e| format!("{:?}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| e.to_string())?;

        self.mailer.send(email).await
    }
}
