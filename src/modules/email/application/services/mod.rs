mod background_notifier;
mod email_service;

pub use background_notifier::BackgroundNotifier;
pub use email_service::{UserEmailService, VERIFICATION_SUBJECT};
