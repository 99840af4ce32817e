use tracing::warn;

use crate::auth::application::domain::entities::{Account, IssuedToken};
use crate::email::application::ports::outgoing::{UserEmailNotifier, VerificationEmail};

/// Hands the freshly committed token to the notifier. Delivery problems are
/// logged and never surface to the caller.
pub(crate) async fn dispatch_verification_email(
    notifier: &dyn UserEmailNotifier,
    account: &Account,
    token: &IssuedToken,
) {
    let email = VerificationEmail {
        user_id: account.id,
        email: account.email.clone(),
        token: token.plaintext.clone(),
        expires_at: token.expires_at,
    };

    if let Err(e) = notifier.send_verification_email(email).await {
        warn!(
            user_id = %account.id,
            error = %e,
            "Verification email dispatch failed"
        );
    }
}
