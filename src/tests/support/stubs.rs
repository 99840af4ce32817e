use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::application::domain::entities::{Account, IssuedToken, PlaintextToken, UserId};
use crate::auth::application::ports::outgoing::{AccountRepository, AccountRepositoryError};
use crate::auth::application::use_cases::issue_verification_token::{
    IssueVerificationTokenError, IssueVerificationTokenUseCase,
};
use crate::auth::application::use_cases::recover_account::{
    RecoverAccountError, RecoverAccountUseCase,
};
use crate::auth::application::use_cases::resend_verification::{
    ResendOutcome, ResendVerificationError, ResendVerificationUseCase,
};
use crate::auth::application::use_cases::soft_delete_user::{
    ScheduledDeletion, SoftDeleteUserError, SoftDeleteUserUseCase,
};
use crate::auth::application::use_cases::verify_user_email::{
    VerifiedAccount, VerifyUserEmailError, VerifyUserEmailUseCase,
};
use crate::email::application::ports::outgoing::{
    UserEmailNotificationError, UserEmailNotifier, VerificationEmail,
};
use crate::tests::support::port_mocks::{active_account, pending_account};

fn stub_token() -> IssuedToken {
    IssuedToken {
        plaintext: PlaintextToken::new("s".repeat(64)),
        expires_at: Utc::now() + Duration::hours(1),
        resend_count: 0,
    }
}

// ============================================================================
// Ports
// ============================================================================

/// Creates accounts for any email and knows none of them afterwards.
#[derive(Default, Clone)]
pub struct StubAccountRepository;

#[async_trait]
impl AccountRepository for StubAccountRepository {
    async fn create_account(&self, email: &str) -> Result<Account, AccountRepositoryError> {
        let mut account = pending_account(UserId::from(Uuid::new_v4()));
        account.email = email.to_string();
        Ok(account)
    }

    async fn find_by_id(&self, _user_id: UserId) -> Result<Option<Account>, AccountRepositoryError> {
        Ok(None)
    }
}

#[derive(Default, Clone)]
pub struct StubUserEmailNotifier;

#[async_trait]
impl UserEmailNotifier for StubUserEmailNotifier {
    async fn send_verification_email(
        &self,
        _email: VerificationEmail,
    ) -> Result<(), UserEmailNotificationError> {
        Ok(())
    }
}

// ============================================================================
// Use cases
// ============================================================================

#[derive(Default, Clone)]
pub struct StubIssueVerificationToken;

#[async_trait]
impl IssueVerificationTokenUseCase for StubIssueVerificationToken {
    async fn execute(&self, _user_id: UserId) -> Result<IssuedToken, IssueVerificationTokenError> {
        Ok(stub_token())
    }
}

#[derive(Default, Clone)]
pub struct StubVerifyUserEmailUseCase;

#[async_trait]
impl VerifyUserEmailUseCase for StubVerifyUserEmailUseCase {
    async fn execute(&self, _token: &str) -> Result<VerifiedAccount, VerifyUserEmailError> {
        Ok(VerifiedAccount {
            user_id: UserId::from(Uuid::new_v4()),
        })
    }
}

#[derive(Default, Clone)]
pub struct StubResendVerificationUseCase;

#[async_trait]
impl ResendVerificationUseCase for StubResendVerificationUseCase {
    async fn execute(&self, _user_id: UserId) -> Result<ResendOutcome, ResendVerificationError> {
        Ok(ResendOutcome {
            token: stub_token(),
            remaining_attempts: 2,
        })
    }
}

#[derive(Default, Clone)]
pub struct StubSoftDeleteUserUseCase;

#[async_trait]
impl SoftDeleteUserUseCase for StubSoftDeleteUserUseCase {
    async fn execute(&self, _user_id: UserId) -> Result<ScheduledDeletion, SoftDeleteUserError> {
        Ok(ScheduledDeletion {
            scheduled_at: Utc::now() + Duration::days(30),
            days_remaining: 30,
        })
    }
}

#[derive(Default, Clone)]
pub struct StubRecoverAccountUseCase;

#[async_trait]
impl RecoverAccountUseCase for StubRecoverAccountUseCase {
    async fn execute(&self, user_id: UserId) -> Result<Account, RecoverAccountError> {
        Ok(active_account(user_id))
    }
}
