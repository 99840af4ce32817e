use std::sync::Arc;

use email_address::EmailAddress;
use tracing::{info, warn};

use crate::auth::application::domain::entities::UserId;
use crate::auth::application::ports::outgoing::{AccountRepository, AccountRepositoryError};
use crate::auth::application::use_cases::issue_verification_token::IssueVerificationTokenUseCase;

// ============================================================================
// Registration Output
// ============================================================================
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRegistrationOutput {
    pub user_id: UserId,
    pub email: String,
    pub message: String,
}

// ============================================================================
// Registration Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccountRegistrationError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AccountRegistrationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::DatabaseError(_) => "INTERNAL_ERROR",
        }
    }
}

// ============================================================================
// Account Registration (Orchestration Layer)
// ============================================================================

/// Creates a pending account and issues its first verification token.
/// A token failure is logged; the account stays and the user can resend.
#[derive(Clone)]
pub struct AccountRegistrationOrchestrator {
    accounts: Arc<dyn AccountRepository>,
    issue_token: Arc<dyn IssueVerificationTokenUseCase>,
}

impl AccountRegistrationOrchestrator {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        issue_token: Arc<dyn IssueVerificationTokenUseCase>,
    ) -> Self {
        Self {
            accounts,
            issue_token,
        }
    }

    pub async fn register_account(
        &self,
        email: &str,
    ) -> Result<AccountRegistrationOutput, AccountRegistrationError> {
        let email = email.trim().to_lowercase();
        if !EmailAddress::is_valid(&email) {
            return Err(AccountRegistrationError::InvalidEmail);
        }

        // Step 1: Create the account
        let account = self
            .accounts
            .create_account(&email)
            .await
            .map_err(|e| match e {
                AccountRepositoryError::AccountAlreadyExists => {
                    AccountRegistrationError::EmailAlreadyExists
                }
                other => AccountRegistrationError::DatabaseError(other.to_string()),
            })?;

        info!(user_id = %account.id, "Account registered");

        // Step 2: Issue the first token (the use case dispatches the email)
        if let Err(e) = self.issue_token.execute(account.id).await {
            warn!(
                user_id = %account.id,
                error = %e,
                kind = %e.kind(),
                "Verification token not issued at registration"
            );
        }

        Ok(AccountRegistrationOutput {
            user_id: account.id,
            email: account.email,
            message: "Account created successfully. Please check your email to verify your account."
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::application::domain::entities::IssuedToken;
    use crate::auth::application::use_cases::issue_verification_token::IssueVerificationTokenError;
    use crate::tests::support::port_mocks::*;
    use async_trait::async_trait;
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    // =====================================================
    // Stub IssueVerificationTokenUseCase
    // =====================================================

    struct StubIssueToken {
        result: Result<(), IssueVerificationTokenError>,
        called: AtomicBool,
    }

    impl StubIssueToken {
        fn new(result: Result<(), IssueVerificationTokenError>) -> Self {
            Self {
                result,
                called: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl IssueVerificationTokenUseCase for StubIssueToken {
        async fn execute(
            &self,
            _user_id: UserId,
        ) -> Result<IssuedToken, IssueVerificationTokenError> {
            self.called.store(true, Ordering::SeqCst);
            self.result.clone().map(|_| IssuedToken {
                plaintext: crate::auth::application::domain::entities::PlaintextToken::new(
                    "x".repeat(64),
                ),
                expires_at: chrono::Utc::now(),
                resend_count: 0,
            })
        }
    }

    fn creating_accounts() -> MockAccountRepositoryMock {
        let mut accounts = MockAccountRepositoryMock::new();
        accounts.expect_create_account().returning(|email| {
            let mut account = pending_account(UserId::from(Uuid::new_v4()));
            account.email = email.to_string();
            Ok(account)
        });
        accounts
    }

    #[tokio::test]
    async fn register_account_success() {
        let issue = Arc::new(StubIssueToken::new(Ok(())));
        let orchestrator =
            AccountRegistrationOrchestrator::new(Arc::new(creating_accounts()), issue.clone());

        let output = orchestrator
            .register_account("New.User@Example.com ")
            .await
            .unwrap();

        assert_eq!(output.email, "new.user@example.com");
        assert!(output.message.contains("check your email"));
        assert!(issue.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn register_account_succeeds_when_token_issue_fails() {
        let issue = Arc::new(StubIssueToken::new(Err(
            IssueVerificationTokenError::DatabaseError("timeout".to_string()),
        )));
        let orchestrator =
            AccountRegistrationOrchestrator::new(Arc::new(creating_accounts()), issue.clone());

        let result = orchestrator.register_account("user@example.com").await;

        assert!(result.is_ok());
        assert!(issue.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn register_account_rejects_invalid_email() {
        let mut accounts = MockAccountRepositoryMock::new();
        accounts.expect_create_account().never();
        let issue = Arc::new(StubIssueToken::new(Ok(())));

        let orchestrator = AccountRegistrationOrchestrator::new(Arc::new(accounts), issue.clone());
        let err = orchestrator
            .register_account("not-an-email")
            .await
            .unwrap_err();

        assert_eq!(err, AccountRegistrationError::InvalidEmail);
        assert!(!issue.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn register_account_duplicate_email() {
        let mut accounts = MockAccountRepositoryMock::new();
        accounts
            .expect_create_account()
            .with(eq("taken@example.com"))
            .returning(|_| Err(AccountRepositoryError::AccountAlreadyExists));
        let issue = Arc::new(StubIssueToken::new(Ok(())));

        let orchestrator = AccountRegistrationOrchestrator::new(Arc::new(accounts), issue.clone());
        let err = orchestrator
            .register_account("taken@example.com")
            .await
            .unwrap_err();

        assert_eq!(err, AccountRegistrationError::EmailAlreadyExists);
        assert_eq!(err.code(), "EMAIL_ALREADY_EXISTS");
        assert!(
            !issue.called.load(Ordering::SeqCst),
            "Token should NOT be issued if account creation fails"
        );
    }
}
