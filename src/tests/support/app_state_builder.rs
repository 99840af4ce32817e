use crate::auth::application::orchestrator::account_registration::AccountRegistrationOrchestrator;
use crate::auth::application::use_cases::{
    issue_verification_token::IssueVerificationTokenUseCase,
    recover_account::RecoverAccountUseCase, resend_verification::ResendVerificationUseCase,
    soft_delete_user::SoftDeleteUserUseCase, verify_user_email::VerifyUserEmailUseCase,
};
use crate::tests::support::stubs::*;
use crate::AppState;
use actix_web::web;
use std::sync::Arc;

pub struct TestAppStateBuilder {
    register_account: Arc<AccountRegistrationOrchestrator>,
    issue_verification_token: Arc<dyn IssueVerificationTokenUseCase>,
    verify_user_email: Arc<dyn VerifyUserEmailUseCase>,
    resend_verification: Arc<dyn ResendVerificationUseCase>,
    soft_delete_user: Arc<dyn SoftDeleteUserUseCase>,
    recover_account: Arc<dyn RecoverAccountUseCase>,
}

pub fn default_test_account_registration_orchestrator() -> Arc<AccountRegistrationOrchestrator> {
    Arc::new(AccountRegistrationOrchestrator::new(
        Arc::new(StubAccountRepository),
        Arc::new(StubIssueVerificationToken),
    ))
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self {
            register_account: default_test_account_registration_orchestrator(),
            issue_verification_token: Arc::new(StubIssueVerificationToken),
            verify_user_email: Arc::new(StubVerifyUserEmailUseCase),
            resend_verification: Arc::new(StubResendVerificationUseCase),
            soft_delete_user: Arc::new(StubSoftDeleteUserUseCase),
            recover_account: Arc::new(StubRecoverAccountUseCase),
        }
    }
}

impl TestAppStateBuilder {
    pub fn with_register_account_orchestrator(
        mut self,
        orchestrator: Arc<AccountRegistrationOrchestrator>,
    ) -> Self {
        self.register_account = orchestrator;
        self
    }

    pub fn with_verify_user_email(mut self, uc: impl VerifyUserEmailUseCase + 'static) -> Self {
        self.verify_user_email = Arc::new(uc);
        self
    }

    pub fn with_resend_verification(
        mut self,
        uc: impl ResendVerificationUseCase + 'static,
    ) -> Self {
        self.resend_verification = Arc::new(uc);
        self
    }

    pub fn with_soft_delete_user(mut self, uc: impl SoftDeleteUserUseCase + 'static) -> Self {
        self.soft_delete_user = Arc::new(uc);
        self
    }

    pub fn with_recover_account(mut self, uc: impl RecoverAccountUseCase + 'static) -> Self {
        self.recover_account = Arc::new(uc);
        self
    }

    pub fn build(self) -> web::Data<AppState> {
        web::Data::new(AppState {
            register_account_orchestrator: self.register_account,
            issue_verification_token_use_case: self.issue_verification_token,
            verify_user_email_use_case: self.verify_user_email,
            resend_verification_use_case: self.resend_verification,
            soft_delete_user_use_case: self.soft_delete_user,
            recover_account_use_case: self.recover_account,
        })
    }
}
