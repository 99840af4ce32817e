use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;
use uuid::Uuid;

use crate::auth::application::domain::entities::{
    Account, DeletableEntity, NewPendingDeletion, NewVerificationToken, PendingDeletion, UserId,
    VerificationToken,
};
use crate::auth::application::ports::outgoing::{
    AccountRepository, AccountRepositoryError, Clock, PendingDeletionRepository,
    PendingDeletionRepositoryError, VerificationTokenRepository, VerificationTokenRepositoryError,
};
use crate::email::application::ports::outgoing::{
    UserEmailNotificationError, UserEmailNotifier, VerificationEmail,
};

mock! {
    pub AccountRepositoryMock {}
    #[async_trait]
    impl AccountRepository for AccountRepositoryMock {
        async fn create_account(&self, email: &str) -> Result<Account, AccountRepositoryError>;
        async fn find_by_id(&self, user_id: UserId) -> Result<Option<Account>, AccountRepositoryError>;
    }
}

mock! {
    pub VerificationTokenRepositoryMock {}
    #[async_trait]
    impl VerificationTokenRepository for VerificationTokenRepositoryMock {
        async fn insert_token(
            &self,
            token: NewVerificationToken,
        ) -> Result<VerificationToken, VerificationTokenRepositoryError>;
        async fn find_by_hash(
            &self,
            token_hash: &str,
        ) -> Result<Option<VerificationToken>, VerificationTokenRepositoryError>;
        async fn find_latest_for_user(
            &self,
            user_id: UserId,
        ) -> Result<Option<VerificationToken>, VerificationTokenRepositoryError>;
        async fn consume_and_activate(
            &self,
            token_id: Uuid,
            user_id: UserId,
            now: DateTime<Utc>,
        ) -> Result<(), VerificationTokenRepositoryError>;
        async fn supersede_and_insert(
            &self,
            expected_live: Option<Uuid>,
            token: NewVerificationToken,
        ) -> Result<VerificationToken, VerificationTokenRepositoryError>;
    }
}

mock! {
    pub PendingDeletionRepositoryMock {}
    #[async_trait]
    impl PendingDeletionRepository for PendingDeletionRepositoryMock {
        async fn find_for_entity(
            &self,
            entity_type: DeletableEntity,
            entity_id: Uuid,
        ) -> Result<Option<PendingDeletion>, PendingDeletionRepositoryError>;
        async fn schedule_account_deletion(
            &self,
            deletion: NewPendingDeletion,
        ) -> Result<PendingDeletion, PendingDeletionRepositoryError>;
        async fn cancel_account_deletion(
            &self,
            account_id: UserId,
            now: DateTime<Utc>,
        ) -> Result<Account, PendingDeletionRepositoryError>;
    }
}

mock! {
    pub UserEmailNotifierMock {}
    #[async_trait]
    impl UserEmailNotifier for UserEmailNotifierMock {
        async fn send_verification_email(
            &self,
            email: VerificationEmail,
        ) -> Result<(), UserEmailNotificationError>;
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FrozenClock(pub DateTime<Utc>);

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn pending_account(user_id: UserId) -> Account {
    let now = Utc::now();
    Account {
        id: user_id,
        email: "pending@example.com".to_string(),
        state: crate::auth::application::domain::entities::AccountState::Pending,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn active_account(user_id: UserId) -> Account {
    Account {
        state: crate::auth::application::domain::entities::AccountState::Active,
        ..pending_account(user_id)
    }
}

pub fn stored_token(
    user_id: UserId,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> VerificationToken {
    VerificationToken {
        id: Uuid::new_v4(),
        user_id,
        token_hash: "0".repeat(64),
        created_at,
        expires_at,
        used: false,
        resend_count: 0,
        last_resend_at: None,
    }
}

/// Echoes a `NewVerificationToken` back as the stored row.
pub fn persisted(token: NewVerificationToken) -> VerificationToken {
    VerificationToken {
        id: Uuid::new_v4(),
        user_id: token.user_id,
        token_hash: token.token_hash,
        created_at: token.created_at,
        expires_at: token.expires_at,
        used: false,
        resend_count: token.resend_count,
        last_resend_at: token.last_resend_at,
    }
}
