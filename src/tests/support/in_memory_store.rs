use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::auth::application::domain::entities::{
    Account, AccountState, DeletableEntity, NewPendingDeletion, NewVerificationToken,
    PendingDeletion, UserId, VerificationToken,
};
use crate::auth::application::ports::outgoing::{
    AccountRepository, AccountRepositoryError, Clock, PendingDeletionRepository,
    PendingDeletionRepositoryError, VerificationTokenRepository,
    VerificationTokenRepositoryError,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, Account>,
    tokens: Vec<VerificationToken>,
    deletions: Vec<PendingDeletion>,
}

impl Tables {
    fn has_pending_deletion(&self, user_id: Uuid) -> bool {
        self.deletions
            .iter()
            .any(|d| d.entity_type == DeletableEntity::Account && d.entity_id == user_id)
    }
}

/// Storage with the same row rules as the Postgres adapters. Every port call
/// runs under one lock, which plays the part of a serializable transaction.
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    clock: SettableClock,
}

impl InMemoryStore {
    pub fn new(clock: SettableClock) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn account(&self, user_id: UserId) -> Option<Account> {
        self.lock().users.get(&user_id.value()).cloned()
    }

    pub fn tokens_for(&self, user_id: UserId) -> Vec<VerificationToken> {
        self.lock()
            .tokens
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn live_tokens_for(&self, user_id: UserId) -> Vec<VerificationToken> {
        self.tokens_for(user_id)
            .into_iter()
            .filter(|t| !t.used)
            .collect()
    }

    pub fn pending_deletion_for(&self, user_id: UserId) -> Option<PendingDeletion> {
        self.lock()
            .deletions
            .iter()
            .find(|d| d.entity_id == user_id.value())
            .cloned()
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn create_account(&self, email: &str) -> Result<Account, AccountRepositoryError> {
        let now = self.clock.now();
        let mut tables = self.lock();

        if tables.users.values().any(|a| a.email == email) {
            return Err(AccountRepositoryError::AccountAlreadyExists);
        }

        let account = Account {
            id: UserId::from(Uuid::new_v4()),
            email: email.to_string(),
            state: AccountState::Pending,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(account.id.value(), account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<Account>, AccountRepositoryError> {
        Ok(self.account(user_id))
    }
}

fn persist(token: NewVerificationToken) -> VerificationToken {
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

#[async_trait]
impl VerificationTokenRepository for InMemoryStore {
    async fn insert_token(
        &self,
        token: NewVerificationToken,
    ) -> Result<VerificationToken, VerificationTokenRepositoryError> {
        let mut tables = self.lock();

        if !tables.users.contains_key(&token.user_id.value()) {
            return Err(VerificationTokenRepositoryError::AccountNotFound);
        }
        if tables
            .tokens
            .iter()
            .any(|t| t.user_id == token.user_id && !t.used)
        {
            return Err(VerificationTokenRepositoryError::TokenAlreadyIssued);
        }

        let stored = persist(token);
        tables.tokens.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>, VerificationTokenRepositoryError> {
        Ok(self
            .lock()
            .tokens
            .iter()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn find_latest_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<VerificationToken>, VerificationTokenRepositoryError> {
        Ok(self
            .lock()
            .tokens
            .iter()
            .filter(|t| t.user_id == user_id)
            .max_by(|a, b| {
                a.resend_count
                    .cmp(&b.resend_count)
                    .then(a.created_at.cmp(&b.created_at))
            })
            .cloned())
    }

    async fn consume_and_activate(
        &self,
        token_id: Uuid,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationTokenRepositoryError> {
        let mut tables = self.lock();
        if !tables.users.contains_key(&user_id.value()) {
            return Err(VerificationTokenRepositoryError::AccountNotFound);
        }
        let pending_deletion = tables.has_pending_deletion(user_id.value());

        let token = tables
            .tokens
            .iter()
            .find(|t| t.id == token_id && t.user_id == user_id)
            .ok_or(VerificationTokenRepositoryError::TokenNotFound)?;
        if token.is_expired_at(now) {
            return Err(VerificationTokenRepositoryError::TokenExpired);
        }
        if token.used {
            return Err(VerificationTokenRepositoryError::TokenAlreadyUsed);
        }

        if let Some(token) = tables.tokens.iter_mut().find(|t| t.id == token_id) {
            token.used = true;
        }
        if let Some(account) = tables.users.get_mut(&user_id.value()) {
            account.state = AccountState::Active;
            account.is_active = !pending_deletion;
            account.updated_at = now;
        }
        Ok(())
    }

    async fn supersede_and_insert(
        &self,
        expected_live: Option<Uuid>,
        token: NewVerificationToken,
    ) -> Result<VerificationToken, VerificationTokenRepositoryError> {
        let mut tables = self.lock();

        if !tables.users.contains_key(&token.user_id.value()) {
            return Err(VerificationTokenRepositoryError::AccountNotFound);
        }

        let live: Vec<Uuid> = tables
            .tokens
            .iter()
            .filter(|t| t.user_id == token.user_id && !t.used)
            .map(|t| t.id)
            .collect();
        let expected: Vec<Uuid> = expected_live.into_iter().collect();
        if live != expected {
            return Err(VerificationTokenRepositoryError::Conflict(format!(
                "expected live tokens {:?}, found {:?}",
                expected, live
            )));
        }

        for existing in tables
            .tokens
            .iter_mut()
            .filter(|t| t.user_id == token.user_id)
        {
            existing.used = true;
        }

        let stored = persist(token);
        tables.tokens.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl PendingDeletionRepository for InMemoryStore {
    async fn find_for_entity(
        &self,
        entity_type: DeletableEntity,
        entity_id: Uuid,
    ) -> Result<Option<PendingDeletion>, PendingDeletionRepositoryError> {
        Ok(self
            .lock()
            .deletions
            .iter()
            .find(|d| d.entity_type == entity_type && d.entity_id == entity_id)
            .cloned())
    }

    async fn schedule_account_deletion(
        &self,
        deletion: NewPendingDeletion,
    ) -> Result<PendingDeletion, PendingDeletionRepositoryError> {
        let mut tables = self.lock();

        if !tables.users.contains_key(&deletion.entity_id) {
            return Err(PendingDeletionRepositoryError::AccountNotFound);
        }
        if tables.has_pending_deletion(deletion.entity_id) {
            return Err(PendingDeletionRepositoryError::AlreadyScheduled);
        }

        let pending = PendingDeletion {
            id: Uuid::new_v4(),
            entity_type: deletion.entity_type,
            entity_id: deletion.entity_id,
            requested_by: deletion.requested_by,
            scheduled_at: deletion.scheduled_at,
            created_at: deletion.created_at,
        };
        tables.deletions.push(pending.clone());

        if let Some(account) = tables.users.get_mut(&deletion.entity_id) {
            account.is_active = false;
            account.updated_at = deletion.created_at;
        }
        Ok(pending)
    }

    async fn cancel_account_deletion(
        &self,
        account_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Account, PendingDeletionRepositoryError> {
        let mut tables = self.lock();
        let id = account_id.value();
        if !tables.users.contains_key(&id) {
            return Err(PendingDeletionRepositoryError::AccountNotFound);
        }

        let position = tables
            .deletions
            .iter()
            .position(|d| d.entity_type == DeletableEntity::Account && d.entity_id == id)
            .ok_or(PendingDeletionRepositoryError::NotScheduled)?;
        if !tables.deletions[position].is_recoverable_at(now) {
            return Err(PendingDeletionRepositoryError::GracePeriodExpired);
        }

        tables.deletions.remove(position);
        let account = tables
            .users
            .get_mut(&id)
            .ok_or(PendingDeletionRepositoryError::AccountNotFound)?;
        account.is_active = true;
        account.updated_at = now;
        Ok(account.clone())
    }
}

/// Clock shared between a test and the services it drives.
#[derive(Clone)]
pub struct SettableClock(Arc<Mutex<DateTime<Utc>>>);

impl SettableClock {
    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(at)))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Default for SettableClock {
    fn default() -> Self {
        Self::starting_at(Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap())
    }
}

impl Clock for SettableClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(|p| p.into_inner())
    }
}
