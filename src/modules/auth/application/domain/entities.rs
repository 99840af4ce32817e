use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of an account. Produced either by the account store or by the
/// upstream authentication layer, never parsed from untrusted input here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<UserId> for Uuid {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Account
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountState {
    Pending,
    Active,
    Suspended,
}

impl AccountState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountState::Pending => "pending",
            AccountState::Active => "active",
            AccountState::Suspended => "suspended",
        }
    }
}

impl FromStr for AccountState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AccountState::Pending),
            "active" => Ok(AccountState::Active),
            "suspended" => Ok(AccountState::Suspended),
            other => Err(format!("Unknown account state: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: UserId,
    pub email: String,
    pub state: AccountState,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// An account counts as verified once a verification token was consumed.
    pub fn is_verified(&self) -> bool {
        self.state == AccountState::Active
    }
}

// ============================================================================
// Verification tokens
// ============================================================================

/// The secret handed to the user. Only its digest is ever stored.
#[derive(Clone, PartialEq, Eq)]
pub struct PlaintextToken(String);

impl PlaintextToken {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PlaintextToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlaintextToken(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationToken {
    pub id: Uuid,
    pub user_id: UserId,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub resend_count: u32,
    pub last_resend_at: Option<DateTime<Utc>>,
}

impl VerificationToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Row to be written by issue/resend.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVerificationToken {
    pub user_id: UserId,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub resend_count: u32,
    pub last_resend_at: Option<DateTime<Utc>>,
}

/// Result of a successful issue or resend. The plaintext is not retrievable
/// again once this value is dropped.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub plaintext: PlaintextToken,
    pub expires_at: DateTime<Utc>,
    pub resend_count: u32,
}

// ============================================================================
// Pending deletions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletableEntity {
    Account,
}

impl DeletableEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletableEntity::Account => "account",
        }
    }
}

impl FromStr for DeletableEntity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "account" => Ok(DeletableEntity::Account),
            other => Err(format!("Unknown entity type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingDeletion {
    pub id: Uuid,
    pub entity_type: DeletableEntity,
    pub entity_id: Uuid,
    pub requested_by: UserId,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PendingDeletion {
    /// Recovery is allowed strictly before `scheduled_at`.
    pub fn is_recoverable_at(&self, now: DateTime<Utc>) -> bool {
        now < self.scheduled_at
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPendingDeletion {
    pub entity_type: DeletableEntity,
    pub entity_id: Uuid,
    pub requested_by: UserId,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
