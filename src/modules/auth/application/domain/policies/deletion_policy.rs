use chrono::{DateTime, Duration, Utc};

/// Grace window between a soft-delete request and the point where the
/// account can no longer be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionPolicy {
    pub grace_period: Duration,
}

impl DeletionPolicy {
    pub const DEFAULT_GRACE_PERIOD_DAYS: i64 = 30;

    pub fn new(grace_period: Duration) -> Self {
        Self { grace_period }
    }

    pub fn schedule_from(&self, requested_at: DateTime<Utc>) -> DateTime<Utc> {
        requested_at + self.grace_period
    }

    /// Whole days left before `scheduled_at`, rounded up. Zero once due.
    pub fn days_remaining(&self, scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let left = scheduled_at - now;
        if left <= Duration::zero() {
            return 0;
        }
        let days = left.num_days();
        if left > Duration::days(days) {
            days + 1
        } else {
            days
        }
    }
}

impl Default for DeletionPolicy {
    fn default() -> Self {
        Self::new(Duration::days(Self::DEFAULT_GRACE_PERIOD_DAYS))
    }
}
