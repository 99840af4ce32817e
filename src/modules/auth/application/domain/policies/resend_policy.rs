use chrono::{DateTime, Duration, Utc};

/// Limits how often a user may ask for a replacement verification token.
///
/// `evaluate` is a pure function of its inputs so callers can run it inside
/// a storage retry loop without side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendPolicy {
    pub max_resend_attempts: u32,
    pub resend_cooldown: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendDenial {
    LimitExceeded { max_attempts: u32 },
    CooldownActive { retry_after: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendDecision {
    Allow,
    Deny(ResendDenial),
}

impl ResendPolicy {
    pub const DEFAULT_MAX_RESEND_ATTEMPTS: u32 = 3;
    pub const DEFAULT_RESEND_COOLDOWN_MS: i64 = 120_000;

    pub fn new(max_resend_attempts: u32, resend_cooldown: Duration) -> Self {
        Self {
            max_resend_attempts,
            resend_cooldown,
        }
    }

    pub fn evaluate(
        &self,
        resend_count: u32,
        last_resend_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> ResendDecision {
        if resend_count >= self.max_resend_attempts {
            return ResendDecision::Deny(ResendDenial::LimitExceeded {
                max_attempts: self.max_resend_attempts,
            });
        }

        if let Some(last) = last_resend_at {
            let elapsed = now - last;
            if elapsed < self.resend_cooldown {
                // A last_resend_at in the future (clock skew) never yields
                // more than one full cooldown.
                let retry_after = (self.resend_cooldown - elapsed).min(self.resend_cooldown);
                return ResendDecision::Deny(ResendDenial::CooldownActive { retry_after });
            }
        }

        ResendDecision::Allow
    }

    pub fn remaining_attempts(&self, resend_count: u32) -> u32 {
        self.max_resend_attempts.saturating_sub(resend_count)
    }
}

impl Default for ResendPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_RESEND_ATTEMPTS,
            Duration::milliseconds(Self::DEFAULT_RESEND_COOLDOWN_MS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_allows_first_resend_without_history() {
        let policy = ResendPolicy::default();

        assert_eq!(policy.evaluate(0, None, t0()), ResendDecision::Allow);
    }

    #[test]
    fn test_denies_when_limit_reached_even_after_cooldown() {
        let policy = ResendPolicy::default();
        let last = t0() - Duration::days(1);

        assert_eq!(
            policy.evaluate(3, Some(last), t0()),
            ResendDecision::Deny(ResendDenial::LimitExceeded { max_attempts: 3 })
        );
        assert_eq!(
            policy.evaluate(7, None, t0()),
            ResendDecision::Deny(ResendDenial::LimitExceeded { max_attempts: 3 })
        );
    }

    #[test]
    fn test_limit_takes_precedence_over_cooldown() {
        let policy = ResendPolicy::default();

        assert_eq!(
            policy.evaluate(3, Some(t0()), t0()),
            ResendDecision::Deny(ResendDenial::LimitExceeded { max_attempts: 3 })
        );
    }

    #[test]
    fn test_denies_inside_cooldown_with_remaining_wait() {
        let policy = ResendPolicy::default();
        let last = t0() - Duration::seconds(1);

        match policy.evaluate(1, Some(last), t0()) {
            ResendDecision::Deny(ResendDenial::CooldownActive { retry_after }) => {
                assert_eq!(retry_after, Duration::seconds(119));
            }
            other => panic!("Expected cooldown denial, got {:?}", other),
        }
    }

    #[test]
    fn test_allows_exactly_at_cooldown_boundary() {
        let policy = ResendPolicy::default();
        let last = t0() - Duration::seconds(120);

        assert_eq!(policy.evaluate(1, Some(last), t0()), ResendDecision::Allow);
    }

    #[test]
    fn test_future_last_resend_is_capped_to_one_cooldown() {
        let policy = ResendPolicy::default();
        let last = t0() + Duration::minutes(10);

        assert_eq!(
            policy.evaluate(1, Some(last), t0()),
            ResendDecision::Deny(ResendDenial::CooldownActive {
                retry_after: Duration::seconds(120)
            })
        );
    }

    #[test]
    fn test_remaining_attempts_saturates() {
        let policy = ResendPolicy::default();

        assert_eq!(policy.remaining_attempts(0), 3);
        assert_eq!(policy.remaining_attempts(2), 1);
        assert_eq!(policy.remaining_attempts(5), 0);
    }
}
