// ── Entitlement evaluator ──
//
// Pure decision function: (user, usage, subscription, now) -> verdict.
// No I/O and no interior state. Callers fetch the inputs and pass the clock
// explicitly so identical inputs always yield identical verdicts.

use chrono::{DateTime, Duration, Utc};

use crate::error::CoreError;
use crate::limits::{FreeTierLimits, NOTIFICATION_WINDOW_DAYS};
use crate::model::{
    EntitlementVerdict, LimitStatus, ResourceKind, Subscription, UsageSnapshot, UserId,
};

/// Applies the free-tier caps and the expiry-reminder window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evaluator {
    limits: FreeTierLimits,
}

impl Evaluator {
    pub fn new(limits: FreeTierLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> FreeTierLimits {
        self.limits
    }

    /// Decide premium status, per-resource limits, and whether an expiry
    /// reminder is due.
    ///
    /// A subscription that is inactive or has `expires_at <= now` is treated
    /// exactly like an absent one.
    pub fn evaluate(
        &self,
        user_id: &str,
        usage: UsageSnapshot,
        subscription: Option<&Subscription>,
        now: DateTime<Utc>,
    ) -> Result<EntitlementVerdict, CoreError> {
        UserId::parse(user_id)?;

        if let Some(sub) = subscription.filter(|s| s.is_current(now)) {
            let days_remaining = days_until(sub.expires_at, now);
            return Ok(EntitlementVerdict {
                is_premium: true,
                limits: LimitStatus::UNLIMITED,
                notification_due: (1..=NOTIFICATION_WINDOW_DAYS).contains(&days_remaining),
                days_remaining,
            });
        }

        Ok(EntitlementVerdict {
            is_premium: false,
            limits: LimitStatus {
                patient: usage.patient_count < self.limits.patients,
                consultation: usage.consultation_count < self.limits.consultations,
            },
            notification_due: false,
            days_remaining: 0,
        })
    }

    /// [`evaluate`](Self::evaluate) against the system clock.
    pub fn evaluate_now(
        &self,
        user_id: &str,
        usage: UsageSnapshot,
        subscription: Option<&Subscription>,
    ) -> Result<EntitlementVerdict, CoreError> {
        self.evaluate(user_id, usage, subscription, Utc::now())
    }

    /// Whether creating one more resource of `kind` is permitted.
    pub fn gate_action(
        &self,
        user_id: &str,
        kind: ResourceKind,
        usage: UsageSnapshot,
        subscription: Option<&Subscription>,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        self.evaluate(user_id, usage, subscription, now)
            .map(|verdict| verdict.permits(kind))
    }
}

/// Whole days until `expires_at`, rounding any partial day up.
fn days_until(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let day_ms = Duration::days(1).num_milliseconds();
    let remaining_ms = (expires_at - now).num_milliseconds();
    remaining_ms.div_euclid(day_ms) + i64::from(remaining_ms.rem_euclid(day_ms) != 0)
}
