// ── Collaborator ports ──
//
// Seams between the composition layer and the outside world. The store
// adapter in `backend` implements the read ports; tests substitute fakes.

use std::future::Future;

use crate::error::CoreError;
use crate::model::{Subscription, UserId};
use crate::notice::ExpiryNotice;

/// Source of subscription records.
pub trait SubscriptionStore: Send + Sync {
    /// The most recent active subscription for `user_id`, or `None`.
    ///
    /// Returned records may already be past `expires_at`; the evaluator
    /// decides currency.
    fn find_active_subscription(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<Subscription>, CoreError>> + Send;
}

/// Source of per-user resource counts.
pub trait UsageCounter: Send + Sync {
    fn count_patients(&self, user_id: &UserId) -> impl Future<Output = Result<u32, CoreError>> + Send;

    fn count_consultations(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<u32, CoreError>> + Send;
}

/// Destination for expiry reminders. Delivery is best-effort.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: &ExpiryNotice);
}
