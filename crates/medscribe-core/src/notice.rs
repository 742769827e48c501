use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::model::{EntitlementVerdict, Subscription, UserId};
use crate::ports::NotificationSink;

/// Reminder that a premium subscription is about to lapse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryNotice {
    pub user_id: UserId,
    pub days_remaining: i64,
    pub expires_at: DateTime<Utc>,
}

impl ExpiryNotice {
    /// `Some` only when the verdict says a reminder is due.
    pub fn from_verdict(verdict: &EntitlementVerdict, subscription: &Subscription) -> Option<Self> {
        verdict.notification_due.then(|| Self {
            user_id: subscription.user_id.clone(),
            days_remaining: verdict.days_remaining,
            expires_at: subscription.expires_at,
        })
    }

    pub fn message(&self) -> String {
        let unit = if self.days_remaining == 1 { "day" } else { "days" };
        format!(
            "Your premium subscription expires in {} {unit}.",
            self.days_remaining
        )
    }
}

/// Sink that emits each notice as a `warn` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notice: &ExpiryNotice) {
        warn!(
            user_id = %notice.user_id,
            days_remaining = notice.days_remaining,
            expires_at = %notice.expires_at,
            "{}",
            notice.message()
        );
    }
}
