// ── Entitlement composition ──
//
// Fetch-then-evaluate. Reads subscription and usage through the ports,
// retries transient failures, and hands the results to the pure evaluator.
// A lookup that still fails after retries degrades to free tier: no premium
// is granted on error, and basic usage stays possible.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::evaluator::Evaluator;
use crate::model::{EntitlementVerdict, ResourceKind, Subscription, UsageSnapshot, UserId};
use crate::notice::{ExpiryNotice, TracingSink};
use crate::ports::{NotificationSink, SubscriptionStore, UsageCounter};
use crate::retry::RetryPolicy;

/// Response shape of the subscription check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub is_subscribed: bool,
    /// The current subscription; `None` when absent, inactive or expired.
    pub subscription: Option<Subscription>,
    pub notification_due: bool,
    pub days_remaining: i64,
}

/// Everything gathered for one decision, plus the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub user_id: UserId,
    pub subscription: Option<Subscription>,
    pub usage: UsageSnapshot,
    pub verdict: EntitlementVerdict,
    /// At least one lookup failed and was replaced by its free-tier default.
    pub degraded: bool,
}

impl Entitlement {
    pub fn permits(&self, kind: ResourceKind) -> bool {
        self.verdict.permits(kind)
    }

    pub fn expiry_notice(&self) -> Option<ExpiryNotice> {
        self.subscription
            .as_ref()
            .and_then(|sub| ExpiryNotice::from_verdict(&self.verdict, sub))
    }
}

/// Composes the store ports with the evaluator.
pub struct EntitlementService<S, U> {
    store: S,
    counter: U,
    sink: Arc<dyn NotificationSink>,
    evaluator: Evaluator,
    retry: RetryPolicy,
}

impl<S, U> EntitlementService<S, U>
where
    S: SubscriptionStore,
    U: UsageCounter,
{
    pub fn new(store: S, counter: U) -> Self {
        Self {
            store,
            counter,
            sink: Arc::new(TracingSink),
            evaluator: Evaluator::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Subscription state for `user_id`.
    ///
    /// Unlike [`entitlement`](Self::entitlement), a store failure is
    /// returned to the caller instead of degrading to free tier.
    pub async fn check_subscription(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionStatus, CoreError> {
        let subscription = self
            .retry
            .run("subscription lookup", || {
                self.store.find_active_subscription(user_id)
            })
            .await?;

        let verdict = self.evaluator.evaluate(
            user_id.as_str(),
            UsageSnapshot::default(),
            subscription.as_ref(),
            now,
        )?;

        Ok(SubscriptionStatus {
            is_subscribed: verdict.is_premium,
            subscription: subscription.filter(|_| verdict.is_premium),
            notification_due: verdict.notification_due,
            days_remaining: verdict.days_remaining,
        })
    }

    /// Fetch subscription and usage concurrently, then evaluate.
    pub async fn entitlement(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Entitlement, CoreError> {
        let (subscription, patients, consultations) = tokio::join!(
            self.retry.run("subscription lookup", || {
                self.store.find_active_subscription(user_id)
            }),
            self.retry
                .run("patient count", || self.counter.count_patients(user_id)),
            self.retry.run("consultation count", || {
                self.counter.count_consultations(user_id)
            }),
        );

        let mut degraded = false;
        let subscription = subscription.unwrap_or_else(|e| {
            warn!(%user_id, error = %e, "subscription lookup failed, treating as free tier");
            degraded = true;
            None
        });
        let patient_count = patients.unwrap_or_else(|e| {
            warn!(%user_id, error = %e, "patient count failed, assuming zero");
            degraded = true;
            0
        });
        let consultation_count = consultations.unwrap_or_else(|e| {
            warn!(%user_id, error = %e, "consultation count failed, assuming zero");
            degraded = true;
            0
        });

        let usage = UsageSnapshot::new(patient_count, consultation_count);
        let verdict =
            self.evaluator
                .evaluate(user_id.as_str(), usage, subscription.as_ref(), now)?;
        debug!(%user_id, ?verdict, degraded, "entitlement evaluated");

        Ok(Entitlement {
            user_id: user_id.clone(),
            subscription,
            usage,
            verdict,
            degraded,
        })
    }

    /// Whether `user_id` may create one more resource of `kind`.
    pub async fn gate_action(
        &self,
        user_id: &UserId,
        kind: ResourceKind,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        let entitlement = self.entitlement(user_id, now).await?;
        Ok(entitlement.permits(kind))
    }

    /// Deliver the expiry reminder if one is due. Returns what was sent.
    pub fn notify_if_due(&self, entitlement: &Entitlement) -> Option<ExpiryNotice> {
        let notice = entitlement.expiry_notice()?;
        self.sink.notify(&notice);
        Some(notice)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::limits::FreeTierLimits;
    use crate::model::PlanType;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 8, 0, 0).unwrap()
    }

    fn user() -> UserId {
        UserId::parse("user-7").unwrap()
    }

    fn unavailable() -> CoreError {
        CoreError::UpstreamUnavailable {
            service: "store".into(),
            reason: "503".into(),
        }
    }

    enum Lookup {
        Found(Subscription),
        Missing,
        Fails,
    }

    struct FakeStore {
        lookup: Lookup,
        calls: AtomicU32,
    }

    impl FakeStore {
        fn new(lookup: Lookup) -> Self {
            Self {
                lookup,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl SubscriptionStore for FakeStore {
        async fn find_active_subscription(
            &self,
            _user_id: &UserId,
        ) -> Result<Option<Subscription>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.lookup {
                Lookup::Found(sub) => Ok(Some(sub.clone())),
                Lookup::Missing => Ok(None),
                Lookup::Fails => Err(unavailable()),
            }
        }
    }

    struct FakeCounter {
        patients: Option<u32>,
        consultations: Option<u32>,
    }

    impl UsageCounter for FakeCounter {
        async fn count_patients(&self, _user_id: &UserId) -> Result<u32, CoreError> {
            self.patients.ok_or_else(unavailable)
        }

        async fn count_consultations(&self, _user_id: &UserId) -> Result<u32, CoreError> {
            self.consultations.ok_or_else(unavailable)
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<ExpiryNotice>>);

    impl NotificationSink for RecordingSink {
        fn notify(&self, notice: &ExpiryNotice) {
            self.0.lock().unwrap().push(notice.clone());
        }
    }

    fn counter(patients: u32, consultations: u32) -> FakeCounter {
        FakeCounter {
            patients: Some(patients),
            consultations: Some(consultations),
        }
    }

    fn service(
        lookup: Lookup,
        counter: FakeCounter,
    ) -> EntitlementService<FakeStore, FakeCounter> {
        EntitlementService::new(FakeStore::new(lookup), counter).with_retry(RetryPolicy {
            max_attempts: 2,
            backoff: std::time::Duration::ZERO,
        })
    }

    fn expiring_in(days: i64) -> Subscription {
        Subscription::new(user(), PlanType::Monthly, now() + Duration::days(days))
    }

    #[tokio::test]
    async fn check_reports_current_subscription() {
        let svc = service(Lookup::Found(expiring_in(2)), counter(0, 0));
        let status = svc.check_subscription(&user(), now()).await.unwrap();
        assert!(status.is_subscribed);
        assert!(status.notification_due);
        assert_eq!(status.days_remaining, 2);
        assert_eq!(status.subscription, Some(expiring_in(2)));
    }

    #[tokio::test]
    async fn check_hides_expired_subscription() {
        let svc = service(Lookup::Found(expiring_in(-1)), counter(0, 0));
        let status = svc.check_subscription(&user(), now()).await.unwrap();
        assert!(!status.is_subscribed);
        assert_eq!(status.subscription, None);
        assert_eq!(status.days_remaining, 0);
    }

    #[tokio::test]
    async fn check_propagates_store_failure_after_retries() {
        let svc = service(Lookup::Fails, counter(0, 0));
        let err = svc.check_subscription(&user(), now()).await.unwrap_err();
        assert!(matches!(err, CoreError::UpstreamUnavailable { .. }));
        assert_eq!(svc.store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn entitlement_for_free_user_applies_limits() {
        let svc = service(Lookup::Missing, counter(1, 0));
        let ent = svc.entitlement(&user(), now()).await.unwrap();
        assert!(!ent.degraded);
        assert!(!ent.verdict.is_premium);
        assert!(!ent.permits(ResourceKind::Patient));
        assert!(ent.permits(ResourceKind::Consultation));
    }

    #[tokio::test]
    async fn store_failure_degrades_to_free_tier() {
        let svc = service(Lookup::Fails, counter(0, 0));
        let ent = svc.entitlement(&user(), now()).await.unwrap();
        assert!(ent.degraded);
        assert!(!ent.verdict.is_premium);
        assert!(ent.permits(ResourceKind::Patient));
    }

    #[tokio::test]
    async fn count_failure_assumes_zero() {
        let svc = service(
            Lookup::Missing,
            FakeCounter {
                patients: None,
                consultations: Some(4),
            },
        );
        let ent = svc.entitlement(&user(), now()).await.unwrap();
        assert!(ent.degraded);
        assert_eq!(ent.usage, UsageSnapshot::new(0, 4));
        assert!(ent.permits(ResourceKind::Patient));
        assert!(!ent.permits(ResourceKind::Consultation));
    }

    #[tokio::test]
    async fn configured_limits_are_used() {
        let svc = service(Lookup::Missing, counter(0, 2))
            .with_evaluator(Evaluator::new(FreeTierLimits::dashboard()));
        assert!(svc
            .gate_action(&user(), ResourceKind::Consultation, now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn premium_gate_ignores_usage() {
        let svc = service(Lookup::Found(expiring_in(30)), counter(50, 50));
        assert!(svc
            .gate_action(&user(), ResourceKind::Patient, now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn notice_sent_only_when_due() {
        let sink = Arc::new(RecordingSink::default());
        let svc = service(Lookup::Found(expiring_in(3)), counter(0, 0)).with_sink(sink.clone());
        let ent = svc.entitlement(&user(), now()).await.unwrap();
        let notice = svc.notify_if_due(&ent).unwrap();
        assert_eq!(notice.days_remaining, 3);
        assert_eq!(sink.0.lock().unwrap().len(), 1);

        let svc = service(Lookup::Found(expiring_in(10)), counter(0, 0)).with_sink(sink.clone());
        let ent = svc.entitlement(&user(), now()).await.unwrap();
        assert!(svc.notify_if_due(&ent).is_none());
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }
}
