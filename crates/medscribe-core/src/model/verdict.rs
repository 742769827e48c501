use serde::{Deserialize, Serialize};

use super::ResourceKind;

/// Per-resource outcome of the free-tier caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitStatus {
    pub patient: bool,
    pub consultation: bool,
}

impl LimitStatus {
    /// Every resource kind is within its limit.
    pub const UNLIMITED: LimitStatus = LimitStatus {
        patient: true,
        consultation: true,
    };
}

/// The evaluator's sole output.
///
/// Invariants upheld by [`Evaluator`](crate::Evaluator):
/// `is_premium` implies every `within_limit` is true, and
/// `notification_due` implies `is_premium` with `0 < days_remaining <= 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementVerdict {
    pub is_premium: bool,
    #[serde(rename = "withinLimit")]
    pub limits: LimitStatus,
    pub notification_due: bool,
    pub days_remaining: i64,
}

impl EntitlementVerdict {
    pub fn within_limit(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Patient => self.limits.patient,
            ResourceKind::Consultation => self.limits.consultation,
        }
    }

    /// Whether an action creating a resource of `kind` is permitted.
    pub fn permits(&self, kind: ResourceKind) -> bool {
        self.is_premium || self.within_limit(kind)
    }
}
