// ── Free-tier limits ──
//
// Named caps applied to non-premium users. Call sites read these through
// `FreeTierLimits`; the constants are the shipped defaults.

use serde::{Deserialize, Serialize};

use crate::model::ResourceKind;

/// Maximum patients a free-tier user may own.
pub const FREE_PATIENT_LIMIT: u32 = 1;

/// Maximum consultations a free-tier user may own, as enforced by the
/// route gate. This is the default.
pub const FREE_CONSULTATION_LIMIT: u32 = 1;

/// Consultation cap shown on the dashboard surface.
pub const FREE_CONSULTATION_LIMIT_DASHBOARD: u32 = 3;

/// Days before expiry during which a premium user is reminded.
pub const NOTIFICATION_WINDOW_DAYS: i64 = 3;

/// Caps applied when a user has no current subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeTierLimits {
    pub patients: u32,
    pub consultations: u32,
}

impl Default for FreeTierLimits {
    fn default() -> Self {
        Self {
            patients: FREE_PATIENT_LIMIT,
            consultations: FREE_CONSULTATION_LIMIT,
        }
    }
}

impl FreeTierLimits {
    /// Limits using the dashboard consultation cap.
    pub fn dashboard() -> Self {
        Self {
            patients: FREE_PATIENT_LIMIT,
            consultations: FREE_CONSULTATION_LIMIT_DASHBOARD,
        }
    }

    pub fn for_resource(self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Patient => self.patients,
            ResourceKind::Consultation => self.consultations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_gate_values() {
        let limits = FreeTierLimits::default();
        assert_eq!(limits.for_resource(ResourceKind::Patient), 1);
        assert_eq!(limits.for_resource(ResourceKind::Consultation), 1);
    }

    #[test]
    fn dashboard_allows_three_consultations() {
        let limits = FreeTierLimits::dashboard();
        assert_eq!(limits.patients, FREE_PATIENT_LIMIT);
        assert_eq!(limits.consultations, 3);
    }
}
