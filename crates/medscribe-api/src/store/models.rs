//! Row types returned by the managed store.
//!
//! Rows are kept close to the wire: timestamps and enumerations stay as
//! strings so that `medscribe-core` can validate them and reject malformed
//! records instead of silently defaulting.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table holding one subscription row per purchase.
pub const SUBSCRIPTIONS_TABLE: &str = "subscriptions";
/// Table of patients owned by a user.
pub const PATIENTS_TABLE: &str = "patients";
/// Table of consultations owned by a user.
pub const CONSULTATIONS_TABLE: &str = "consultations";

/// A row of the `subscriptions` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRow {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub user_id: String,
    /// One of: `monthly`, `yearly`.
    pub plan_type: String,
    /// ISO 8601 date-time.
    pub expires_at: String,
    pub is_active: bool,
    /// ISO 8601 date-time.
    #[serde(default)]
    pub created_at: Option<String>,
}
