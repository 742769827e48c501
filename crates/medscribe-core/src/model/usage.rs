use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Kind of user-owned resource subject to free-tier caps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ResourceKind {
    Patient,
    Consultation,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Patient, ResourceKind::Consultation];
}

/// Point-in-time counts of a user's owned resources.
///
/// Recomputed on every evaluation; never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub patient_count: u32,
    pub consultation_count: u32,
}

impl UsageSnapshot {
    pub fn new(patient_count: u32, consultation_count: u32) -> Self {
        Self {
            patient_count,
            consultation_count,
        }
    }

    pub fn count(self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Patient => self.patient_count,
            ResourceKind::Consultation => self.consultation_count,
        }
    }
}
