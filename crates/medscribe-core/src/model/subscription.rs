use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use medscribe_api::store_models::SubscriptionRow;

use super::UserId;
use crate::error::CoreError;

/// Billing period of a subscription.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PlanType {
    Monthly,
    Yearly,
}

/// A user's subscription as recorded by the store.
///
/// Created when a payment completes; deactivated by the store on expiry or
/// cancellation. Nothing in this workspace mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub user_id: UserId,
    pub plan_type: PlanType,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// An active subscription without row metadata.
    pub fn new(user_id: UserId, plan_type: PlanType, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            user_id,
            plan_type,
            expires_at,
            is_active: true,
            created_at: None,
        }
    }

    /// Active and not yet expired at `now`.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, CoreError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| CoreError::InvalidRecord {
            message: format!("subscription.{field} {raw:?} is not an RFC 3339 timestamp: {e}"),
        })
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = CoreError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let user_id = UserId::parse(&row.user_id).map_err(|_| CoreError::InvalidRecord {
            message: "subscription.user_id is empty".into(),
        })?;

        let plan_type =
            row.plan_type
                .parse::<PlanType>()
                .map_err(|_| CoreError::InvalidRecord {
                    message: format!("subscription.plan_type {:?} is not monthly or yearly", row.plan_type),
                })?;

        let expires_at = parse_timestamp("expires_at", &row.expires_at)?;
        let created_at = row
            .created_at
            .as_deref()
            .map(|raw| parse_timestamp("created_at", raw))
            .transpose()?;

        Ok(Self {
            id: row.id,
            user_id,
            plan_type,
            expires_at,
            is_active: row.is_active,
            created_at,
        })
    }
}
