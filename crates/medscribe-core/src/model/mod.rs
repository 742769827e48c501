// ── Domain model ──
//
// Validated, explicitly tagged records. Every type here is built from raw
// store rows or request payloads through a fallible constructor; malformed
// data is rejected rather than defaulted.

pub mod subscription;
pub mod usage;
pub mod user;
pub mod verdict;

pub use subscription::{PlanType, Subscription};
pub use usage::{ResourceKind, UsageSnapshot};
pub use user::UserId;
pub use verdict::{EntitlementVerdict, LimitStatus};
