//! Entitlement logic and upstream composition for medscribe.
//!
//! This crate owns the business rules between `medscribe-api` and the
//! consumers (server and CLI):
//!
//! - **[`Evaluator`]**: pure decision function turning a user id, a
//!   [`UsageSnapshot`] and an optional [`Subscription`] into an
//!   [`EntitlementVerdict`]. The clock is an explicit parameter.
//!
//! - **[`EntitlementService`]**: fetch-then-evaluate composition over the
//!   [`ports`]. Retries transient store failures with a [`RetryPolicy`] and
//!   degrades to free tier when a lookup keeps failing.
//!
//! - **[`Assistant`]**: prompt templating and base64 audio decoding in front
//!   of the generative-AI and speech clients.
//!
//! - **Domain model** ([`model`]): validated records built from raw store
//!   rows; malformed data is rejected, never defaulted.

pub mod assistant;
pub mod audio;
pub mod backend;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod limits;
pub mod model;
pub mod notice;
pub mod ports;
pub mod prompts;
pub mod retry;
pub mod service;

// ── Primary re-exports ──────────────────────────────────────────────
pub use assistant::Assistant;
pub use backend::StoreBackend;
pub use config::{GenerationSettings, ModelEndpoint, ServiceConfig, StoreConfig, TlsVerification};
pub use error::CoreError;
pub use evaluator::Evaluator;
pub use limits::FreeTierLimits;
pub use notice::{ExpiryNotice, TracingSink};
pub use ports::{NotificationSink, SubscriptionStore, UsageCounter};
pub use retry::RetryPolicy;
pub use service::{Entitlement, EntitlementService, SubscriptionStatus};

pub use model::{
    EntitlementVerdict, LimitStatus, PlanType, ResourceKind, Subscription, UsageSnapshot, UserId,
};
