use std::sync::Arc;

use medscribe_core::{Assistant, CoreError, EntitlementService, ServiceConfig, StoreBackend};

use crate::error::ApiError;

pub type StoreEntitlements = EntitlementService<StoreBackend, StoreBackend>;

/// Immutable state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    entitlements: Option<StoreEntitlements>,
    assistant: Assistant,
}

impl AppState {
    pub fn new(entitlements: Option<StoreEntitlements>, assistant: Assistant) -> Self {
        Self {
            inner: Arc::new(Inner {
                entitlements,
                assistant,
            }),
        }
    }

    /// Build from a service config. Without a store, `/check-subscription`
    /// answers 400 and `/entitlement` and `/gate-action` answer 500; missing
    /// model keys make the AI routes answer 500.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, CoreError> {
        let entitlements = config
            .store
            .is_some()
            .then(|| config.entitlement_service())
            .transpose()?;
        Ok(Self::new(entitlements, config.assistant()?))
    }

    pub(crate) fn entitlements(&self) -> Result<&StoreEntitlements, ApiError> {
        self.inner
            .entitlements
            .as_ref()
            .ok_or_else(|| ApiError::internal("subscription store is not configured"))
    }

    pub(crate) fn assistant(&self) -> &Assistant {
        &self.inner.assistant
    }
}
