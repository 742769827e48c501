use std::sync::Arc;

use medscribe_api::StoreClient;

use crate::error::CoreError;
use crate::model::{Subscription, UserId};
use crate::ports::{SubscriptionStore, UsageCounter};

/// Store-backed implementation of the read ports.
///
/// Cheaply cloneable; every clone shares one HTTP connection pool.
#[derive(Debug, Clone)]
pub struct StoreBackend {
    client: Arc<StoreClient>,
}

impl StoreBackend {
    pub fn new(client: StoreClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &StoreClient {
        &self.client
    }
}

impl SubscriptionStore for StoreBackend {
    async fn find_active_subscription(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, CoreError> {
        self.client
            .find_active_subscription(user_id.as_str())
            .await?
            .map(Subscription::try_from)
            .transpose()
    }
}

impl UsageCounter for StoreBackend {
    async fn count_patients(&self, user_id: &UserId) -> Result<u32, CoreError> {
        Ok(self.client.count_patients(user_id.as_str()).await?)
    }

    async fn count_consultations(&self, user_id: &UserId) -> Result<u32, CoreError> {
        Ok(self.client.count_consultations(user_id.as_str()).await?)
    }
}
