//! Read-side payment status lookups through the store.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;
use uuid::Uuid;

use crate::models::CompletePaymentStatus;
use crate::services::cache::RequestCache;
use crate::services::metrics::STATUS_COMPUTATIONS_TOTAL;
use crate::services::store::SettlementStore;
use crate::services::{PaymentStatusCalculator, SettlementError};

/// Cached status per purchase.
pub type StatusCache = RequestCache<Uuid, CompletePaymentStatus, SettlementError>;

pub struct PaymentStatusService {
    store: Arc<dyn SettlementStore>,
    cache: StatusCache,
}

impl PaymentStatusService {
    pub fn new(store: Arc<dyn SettlementStore>, ttl: Duration) -> Self {
        Self {
            store,
            cache: StatusCache::new(ttl),
        }
    }

    /// Shared handle to the cache, for writers that must invalidate it.
    pub fn cache(&self) -> StatusCache {
        self.cache.clone()
    }

    /// Status of a stored purchase. Concurrent requests for the same
    /// purchase share one store read.
    #[instrument(skip(self))]
    pub async fn status_for(
        &self,
        purchase_id: Uuid,
    ) -> Result<CompletePaymentStatus, SettlementError> {
        let store = Arc::clone(&self.store);
        self.cache
            .get_or_load(purchase_id, move || async move {
                let snapshot = store.fetch_snapshot(purchase_id).await?;
                let status = PaymentStatusCalculator::compute_for_snapshot(&snapshot)?;
                STATUS_COMPUTATIONS_TOTAL
                    .with_label_values(&[status.display_status.label()])
                    .inc();
                Ok::<_, SettlementError>(status)
            })
            .await
    }
}
