//! Batch-level detail fetching: one insight request per entity id, all in flight at once.

use crate::client::QueryClient;
use crate::types::SensitiveParamRecord;
use futures::future::join_all;

/// Records gathered for one batch of ids
#[must_use]
#[derive(Debug, Default)]
pub struct BatchFetch {
    /// Sensitive-parameter records from every successful lookup, flattened
    pub records: Vec<SensitiveParamRecord>,
    /// Ids whose lookup failed and contributed nothing
    pub failed: usize,
}

/// Fetch sensitive-parameter records for every id in the batch
///
/// Every request future is built before any is awaited, then all are driven to
/// completion together. A failed lookup is logged and skipped; it never fails
/// the batch and is not retried.
pub async fn fetch_sensitive_params<C>(client: &C, ids: &[String]) -> BatchFetch
where
    C: QueryClient + ?Sized,
{
    let lookups: Vec<_> = ids
        .iter()
        .map(|id| async move { (id, client.fetch_api_insight(id).await) })
        .collect();

    let mut batch = BatchFetch::default();
    for (id, result) in join_all(lookups).await {
        match result {
            Ok(insight) => {
                if insight.id != *id {
                    tracing::debug!(requested = %id, returned = %insight.id, "insight id differs from requested id");
                }
                batch.records.extend(insight.into_records());
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "detail lookup failed, skipping entity");
                batch.failed += 1;
            }
        }
    }
    batch
}
