//! Individual strategy: one owner query per parcel, in bounded windows

use super::rows::{Enrichment, RowCollector};
use super::{EnrichContext, OWNER_QUERY_CONCURRENCY};
use crate::lifecycle::Interrupted;
use crate::model::{OwnerRecord, ParcelFeature};
use crate::service::QueryError;
use futures::future::join_all;

pub(super) async fn enrich_individually(
    candidates: &[&ParcelFeature],
    context: &EnrichContext<'_>,
) -> Result<Enrichment, Interrupted> {
    let mut collector = RowCollector::new(context.max_results);

    for (window_index, window) in candidates.chunks(OWNER_QUERY_CONCURRENCY).enumerate() {
        context.check()?;

        // Each-always: a failed query never cancels its siblings. Queries
        // already issued are awaited even if the cap is reached mid-window.
        let results = join_all(window.iter().map(|parcel| query_owners(parcel, context))).await;

        for (parcel, result) in window.iter().zip(results) {
            let rows = match result {
                Ok(owners) => context.rows_for_parcel(parcel, Some(owners)),
                Err(e) if e.is_cancelled() => return Err(context.interruption()),
                Err(e) => {
                    tracing::warn!(fnr = %parcel.fnr, error = %e, "Owner query failed");
                    context.rows_for_parcel(parcel, None)
                }
            };
            collector.push(parcel, rows);
        }

        tracing::debug!(
            request_id = context.request.request_id(),
            window = window_index,
            rows = collector.len(),
            "Owner window complete"
        );

        if collector.is_full() {
            break;
        }
        tokio::task::yield_now().await;
    }

    Ok(collector.finish())
}

async fn query_owners(
    parcel: &ParcelFeature,
    context: &EnrichContext<'_>,
) -> Result<Vec<OwnerRecord>, QueryError> {
    let cancel = context.cancel();
    cancel
        .run_until_cancelled(context.owners.query_owners(context.owner_layer, &parcel.fnr, cancel))
        .await
        .unwrap_or(Err(QueryError::Cancelled))
}
