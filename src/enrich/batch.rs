//! Batch strategy: chunked object id resolution, then one relationship query
//!
//! Trades one extra round trip for a constant number of relationship
//! calls regardless of parcel count.

use super::rows::{Enrichment, RowCollector};
use super::{EnrichContext, OBJECT_ID_CHUNK_SIZE, OWNER_QUERY_CONCURRENCY};
use crate::lifecycle::Interrupted;
use crate::model::{Fnr, ParcelFeature};
use crate::service::QueryError;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};

/// Object ids by fnr key, plus the fnr keys whose lookup failed.
#[derive(Debug, Default)]
struct ResolvedIds {
    by_fnr: HashMap<String, i64>,
    failed: HashSet<String>,
}

pub(super) async fn enrich_in_batch(
    candidates: &[&ParcelFeature],
    relationship_id: u32,
    context: &EnrichContext<'_>,
) -> Result<Enrichment, Interrupted> {
    let fnrs: Vec<Fnr> = candidates.iter().map(|p| p.fnr.clone()).collect();
    let resolved = resolve_object_ids(&fnrs, context).await?;

    context.check()?;
    let mut object_ids: Vec<i64> = Vec::new();
    for parcel in candidates {
        if let Some(id) = resolved.by_fnr.get(&parcel.fnr.key()) {
            if !object_ids.contains(id) {
                object_ids.push(*id);
            }
        }
    }

    let related = if object_ids.is_empty() {
        Ok(HashMap::new())
    } else {
        let cancel = context.cancel();
        cancel
            .run_until_cancelled(context.owners.query_related_owners(
                context.property_layer,
                relationship_id,
                &object_ids,
                cancel,
            ))
            .await
            .unwrap_or(Err(QueryError::Cancelled))
    };

    let mut collector = RowCollector::new(context.max_results);
    match related {
        Err(e) if e.is_cancelled() => return Err(context.interruption()),
        Err(e) => {
            tracing::warn!(
                relationship_id,
                parcels = candidates.len(),
                error = %e,
                "Relationship query failed, using placeholders"
            );
            for parcel in candidates {
                collector.push(parcel, context.rows_for_parcel(parcel, None));
            }
        }
        Ok(mut owners_by_id) => {
            for parcel in candidates {
                let key = parcel.fnr.key();
                let owners = if resolved.failed.contains(&key) {
                    None
                } else {
                    Some(
                        resolved
                            .by_fnr
                            .get(&key)
                            .and_then(|id| owners_by_id.remove(id))
                            .unwrap_or_default(),
                    )
                };
                let rows = context.rows_for_parcel(parcel, owners);
                collector.push(parcel, rows);
                if collector.is_full() {
                    break;
                }
            }
        }
    }

    tracing::debug!(
        request_id = context.request.request_id(),
        object_ids = object_ids.len(),
        rows = collector.len(),
        "Batch enrichment complete"
    );
    Ok(collector.finish())
}

/// Look up object ids in chunks, a bounded number of chunks at a time.
///
/// A failed chunk marks its fnrs as failed and leaves the others intact.
async fn resolve_object_ids(fnrs: &[Fnr], context: &EnrichContext<'_>) -> Result<ResolvedIds, Interrupted> {
    let chunks: Vec<&[Fnr]> = fnrs.chunks(OBJECT_ID_CHUNK_SIZE).collect();
    let mut resolved = ResolvedIds::default();
    let cancel = context.cancel();

    for window in chunks.chunks(OWNER_QUERY_CONCURRENCY) {
        context.check()?;

        let results = join_all(window.iter().map(|chunk| async move {
            cancel
                .run_until_cancelled(context.owners.query_object_ids(context.property_layer, chunk, cancel))
                .await
                .unwrap_or(Err(QueryError::Cancelled))
        }))
        .await;

        for (chunk, result) in window.iter().zip(results) {
            match result {
                Ok(pairs) => {
                    for (fnr, id) in pairs {
                        resolved.by_fnr.entry(fnr.key()).or_insert(id);
                    }
                }
                Err(e) if e.is_cancelled() => return Err(context.interruption()),
                Err(e) => {
                    tracing::warn!(fnrs = chunk.len(), error = %e, "Object id lookup failed");
                    resolved.failed.extend(chunk.iter().map(Fnr::key));
                }
            }
        }
        tokio::task::yield_now().await;
    }

    Ok(resolved)
}
