//! Owner enrichment: turn parcels into one selection row per owner
//!
//! Two interchangeable strategies:
//! - **Individual**: one owner query per parcel, in bounded windows
//! - **Batch**: resolve object ids in chunks, then one relationship query
//!
//! Query failures degrade to placeholder rows. Only cancellation and
//! staleness abort enrichment.

mod batch;
mod individual;
mod rows;

pub use rows::Enrichment;

use crate::lifecycle::{CancellationToken, Interrupted, RequestToken, RequestTracker};
use crate::model::{OwnerRecord, ParcelFeature, RowStatus, SelectionRow};
use crate::owner::{dedupe, IdentityContext};
use crate::pipeline::{keys, FormatCache, Translate};
use crate::service::{LayerHandle, OwnerQueryService};
use std::collections::HashSet;

/// Owner queries in flight at once.
pub const OWNER_QUERY_CONCURRENCY: usize = 5;

/// Fnrs per object id lookup in the batch strategy.
pub const OBJECT_ID_CHUNK_SIZE: usize = 50;

/// How owners are fetched for a set of parcels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichStrategy {
    Individual,
    Batch { relationship_id: u32 },
}

/// Everything a strategy needs besides the parcels.
pub struct EnrichContext<'a> {
    pub owners: &'a dyn OwnerQueryService,
    /// Layer queried per parcel by the individual strategy
    pub owner_layer: &'a LayerHandle,
    /// Layer holding the relationship used by the batch strategy
    pub property_layer: &'a LayerHandle,
    pub max_results: usize,
    pub mask_pii: bool,
    pub messages: &'a dyn Translate,
    pub formatter: &'a FormatCache,
    pub tracker: &'a RequestTracker,
    pub request: &'a RequestToken,
}

impl EnrichContext<'_> {
    pub(crate) fn cancel(&self) -> &CancellationToken {
        self.request.cancellation()
    }

    /// Fails once the request is superseded or aborted.
    pub(crate) fn check(&self) -> Result<(), Interrupted> {
        self.tracker.check(self.request)
    }

    /// Classify a query that reported cancellation.
    pub(crate) fn interruption(&self) -> Interrupted {
        self.check().err().unwrap_or(Interrupted::Cancelled)
    }

    /// Rows for one parcel given its owners, `None` if the lookup failed.
    ///
    /// Always yields at least one row.
    pub(crate) fn rows_for_parcel(
        &self,
        parcel: &ParcelFeature,
        owners: Option<Vec<OwnerRecord>>,
    ) -> Vec<SelectionRow> {
        let owners = match owners {
            Some(owners) => owners,
            None => {
                return vec![SelectionRow::placeholder(
                    parcel,
                    RowStatus::QueryFailed,
                    self.messages.translate(keys::OWNER_QUERY_FAILED),
                )]
            }
        };

        let identity = IdentityContext::for_parcel(parcel.uuid.as_deref(), &parcel.fnr);
        let owners = dedupe(owners, &identity);
        if owners.is_empty() {
            return vec![SelectionRow::placeholder(
                parcel,
                RowStatus::NoOwners,
                self.messages.translate(keys::NO_OWNERS_FOUND),
            )];
        }

        let unknown = self.messages.translate(keys::UNKNOWN_OWNER);
        owners
            .into_iter()
            .enumerate()
            .map(|(ordinal, owner)| {
                let text = self.formatter.format(&owner, self.mask_pii, &unknown);
                SelectionRow::for_owner(parcel, owner, ordinal, text)
            })
            .collect()
    }
}

/// Resolve owners for `parcels` with the chosen strategy.
pub async fn enrich(
    parcels: &[ParcelFeature],
    strategy: EnrichStrategy,
    context: &EnrichContext<'_>,
) -> Result<Enrichment, Interrupted> {
    let candidates = candidate_parcels(parcels, context.max_results);
    tracing::debug!(
        request_id = context.request.request_id(),
        parcels = parcels.len(),
        candidates = candidates.len(),
        ?strategy,
        "Enriching parcels"
    );

    match strategy {
        EnrichStrategy::Individual => individual::enrich_individually(&candidates, context).await,
        EnrichStrategy::Batch { relationship_id } => {
            batch::enrich_in_batch(&candidates, relationship_id, context).await
        }
    }
}

/// First parcel per fnr, at most `max_results` of them.
pub fn candidate_parcels(parcels: &[ParcelFeature], max_results: usize) -> Vec<&ParcelFeature> {
    let mut seen = HashSet::new();
    parcels
        .iter()
        .filter(|p| seen.insert(p.fnr.key()))
        .take(max_results)
        .collect()
}
