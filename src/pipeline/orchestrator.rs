//! Selection pipeline: click point in, next selection out
//!
//! Steps of one run:
//! 1. Validate the point and resolve both data sources to layer handles
//! 2. Query the parcels at the point
//! 3. Early exit when every parcel is already selected in toggle mode
//! 4. Enrich parcels with owners (individual or batch strategy)
//! 5. Reconcile the new rows with the caller's selection
//!
//! Every step re-checks the request before going on. A superseded request
//! ends in `PipelineError::Stale` and its work is discarded.

use super::cache::{FormatCache, LayerCache, LAYER_CACHE_CAPACITY};
use super::config::PipelineConfig;
use super::error::PipelineError;
use super::messages::{Messages, Translate};
use crate::enrich::{enrich, EnrichContext};
use crate::lifecycle::{RequestToken, RequestTracker, DEFAULT_POOL_CAPACITY};
use crate::model::{FnrGeometry, MapPoint, PipelineResult, SelectionSource, SelectionUpdate};
use crate::selection::{reconcile, removal_only, Reconciliation};
use crate::service::{query_parcels_at_point, LayerHandle, OwnerQueryService, QueryError, SpatialQueryService};
use crate::validate::{check_layer_url, ValidationError, ValidationResult};
use std::collections::HashSet;
use std::sync::Arc;

/// Runs selection requests against a pair of query services.
///
/// Owns the request tracker and the caches; one instance per map view.
pub struct SelectionPipeline {
    spatial: Arc<dyn SpatialQueryService>,
    owners: Arc<dyn OwnerQueryService>,
    tracker: RequestTracker,
    layers: LayerCache,
    formats: FormatCache,
    messages: Arc<dyn Translate>,
}

impl SelectionPipeline {
    pub fn new(spatial: Arc<dyn SpatialQueryService>, owners: Arc<dyn OwnerQueryService>) -> Self {
        Self {
            spatial,
            owners,
            tracker: RequestTracker::with_pool_capacity(DEFAULT_POOL_CAPACITY),
            layers: LayerCache::new(LAYER_CACHE_CAPACITY),
            formats: FormatCache::default(),
            messages: Arc::new(Messages::default()),
        }
    }

    pub fn with_messages(mut self, messages: Arc<dyn Translate>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_token_pool_capacity(mut self, capacity: usize) -> Self {
        self.tracker = RequestTracker::with_pool_capacity(capacity);
        self
    }

    /// Start a request, aborting the one in flight.
    pub fn begin_request(&self) -> RequestToken {
        self.tracker.begin()
    }

    pub fn cancel_in_flight(&self) -> bool {
        self.tracker.cancel_in_flight()
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    pub fn clear_caches(&self) {
        self.layers.clear();
        self.formats.clear();
    }

    pub fn cached_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn cached_formats(&self) -> usize {
        self.formats.len()
    }

    /// Begin a request and run it to completion.
    pub async fn select<S: SelectionSource + ?Sized>(
        &self,
        point: Option<MapPoint>,
        config: &PipelineConfig,
        existing: &S,
    ) -> Result<PipelineResult, PipelineError> {
        let token = self.begin_request();
        self.run_selection_pipeline(point, config, existing, token).await
    }

    /// Compute the next selection for a click at `point`.
    ///
    /// `existing` is only read. The token goes back to the pool when the
    /// run ends, whatever the outcome.
    pub async fn run_selection_pipeline<S: SelectionSource + ?Sized>(
        &self,
        point: Option<MapPoint>,
        config: &PipelineConfig,
        existing: &S,
        token: RequestToken,
    ) -> Result<PipelineResult, PipelineError> {
        let request_id = token.request_id();
        let outcome = self.run(point, config, existing, &token).await;
        self.tracker.finish(token);

        match &outcome {
            Err(PipelineError::Stale) => {
                tracing::debug!(request_id, "Dropping superseded request");
            }
            Err(PipelineError::Cancelled) => {
                tracing::debug!(request_id, "Request cancelled");
            }
            Err(e) => {
                tracing::warn!(request_id, error = %e, "Selection pipeline failed");
            }
            Ok(_) => {}
        }
        outcome
    }

    async fn run<S: SelectionSource + ?Sized>(
        &self,
        point: Option<MapPoint>,
        config: &PipelineConfig,
        existing: &S,
        token: &RequestToken,
    ) -> Result<PipelineResult, PipelineError> {
        let request_id = token.request_id();

        // Step 1: validate before any query
        let point = point
            .filter(MapPoint::is_finite)
            .ok_or(ValidationError::MissingPoint)?;
        let property_layer = self.layer(config, &config.property_data_source_id)?;
        let owner_layer = self.layer(config, &config.owner_data_source_id)?;
        let max_results = config.effective_max_results();
        self.tracker.check(token)?;

        // Step 2: parcels at the point
        let parcels = query_parcels_at_point(self.spatial.as_ref(), &property_layer, &point, token.cancellation())
            .await
            .map_err(|e| self.query_failure(e, token))?;
        self.tracker.check(token)?;

        if parcels.is_empty() {
            tracing::debug!(request_id, "No parcels at point");
            return Ok(PipelineResult::Empty);
        }

        // Step 3: re-click on a fully selected set removes it, no owner queries
        if let Some(removal) = removal_only(&parcels, existing, config.enable_toggle_removal, max_results) {
            tracing::info!(
                request_id,
                removed = removal.to_remove.len(),
                total = removal.updated_rows.len(),
                "Toggled selection off"
            );
            return Ok(PipelineResult::Success(SelectionUpdate {
                rows_to_process: removal.to_add,
                updated_rows: removal.updated_rows,
                to_remove: removal.to_remove,
                raw_query_results: parcels,
                fnr_geometries: Vec::new(),
            }));
        }

        // Step 4: owners
        let context = EnrichContext {
            owners: self.owners.as_ref(),
            owner_layer: &owner_layer,
            property_layer: &property_layer,
            max_results,
            mask_pii: config.enable_pii_masking,
            messages: self.messages.as_ref(),
            formatter: &self.formats,
            tracker: &self.tracker,
            request: token,
        };
        let enrichment = enrich(&parcels, config.strategy(), &context).await?;
        self.tracker.check(token)?;

        // Step 5: reconcile
        let Reconciliation {
            to_add,
            to_remove,
            updated_rows,
        } = reconcile(enrichment.rows, existing, config.enable_toggle_removal, max_results);

        let added_fnrs: HashSet<String> = to_add.iter().map(|r| r.fnr_key()).collect();
        let fnr_geometries: Vec<FnrGeometry> = enrichment
            .fnr_geometries
            .into_iter()
            .filter(|pair| added_fnrs.contains(&pair.fnr.key()))
            .collect();

        tracing::info!(
            request_id,
            parcels = parcels.len(),
            added = to_add.len(),
            removed = to_remove.len(),
            total = updated_rows.len(),
            "Selection updated"
        );

        Ok(PipelineResult::Success(SelectionUpdate {
            rows_to_process: to_add,
            updated_rows,
            to_remove,
            raw_query_results: parcels,
            fnr_geometries,
        }))
    }

    /// Validated layer for a configured data source, cached per URL and allow-list.
    fn layer(&self, config: &PipelineConfig, data_source_id: &str) -> ValidationResult<LayerHandle> {
        let url = config.data_source_url(data_source_id)?;
        let key = format!("{}|{}|{}", data_source_id, url, config.allowed_hosts.join(","));
        if let Some(layer) = self.layers.get(&key) {
            return Ok(layer);
        }

        let layer = check_layer_url(url, &config.allowed_hosts)
            .map(|url| LayerHandle {
                data_source_id: data_source_id.to_string(),
                url,
            })
            .map_err(|e| {
                tracing::warn!(data_source = data_source_id, error = %e, "Rejected data source URL");
                e
            })?;
        self.layers.insert(key, layer.clone());
        Ok(layer)
    }

    /// A query that reported cancellation may belong to a superseded request.
    fn query_failure(&self, e: QueryError, token: &RequestToken) -> PipelineError {
        if !e.is_cancelled() {
            return PipelineError::Query(e);
        }
        match self.tracker.check(token) {
            Err(interrupted) => interrupted.into(),
            Ok(()) => PipelineError::Cancelled,
        }
    }
}
