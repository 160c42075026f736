//! Mock query service for testing. Returns preconfigured parcels and owners.
//!
//! Supports failure injection, artificial latency, and call counters so
//! tests can assert how many queries a pipeline run issued.

use super::traits::{LayerHandle, OwnerQueryService, QueryError, SpatialQueryService};
use crate::lifecycle::CancellationToken;
use crate::model::{Fnr, MapPoint, OwnerRecord, ParcelFeature};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct PointResponse {
    x: f64,
    y: f64,
    parcels: Vec<ParcelFeature>,
    latency: Option<Duration>,
}

/// In-memory stand-in for both query services.
#[derive(Default)]
pub struct MockQueryService {
    default_parcels: Vec<ParcelFeature>,
    points: Vec<PointResponse>,
    owners: HashMap<String, Vec<OwnerRecord>>,
    object_ids: HashMap<String, i64>,
    failing_owner_fnrs: HashSet<String>,
    spatial_failure: bool,
    object_id_failure: bool,
    related_failure: bool,
    owner_latency: Option<Duration>,
    spatial_calls: AtomicUsize,
    owner_calls: AtomicUsize,
    object_id_calls: AtomicUsize,
    related_calls: AtomicUsize,
    owners_in_flight: AtomicUsize,
    max_owners_in_flight: AtomicUsize,
}

impl MockQueryService {
    pub fn new() -> Self {
        Self::default()
    }

    fn register_object_ids(&mut self, parcels: &[ParcelFeature]) {
        for parcel in parcels {
            self.object_ids.entry(parcel.fnr.key()).or_insert(parcel.object_id);
        }
    }

    /// Parcels returned for any point without a specific response.
    pub fn with_parcels(mut self, parcels: Vec<ParcelFeature>) -> Self {
        self.register_object_ids(&parcels);
        self.default_parcels = parcels;
        self
    }

    /// Parcels returned for clicks at exactly `(x, y)`.
    pub fn with_parcels_at(mut self, x: f64, y: f64, parcels: Vec<ParcelFeature>) -> Self {
        self.register_object_ids(&parcels);
        self.points.push(PointResponse {
            x,
            y,
            parcels,
            latency: None,
        });
        self
    }

    /// Delay the spatial query for clicks at `(x, y)`.
    pub fn with_latency_at(mut self, x: f64, y: f64, latency: Duration) -> Self {
        if let Some(p) = self.points.iter_mut().find(|p| p.x == x && p.y == y) {
            p.latency = Some(latency);
        }
        self
    }

    pub fn with_owners(mut self, fnr: impl Into<Fnr>, owners: Vec<OwnerRecord>) -> Self {
        self.owners.insert(fnr.into().key(), owners);
        self
    }

    pub fn with_owner_failure(mut self, fnr: impl Into<Fnr>) -> Self {
        self.failing_owner_fnrs.insert(fnr.into().key());
        self
    }

    pub fn with_owner_latency(mut self, latency: Duration) -> Self {
        self.owner_latency = Some(latency);
        self
    }

    pub fn with_spatial_failure(mut self) -> Self {
        self.spatial_failure = true;
        self
    }

    pub fn with_object_id_failure(mut self) -> Self {
        self.object_id_failure = true;
        self
    }

    pub fn with_related_failure(mut self) -> Self {
        self.related_failure = true;
        self
    }

    pub fn spatial_calls(&self) -> usize {
        self.spatial_calls.load(Ordering::SeqCst)
    }

    pub fn owner_calls(&self) -> usize {
        self.owner_calls.load(Ordering::SeqCst)
    }

    pub fn object_id_calls(&self) -> usize {
        self.object_id_calls.load(Ordering::SeqCst)
    }

    pub fn related_calls(&self) -> usize {
        self.related_calls.load(Ordering::SeqCst)
    }

    /// Highest number of owner queries observed in flight at once.
    pub fn max_owners_in_flight(&self) -> usize {
        self.max_owners_in_flight.load(Ordering::SeqCst)
    }

    async fn delay(latency: Option<Duration>, cancel: &CancellationToken) -> Result<(), QueryError> {
        let wait = async {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
        };
        cancel.run_until_cancelled(wait).await.ok_or(QueryError::Cancelled)
    }

    fn mock_failure(what: &str) -> QueryError {
        QueryError::Service {
            code: 500,
            message: format!("mock failure: {}", what),
        }
    }
}

#[async_trait]
impl SpatialQueryService for MockQueryService {
    async fn query_parcels_at_point(
        &self,
        _layer: &LayerHandle,
        point: &MapPoint,
        cancel: &CancellationToken,
    ) -> Result<Vec<ParcelFeature>, QueryError> {
        self.spatial_calls.fetch_add(1, Ordering::SeqCst);

        let response = self.points.iter().find(|p| p.x == point.x && p.y == point.y);
        Self::delay(response.and_then(|p| p.latency), cancel).await?;

        if self.spatial_failure {
            return Err(Self::mock_failure("spatial query"));
        }
        Ok(response
            .map(|p| p.parcels.clone())
            .unwrap_or_else(|| self.default_parcels.clone()))
    }
}

#[async_trait]
impl OwnerQueryService for MockQueryService {
    async fn query_owners(
        &self,
        _layer: &LayerHandle,
        fnr: &Fnr,
        cancel: &CancellationToken,
    ) -> Result<Vec<OwnerRecord>, QueryError> {
        self.owner_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.owners_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_owners_in_flight.fetch_max(now, Ordering::SeqCst);

        let waited = Self::delay(self.owner_latency, cancel).await;
        self.owners_in_flight.fetch_sub(1, Ordering::SeqCst);
        waited?;

        let key = fnr.key();
        if self.failing_owner_fnrs.contains(&key) {
            return Err(Self::mock_failure("owner query"));
        }
        Ok(self.owners.get(&key).cloned().unwrap_or_default())
    }

    async fn query_object_ids(
        &self,
        _layer: &LayerHandle,
        fnrs: &[Fnr],
        cancel: &CancellationToken,
    ) -> Result<Vec<(Fnr, i64)>, QueryError> {
        self.object_id_calls.fetch_add(1, Ordering::SeqCst);
        Self::delay(None, cancel).await?;

        if self.object_id_failure {
            return Err(Self::mock_failure("object id query"));
        }
        Ok(fnrs
            .iter()
            .filter_map(|fnr| self.object_ids.get(&fnr.key()).map(|id| (fnr.clone(), *id)))
            .collect())
    }

    async fn query_related_owners(
        &self,
        _layer: &LayerHandle,
        _relationship_id: u32,
        object_ids: &[i64],
        cancel: &CancellationToken,
    ) -> Result<HashMap<i64, Vec<OwnerRecord>>, QueryError> {
        self.related_calls.fetch_add(1, Ordering::SeqCst);
        Self::delay(None, cancel).await?;

        if self.related_failure {
            return Err(Self::mock_failure("relationship query"));
        }
        let wanted: HashSet<i64> = object_ids.iter().copied().collect();
        Ok(self
            .object_ids
            .iter()
            .filter(|(_, id)| wanted.contains(id))
            .filter_map(|(fnr, id)| self.owners.get(fnr).map(|owners| (*id, owners.clone())))
            .collect())
    }
}
