//! Query service traits: the contract transports implement
//!
//! The pipeline never talks HTTP directly. It calls these traits, so the
//! same orchestration runs against a live ArcGIS service or a mock.

use crate::lifecycle::CancellationToken;
use crate::model::{Fnr, MapPoint, OwnerRecord, ParcelFeature};
use crate::validate::LayerUrl;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from query services.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("service error {code}: {message}")]
    Service { code: i64, message: String },

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("query cancelled")]
    Cancelled,
}

impl QueryError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A validated layer, resolved from a configured data source id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerHandle {
    pub data_source_id: String,
    pub url: LayerUrl,
}

/// Point-in, features-out spatial query.
#[async_trait]
pub trait SpatialQueryService: Send + Sync {
    /// Parcels whose geometry intersects `point`, with full geometry.
    async fn query_parcels_at_point(
        &self,
        layer: &LayerHandle,
        point: &MapPoint,
        cancel: &CancellationToken,
    ) -> Result<Vec<ParcelFeature>, QueryError>;
}

/// Attribute and relationship queries against the owner data.
#[async_trait]
pub trait OwnerQueryService: Send + Sync {
    /// Owners recorded for one parcel.
    async fn query_owners(
        &self,
        layer: &LayerHandle,
        fnr: &Fnr,
        cancel: &CancellationToken,
    ) -> Result<Vec<OwnerRecord>, QueryError>;

    /// Resolve fnrs to object ids on `layer` (`fnr IN (...)`).
    async fn query_object_ids(
        &self,
        layer: &LayerHandle,
        fnrs: &[Fnr],
        cancel: &CancellationToken,
    ) -> Result<Vec<(Fnr, i64)>, QueryError>;

    /// Related owner records for many object ids in one round trip.
    async fn query_related_owners(
        &self,
        layer: &LayerHandle,
        relationship_id: u32,
        object_ids: &[i64],
        cancel: &CancellationToken,
    ) -> Result<HashMap<i64, Vec<OwnerRecord>>, QueryError>;
}
