//! Spatial property query: which parcels lie under a map point

use super::traits::{LayerHandle, QueryError, SpatialQueryService};
use crate::lifecycle::CancellationToken;
use crate::model::{MapPoint, ParcelFeature};

/// Resolve the parcels intersecting `point` on `layer`.
///
/// Rejects with `QueryError::Cancelled` if `cancel` fires before or during
/// the query. Parcels with a blank fnr cannot be joined to owners and are
/// left out. Geometry is kept exactly as returned.
pub async fn query_parcels_at_point(
    service: &dyn SpatialQueryService,
    layer: &LayerHandle,
    point: &MapPoint,
    cancel: &CancellationToken,
) -> Result<Vec<ParcelFeature>, QueryError> {
    let parcels = cancel
        .run_until_cancelled(service.query_parcels_at_point(layer, point, cancel))
        .await
        .ok_or(QueryError::Cancelled)??;

    let total = parcels.len();
    let parcels: Vec<ParcelFeature> = parcels.into_iter().filter(|p| !p.fnr.is_blank()).collect();
    if parcels.len() < total {
        tracing::debug!(
            dropped = total - parcels.len(),
            layer = %layer.data_source_id,
            "Ignoring parcels without fnr"
        );
    }

    tracing::debug!(count = parcels.len(), x = point.x, y = point.y, "Parcels at point");
    Ok(parcels)
}
