//! Query services: spatial parcel lookup and owner attribute/relationship queries

mod arcgis;
mod fields;
mod mock;
mod parse;
mod spatial;
mod traits;

pub use arcgis::ArcGisClient;
pub use fields::{FieldMapping, OwnerFields, PropertyFields};
pub use mock::MockQueryService;
pub use spatial::query_parcels_at_point;
pub use traits::{LayerHandle, OwnerQueryService, QueryError, SpatialQueryService};
