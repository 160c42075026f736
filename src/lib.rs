//! Parcel owners: point-click property selection with owner enrichment
//!
//! A click on a map resolves to the parcels under the point, each parcel is
//! enriched with its owner records, and the resulting rows are merged into
//! the caller's selection.
//!
//! # Core Concepts
//!
//! - **Parcels**: land property units keyed by `fnr`
//! - **Rows**: one per parcel owner, or a placeholder when owners are unknown
//! - **Toggle**: clicking an already selected parcel removes it
//! - **Requests**: a newer click supersedes an older one, whose result is dropped
//!
//! # Example
//!
//! ```
//! use parcel_owners::{reconcile, SelectionState};
//!
//! let result = reconcile(Vec::new(), &SelectionState::new(), true, 100);
//! assert!(result.updated_rows.is_empty());
//! ```

pub mod enrich;
pub mod lifecycle;
pub mod model;
pub mod owner;
pub mod pipeline;
pub mod selection;
pub mod service;
pub mod validate;

pub use enrich::{EnrichStrategy, Enrichment, OWNER_QUERY_CONCURRENCY};
pub use lifecycle::{CancellationToken, Interrupted, RequestToken, RequestTracker};
pub use model::{
    Fnr, FnrGeometry, Geometry, GeometryType, MapPoint, OwnerRecord, ParcelFeature, PipelineResult, RowStatus,
    SelectionRow, SelectionSource, SelectionState, SelectionUpdate,
};
pub use owner::{dedupe, format_owner_info, identity_key, IdentityContext};
pub use pipeline::{ConfigError, Messages, PipelineConfig, PipelineError, SelectionPipeline, Translate};
pub use selection::{reconcile, Reconciliation};
pub use service::{ArcGisClient, MockQueryService, OwnerQueryService, QueryError, SpatialQueryService};
pub use validate::{check_layer_url, validate, ValidationError, ValidationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
