//! Core data model: parcels, owners, selection rows, and results

mod fnr;
mod geometry;
mod owner;
mod parcel;
mod result;
mod selection;

pub use fnr::Fnr;
pub use geometry::{Coordinate, Geometry, GeometryType};
pub use owner::OwnerRecord;
pub use parcel::{MapPoint, ParcelFeature};
pub use result::{FnrGeometry, PipelineResult, SelectionUpdate};
pub use selection::{RowStatus, SelectionRow, SelectionSource, SelectionState};
