//! Pipeline result types

use super::fnr::Fnr;
use super::geometry::Geometry;
use super::parcel::ParcelFeature;
use super::selection::{SelectionRow, SelectionState};
use serde::Serialize;
use std::collections::BTreeSet;

/// Parcel geometry to highlight, keyed by fnr.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FnrGeometry {
    pub fnr: Fnr,
    pub geometry: Option<Geometry>,
}

/// The next selection computed by one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionUpdate {
    /// Rows newly added by this run
    pub rows_to_process: Vec<SelectionRow>,
    /// Full selection after removals, additions, and the cap
    pub updated_rows: SelectionState,
    /// Normalized fnr keys removed by toggle
    pub to_remove: BTreeSet<String>,
    /// Parcels returned by the point query
    pub raw_query_results: Vec<ParcelFeature>,
    /// Geometries of the parcels represented in `rows_to_process`
    pub fnr_geometries: Vec<FnrGeometry>,
}

/// Outcome of a pipeline run that was neither cancelled nor superseded.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PipelineResult {
    /// The point hit no parcels
    Empty,
    Success(SelectionUpdate),
}

impl PipelineResult {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn update(&self) -> Option<&SelectionUpdate> {
        match self {
            Self::Empty => None,
            Self::Success(update) => Some(update),
        }
    }
}
