//! Selection rows and the caller-owned selection state

use super::fnr::Fnr;
use super::geometry::{Geometry, GeometryType};
use super::owner::OwnerRecord;
use super::parcel::ParcelFeature;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a row's owner text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    /// Row carries a resolved owner
    Owner,
    /// Owner query succeeded but returned nothing for the parcel
    NoOwners,
    /// Owner query for the parcel failed
    QueryFailed,
}

/// One displayed row: a parcel paired with one of its owners.
///
/// `id` is `"{fnr}_{objectId}"` and never changes once the row exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRow {
    pub id: String,
    pub fnr: Fnr,
    pub uuid: Option<String>,
    pub label: String,
    pub owner_text: String,
    pub status: RowStatus,
    pub geometry_type: Option<GeometryType>,
    pub geometry: Option<Geometry>,
    pub raw_owner: Option<OwnerRecord>,
}

impl SelectionRow {
    pub fn row_id(fnr: &Fnr, object_id: i64) -> String {
        format!("{}_{}", fnr.key(), object_id)
    }

    /// Row for the `ordinal`-th resolved owner of `parcel`.
    ///
    /// Owners without an object id get `"{fnr}_{parcelObjectId}-{ordinal}"`.
    pub fn for_owner(parcel: &ParcelFeature, owner: OwnerRecord, ordinal: usize, owner_text: String) -> Self {
        let id = match owner.object_id {
            Some(object_id) => Self::row_id(&parcel.fnr, object_id),
            None => format!("{}-{}", Self::row_id(&parcel.fnr, parcel.object_id), ordinal),
        };
        Self {
            id,
            fnr: parcel.fnr.clone(),
            uuid: parcel.uuid.clone(),
            label: parcel.label.clone(),
            owner_text,
            status: RowStatus::Owner,
            geometry_type: parcel.geometry_type,
            geometry: parcel.geometry.clone(),
            raw_owner: Some(owner),
        }
    }

    /// Stand-in row for a parcel without resolvable owners.
    pub fn placeholder(parcel: &ParcelFeature, status: RowStatus, text: String) -> Self {
        Self {
            id: Self::row_id(&parcel.fnr, parcel.object_id),
            fnr: parcel.fnr.clone(),
            uuid: parcel.uuid.clone(),
            label: parcel.label.clone(),
            owner_text: text,
            status,
            geometry_type: parcel.geometry_type,
            geometry: parcel.geometry.clone(),
            raw_owner: None,
        }
    }

    pub fn fnr_key(&self) -> String {
        self.fnr.key()
    }

    pub fn is_placeholder(&self) -> bool {
        self.status != RowStatus::Owner
    }
}

/// Read access to a selection, whatever container the caller keeps it in.
pub trait SelectionSource {
    fn get(&self, id: &str) -> Option<&SelectionRow>;
    fn rows(&self) -> &[SelectionRow];
}

impl SelectionSource for [SelectionRow] {
    fn get(&self, id: &str) -> Option<&SelectionRow> {
        self.iter().find(|r| r.id == id)
    }

    fn rows(&self) -> &[SelectionRow] {
        self
    }
}

impl SelectionSource for Vec<SelectionRow> {
    fn get(&self, id: &str) -> Option<&SelectionRow> {
        SelectionSource::get(self.as_slice(), id)
    }

    fn rows(&self) -> &[SelectionRow] {
        self
    }
}

/// Ordered selection with unique row ids.
///
/// The caller owns it; the pipeline only ever computes the next state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState {
    rows: Vec<SelectionRow>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from rows, keeping the first row for each id.
    pub fn from_rows(rows: impl IntoIterator<Item = SelectionRow>) -> Self {
        let mut seen = HashSet::new();
        Self {
            rows: rows.into_iter().filter(|r| seen.insert(r.id.clone())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectionRow> {
        self.rows.iter()
    }

    /// Remove every row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Normalized fnr keys present in the selection.
    pub fn fnr_keys(&self) -> HashSet<String> {
        self.rows.iter().map(SelectionRow::fnr_key).collect()
    }

    pub fn into_rows(self) -> Vec<SelectionRow> {
        self.rows
    }
}

impl SelectionSource for SelectionState {
    fn get(&self, id: &str) -> Option<&SelectionRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    fn rows(&self) -> &[SelectionRow] {
        &self.rows
    }
}
