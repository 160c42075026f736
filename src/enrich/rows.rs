//! Row accumulation under the result cap

use crate::model::{FnrGeometry, ParcelFeature, SelectionRow};

/// Rows produced by enrichment plus the geometries they cover.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub rows: Vec<SelectionRow>,
    pub fnr_geometries: Vec<FnrGeometry>,
}

/// Collects parcel rows in order until `limit` rows are held.
#[derive(Debug)]
pub(crate) struct RowCollector {
    enrichment: Enrichment,
    limit: usize,
}

impl RowCollector {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            enrichment: Enrichment::default(),
            limit,
        }
    }

    /// Append `rows` for `parcel`, dropping whatever exceeds the limit.
    pub(crate) fn push(&mut self, parcel: &ParcelFeature, rows: Vec<SelectionRow>) {
        let room = self.limit.saturating_sub(self.enrichment.rows.len());
        if room == 0 || rows.is_empty() {
            return;
        }
        self.enrichment.rows.extend(rows.into_iter().take(room));
        self.enrichment.fnr_geometries.push(FnrGeometry {
            fnr: parcel.fnr.clone(),
            geometry: parcel.geometry.clone(),
        });
    }

    pub(crate) fn is_full(&self) -> bool {
        self.enrichment.rows.len() >= self.limit
    }

    pub(crate) fn len(&self) -> usize {
        self.enrichment.rows.len()
    }

    pub(crate) fn finish(self) -> Enrichment {
        self.enrichment
    }
}
