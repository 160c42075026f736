//! Parcels and map points

use super::fnr::Fnr;
use super::geometry::{Geometry, GeometryType};
use serde::{Deserialize, Serialize};

/// A clicked map location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
    /// Spatial reference of the coordinates; the configured default applies when absent
    #[serde(default)]
    pub wkid: Option<u32>,
}

impl MapPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, wkid: None }
    }

    pub fn with_wkid(mut self, wkid: u32) -> Self {
        self.wkid = Some(wkid);
        self
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One parcel intersected by a point query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelFeature {
    pub fnr: Fnr,
    pub uuid: Option<String>,
    pub label: String,
    pub object_id: i64,
    pub geometry: Option<Geometry>,
    pub geometry_type: Option<GeometryType>,
}

impl ParcelFeature {
    pub fn new(fnr: impl Into<Fnr>, object_id: i64, label: impl Into<String>) -> Self {
        Self {
            fnr: fnr.into(),
            uuid: None,
            label: label.into(),
            object_id,
            geometry: None,
            geometry_type: None,
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Attach a geometry; the geometry type follows it.
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry_type = Some(geometry.geometry_type());
        self.geometry = Some(geometry);
        self
    }
}
