//! Transport-neutral geometry
//!
//! Service geometries are converted to plain coordinate arrays so the
//! result can be handed to export and rendering layers without any
//! SDK-specific object. Coordinates keep every ordinate the service
//! returned (z and m included); nothing is simplified.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One vertex: `[x, y]`, `[x, y, z]` or `[x, y, z, m]`.
pub type Coordinate = Vec<f64>;

/// Geometry kind as reported alongside a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryType {
    Point,
    Multipoint,
    Polyline,
    Polygon,
    Extent,
}

impl GeometryType {
    /// Parse an Esri geometry type name (`esriGeometryPolygon`, ...).
    pub fn from_esri_name(name: &str) -> Option<Self> {
        match name {
            "esriGeometryPoint" => Some(Self::Point),
            "esriGeometryMultipoint" => Some(Self::Multipoint),
            "esriGeometryPolyline" => Some(Self::Polyline),
            "esriGeometryPolygon" => Some(Self::Polygon),
            "esriGeometryEnvelope" => Some(Self::Extent),
            _ => None,
        }
    }
}

/// A geometry serialized to coordinate arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    Point { coordinate: Coordinate },
    Multipoint { points: Vec<Coordinate> },
    Polyline { paths: Vec<Vec<Coordinate>> },
    Polygon { rings: Vec<Vec<Coordinate>> },
    Extent { xmin: f64, ymin: f64, xmax: f64, ymax: f64 },
}

impl Geometry {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Self::Point { .. } => GeometryType::Point,
            Self::Multipoint { .. } => GeometryType::Multipoint,
            Self::Polyline { .. } => GeometryType::Polyline,
            Self::Polygon { .. } => GeometryType::Polygon,
            Self::Extent { .. } => GeometryType::Extent,
        }
    }

    /// Convert an Esri JSON geometry object.
    ///
    /// The shape is detected from its members (`rings`, `paths`, `points`,
    /// `x`/`y`, `xmin`...). Returns `None` for anything unrecognised.
    pub fn from_esri_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        if let Some(rings) = obj.get("rings") {
            return Some(Self::Polygon { rings: parse_parts(rings)? });
        }
        if let Some(paths) = obj.get("paths") {
            return Some(Self::Polyline { paths: parse_parts(paths)? });
        }
        if let Some(points) = obj.get("points") {
            return Some(Self::Multipoint { points: parse_coordinates(points)? });
        }
        if let (Some(x), Some(y)) = (obj.get("x"), obj.get("y")) {
            let mut coordinate = vec![x.as_f64()?, y.as_f64()?];
            for extra in ["z", "m"] {
                if let Some(v) = obj.get(extra).and_then(Value::as_f64) {
                    coordinate.push(v);
                }
            }
            return Some(Self::Point { coordinate });
        }
        if obj.contains_key("xmin") {
            let get = |k: &str| obj.get(k).and_then(Value::as_f64);
            return Some(Self::Extent {
                xmin: get("xmin")?,
                ymin: get("ymin")?,
                xmax: get("xmax")?,
                ymax: get("ymax")?,
            });
        }
        None
    }
}

fn parse_coordinate(value: &Value) -> Option<Coordinate> {
    let coordinate: Option<Coordinate> = value.as_array()?.iter().map(Value::as_f64).collect();
    coordinate.filter(|c| c.len() >= 2)
}

fn parse_coordinates(value: &Value) -> Option<Vec<Coordinate>> {
    value.as_array()?.iter().map(parse_coordinate).collect()
}

fn parse_parts(value: &Value) -> Option<Vec<Vec<Coordinate>>> {
    value.as_array()?.iter().map(parse_coordinates).collect()
}
