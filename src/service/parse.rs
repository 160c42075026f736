//! Esri JSON wire types and conversion into the model

use super::fields::{OwnerFields, PropertyFields};
use super::traits::QueryError;
use crate::model::{Fnr, Geometry, GeometryType, OwnerRecord, ParcelFeature};
use serde::Deserialize;
use serde_json::{Map, Value};

/// `{"error": {"code": ..., "message": ...}}` body returned with HTTP 200.
#[derive(Debug, Deserialize)]
pub(crate) struct ServiceErrorBody {
    pub error: ServiceErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceErrorDetail {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FeatureSet {
    #[serde(default)]
    pub geometry_type: Option<String>,
    #[serde(default)]
    pub features: Vec<EsriFeature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EsriFeature {
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub geometry: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RelatedRecordsResponse {
    #[serde(default)]
    pub related_record_groups: Vec<RelatedRecordGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RelatedRecordGroup {
    pub object_id: i64,
    #[serde(default)]
    pub related_records: Vec<EsriFeature>,
}

/// Map a service error body to a `QueryError`, if the body is one.
pub(crate) fn service_error(body: &Value) -> Option<QueryError> {
    body.get("error")?;
    let parsed: ServiceErrorBody = serde_json::from_value(body.clone()).ok()?;
    Some(QueryError::Service {
        code: parsed.error.code,
        message: parsed.error.message,
    })
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, QueryError> {
    if let Some(err) = service_error(&body) {
        return Err(err);
    }
    serde_json::from_value(body).map_err(|e| QueryError::Parse(e.to_string()))
}

/// Attribute lookup; exact name first, then case-insensitive.
fn attr<'a>(attributes: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    attributes.get(field).or_else(|| {
        attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(field))
            .map(|(_, v)| v)
    })
}

fn attr_string(attributes: &Map<String, Value>, field: &str) -> Option<String> {
    match attr(attributes, field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn attr_i64(attributes: &Map<String, Value>, field: &str) -> Option<i64> {
    match attr(attributes, field)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn attr_fnr(attributes: &Map<String, Value>, field: &str) -> Option<Fnr> {
    attr(attributes, field).and_then(Fnr::from_json)
}

/// Convert one feature of a point query. Features without an fnr or
/// object id cannot be joined and yield `None`.
pub(crate) fn parcel_from_feature(
    feature: &EsriFeature,
    geometry_type: Option<GeometryType>,
    fields: &PropertyFields,
) -> Option<ParcelFeature> {
    let fnr = attr_fnr(&feature.attributes, &fields.fnr)?;
    let object_id = attr_i64(&feature.attributes, &fields.object_id)?;
    let label = attr_string(&feature.attributes, &fields.label).unwrap_or_else(|| fnr.key());
    let geometry = feature.geometry.as_ref().and_then(Geometry::from_esri_json);

    Some(ParcelFeature {
        fnr,
        uuid: attr_string(&feature.attributes, &fields.uuid),
        label,
        object_id,
        geometry_type: geometry.as_ref().map(Geometry::geometry_type).or(geometry_type),
        geometry,
    })
}

pub(crate) fn owner_from_attributes(attributes: &Map<String, Value>, fields: &OwnerFields) -> OwnerRecord {
    OwnerRecord {
        object_id: attr_i64(attributes, &fields.object_id),
        fnr: attr_fnr(attributes, &fields.fnr),
        uuid: attr_string(attributes, &fields.uuid),
        label: attr_string(attributes, &fields.label),
        name: attr_string(attributes, &fields.name),
        address: attr_string(attributes, &fields.address),
        postal_code: attr_string(attributes, &fields.postal_code),
        city: attr_string(attributes, &fields.city),
        share: attr_string(attributes, &fields.share),
        org_number: attr_string(attributes, &fields.org_number),
        owner_list_text: attr_string(attributes, &fields.owner_list),
    }
}
