//! ArcGIS REST transport
//!
//! Implements both query traits against `/query` and
//! `/queryRelatedRecords` endpoints. Every request races the caller's
//! cancellation token and rejects with `QueryError::Cancelled` once it fires.

use super::fields::FieldMapping;
use super::parse::{
    attr_fnr, attr_i64, decode, owner_from_attributes, parcel_from_feature, FeatureSet,
    RelatedRecordsResponse,
};
use super::traits::{LayerHandle, OwnerQueryService, QueryError, SpatialQueryService};
use crate::lifecycle::CancellationToken;
use crate::model::{Fnr, GeometryType, MapPoint, OwnerRecord, ParcelFeature};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const USER_AGENT: &str = concat!("parcel-owners/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client for ArcGIS feature and map services.
pub struct ArcGisClient {
    http: reqwest::Client,
    fields: FieldMapping,
    default_wkid: u32,
}

impl ArcGisClient {
    pub fn new(fields: FieldMapping, default_wkid: u32) -> Result<Self, QueryError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            fields,
            default_wkid,
        })
    }

    async fn get_json(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<Value, QueryError> {
        tracing::debug!(endpoint = %endpoint, "Querying layer");

        let request = self.http.get(endpoint).query(params).send();
        let response = cancel
            .run_until_cancelled(request)
            .await
            .ok_or(QueryError::Cancelled)?
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::Service {
                code: i64::from(status.as_u16()),
                message: status.canonical_reason().unwrap_or("HTTP error").to_string(),
            });
        }

        cancel
            .run_until_cancelled(response.json::<Value>())
            .await
            .ok_or(QueryError::Cancelled)?
            .map_err(|e| QueryError::Parse(e.to_string()))
    }

    fn query_endpoint(layer: &LayerHandle) -> String {
        format!("{}/query", layer.url.base())
    }

    fn in_clause(field: &str, fnrs: &[Fnr]) -> String {
        let literals: Vec<String> = fnrs.iter().map(Fnr::sql_literal).collect();
        format!("{} IN ({})", field, literals.join(","))
    }
}

#[async_trait]
impl SpatialQueryService for ArcGisClient {
    async fn query_parcels_at_point(
        &self,
        layer: &LayerHandle,
        point: &MapPoint,
        cancel: &CancellationToken,
    ) -> Result<Vec<ParcelFeature>, QueryError> {
        let wkid = point.wkid.unwrap_or(self.default_wkid);
        let geometry = json!({
            "x": point.x,
            "y": point.y,
            "spatialReference": {"wkid": wkid}
        });
        let params = [
            ("f", "json".to_string()),
            ("geometry", geometry.to_string()),
            ("geometryType", "esriGeometryPoint".to_string()),
            ("spatialRel", "esriSpatialRelIntersects".to_string()),
            ("inSR", wkid.to_string()),
            ("outSR", wkid.to_string()),
            ("outFields", "*".to_string()),
            ("returnGeometry", "true".to_string()),
        ];

        let body = self.get_json(&Self::query_endpoint(layer), &params, cancel).await?;
        let set: FeatureSet = decode(body)?;
        let geometry_type = set.geometry_type.as_deref().and_then(GeometryType::from_esri_name);

        Ok(set
            .features
            .iter()
            .filter_map(|f| parcel_from_feature(f, geometry_type, &self.fields.property))
            .collect())
    }
}

#[async_trait]
impl OwnerQueryService for ArcGisClient {
    async fn query_owners(
        &self,
        layer: &LayerHandle,
        fnr: &Fnr,
        cancel: &CancellationToken,
    ) -> Result<Vec<OwnerRecord>, QueryError> {
        let params = [
            ("f", "json".to_string()),
            ("where", format!("{} = {}", self.fields.owner.fnr, fnr.sql_literal())),
            ("outFields", "*".to_string()),
            ("returnGeometry", "false".to_string()),
        ];

        let body = self.get_json(&Self::query_endpoint(layer), &params, cancel).await?;
        let set: FeatureSet = decode(body)?;
        Ok(set
            .features
            .iter()
            .map(|f| owner_from_attributes(&f.attributes, &self.fields.owner))
            .collect())
    }

    async fn query_object_ids(
        &self,
        layer: &LayerHandle,
        fnrs: &[Fnr],
        cancel: &CancellationToken,
    ) -> Result<Vec<(Fnr, i64)>, QueryError> {
        if fnrs.is_empty() {
            return Ok(Vec::new());
        }
        let fields = &self.fields.property;
        let params = [
            ("f", "json".to_string()),
            ("where", Self::in_clause(&fields.fnr, fnrs)),
            ("outFields", format!("{},{}", fields.object_id, fields.fnr)),
            ("returnGeometry", "false".to_string()),
        ];

        let body = self.get_json(&Self::query_endpoint(layer), &params, cancel).await?;
        let set: FeatureSet = decode(body)?;
        Ok(set
            .features
            .iter()
            .filter_map(|f| {
                let fnr = attr_fnr(&f.attributes, &fields.fnr)?;
                let object_id = attr_i64(&f.attributes, &fields.object_id)?;
                Some((fnr, object_id))
            })
            .collect())
    }

    async fn query_related_owners(
        &self,
        layer: &LayerHandle,
        relationship_id: u32,
        object_ids: &[i64],
        cancel: &CancellationToken,
    ) -> Result<HashMap<i64, Vec<OwnerRecord>>, QueryError> {
        if object_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<String> = object_ids.iter().map(i64::to_string).collect();
        let params = [
            ("f", "json".to_string()),
            ("objectIds", ids.join(",")),
            ("relationshipId", relationship_id.to_string()),
            ("outFields", "*".to_string()),
            ("returnGeometry", "false".to_string()),
        ];
        let endpoint = format!("{}/queryRelatedRecords", layer.url.base());

        let body = self.get_json(&endpoint, &params, cancel).await?;
        let response: RelatedRecordsResponse = decode(body)?;
        Ok(response
            .related_record_groups
            .into_iter()
            .map(|group| {
                let owners = group
                    .related_records
                    .iter()
                    .map(|f| owner_from_attributes(&f.attributes, &self.fields.owner))
                    .collect();
                (group.object_id, owners)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::check_layer_url;

    #[test]
    fn in_clause_quotes_text_fnrs() {
        let clause = ArcGisClient::in_clause("FNR", &[Fnr::from("a'b"), Fnr::from(7)]);
        assert_eq!(clause, "FNR IN ('a''b',7)");
    }

    #[test]
    fn query_endpoint_is_built_from_layer_base() {
        let layer = LayerHandle {
            data_source_id: "owners".into(),
            url: check_layer_url(
                "https://maps.example.se/arcgis/rest/services/Agare/FeatureServer/3/query",
                &[],
            )
            .unwrap(),
        };
        assert_eq!(
            ArcGisClient::query_endpoint(&layer),
            "https://maps.example.se/arcgis/rest/services/Agare/FeatureServer/3/query"
        );
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_requests() {
        let client = ArcGisClient::new(FieldMapping::default(), 3006).unwrap();
        let layer = LayerHandle {
            data_source_id: "parcels".into(),
            url: check_layer_url(
                "https://maps.example.se/arcgis/rest/services/Fastighet/MapServer/0",
                &[],
            )
            .unwrap(),
        };
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client
            .query_parcels_at_point(&layer, &MapPoint::new(1.0, 2.0), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, QueryError::Cancelled);
    }
}
