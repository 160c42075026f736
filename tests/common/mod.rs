//! Shared fixtures for selection scenario tests
//!
//! A small neighbourhood of parcels, each at its own click point, with
//! owners registered on a mock service.

#![allow(dead_code)]

use parcel_owners::{
    Geometry, MapPoint, MockQueryService, OwnerRecord, ParcelFeature, PipelineConfig, SelectionPipeline,
};
use std::sync::Arc;

pub const PARCELS_URL: &str = "https://karta.kommun.se/arcgis/rest/services/Fastighet/MapServer/0";
pub const OWNERS_URL: &str = "https://karta.kommun.se/arcgis/rest/services/Agare/FeatureServer/2";

pub fn config() -> PipelineConfig {
    PipelineConfig::new("parcels", PARCELS_URL, "owners", OWNERS_URL)
        .with_allowed_hosts(vec!["kommun.se".into()])
}

/// Click point for parcel `n`.
pub fn point(n: i64) -> MapPoint {
    MapPoint::new(150_000.0 + n as f64, 6_580_000.0)
}

pub fn parcel(n: i64) -> ParcelFeature {
    let x = 150_000.0 + n as f64;
    ParcelFeature::new(n, n, format!("Berga 1:{}", n)).with_geometry(Geometry::Polygon {
        rings: vec![vec![
            vec![x - 0.5, 6_579_999.5],
            vec![x + 0.5, 6_579_999.5],
            vec![x + 0.5, 6_580_000.5],
            vec![x - 0.5, 6_579_999.5],
        ]],
    })
}

/// Mock with parcels `1..=count`, each owned by `owners_each` distinct people.
pub fn neighbourhood(count: i64, owners_each: i64) -> MockQueryService {
    let names = ["Anna Svensson", "Bo Berg", "Cecilia Lind", "David Ek"];
    let mut mock = MockQueryService::new();
    for n in 1..=count {
        let p = point(n);
        let owners = (0..owners_each)
            .map(|i| {
                OwnerRecord::new(n * 100 + i)
                    .with_name(names[(i as usize) % names.len()])
                    .with_address(format!("Storgatan {}", n))
            })
            .collect();
        mock = mock.with_parcels_at(p.x, p.y, vec![parcel(n)]).with_owners(n, owners);
    }
    mock
}

pub fn pipeline(mock: &Arc<MockQueryService>) -> SelectionPipeline {
    SelectionPipeline::new(mock.clone(), mock.clone())
}
