//! Integration tests for the selection pipeline: toggling, staleness, degradation

#[cfg(test)]
mod tests {
    use crate::model::{MapPoint, OwnerRecord, ParcelFeature, PipelineResult, RowStatus, SelectionState};
    use crate::pipeline::{PipelineConfig, PipelineError, SelectionPipeline};
    use crate::service::MockQueryService;
    use crate::validate::ValidationError;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    const PARCELS_URL: &str = "https://maps.example.se/arcgis/rest/services/Fastighet/MapServer/0";
    const OWNERS_URL: &str = "https://maps.example.se/arcgis/rest/services/Agare/MapServer/1";

    fn config() -> PipelineConfig {
        PipelineConfig::new("parcels", PARCELS_URL, "owners", OWNERS_URL)
            .with_allowed_hosts(vec!["maps.example.se".into()])
            .with_max_results(5)
    }

    fn pipeline(mock: &Arc<MockQueryService>) -> SelectionPipeline {
        SelectionPipeline::new(mock.clone(), mock.clone())
    }

    fn anna_and_bo() -> MockQueryService {
        MockQueryService::new()
            .with_parcels(vec![ParcelFeature::new(100, 1, "Berga 1:1")])
            .with_owners(
                100,
                vec![
                    OwnerRecord::new(11).with_name("Anna Svensson"),
                    OwnerRecord::new(12).with_name("Bo Berg"),
                ],
            )
    }

    fn click() -> Option<MapPoint> {
        Some(MapPoint::new(153_000.0, 6_580_000.0))
    }

    fn success(result: PipelineResult) -> crate::model::SelectionUpdate {
        match result {
            PipelineResult::Success(update) => update,
            PipelineResult::Empty => panic!("expected a success result"),
        }
    }

    // ================================================================
    // Enrichment Scenarios
    // ================================================================

    // === Scenario: Two owners on one parcel become two masked rows ===
    #[tokio::test]
    async fn two_owners_become_two_masked_rows() {
        let mock = Arc::new(anna_and_bo());
        let pipeline = pipeline(&mock);

        let update = success(pipeline.select(click(), &config(), &SelectionState::new()).await.unwrap());

        let texts: Vec<&str> = update.rows_to_process.iter().map(|r| r.owner_text.as_str()).collect();
        assert_eq!(texts, vec!["A*** S*******", "B* B***"]);
        assert_eq!(update.updated_rows.len(), 2);
        assert!(update.to_remove.is_empty());
        assert_eq!(update.raw_query_results.len(), 1);
        assert_eq!(update.fnr_geometries.len(), 1);
    }

    // === Scenario: Masking off shows names as recorded ===
    #[tokio::test]
    async fn masking_can_be_disabled() {
        let mock = Arc::new(anna_and_bo());
        let pipeline = pipeline(&mock);
        let config = config().with_pii_masking(false);

        let update = success(pipeline.select(click(), &config, &SelectionState::new()).await.unwrap());

        assert_eq!(update.rows_to_process[0].owner_text, "Anna Svensson");
    }

    // === Scenario: One failing owner query does not sink the others ===
    #[tokio::test]
    async fn failed_owner_query_degrades_to_placeholder() {
        let mock = Arc::new(
            MockQueryService::new()
                .with_parcels(vec![
                    ParcelFeature::new(100, 1, "Berga 1:1"),
                    ParcelFeature::new(200, 2, "Berga 1:2"),
                ])
                .with_owners(100, vec![OwnerRecord::new(11).with_name("Bo Berg")])
                .with_owner_failure(200),
        );
        let pipeline = pipeline(&mock);

        let update = success(pipeline.select(click(), &config(), &SelectionState::new()).await.unwrap());

        let statuses: Vec<RowStatus> = update.rows_to_process.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![RowStatus::Owner, RowStatus::QueryFailed]);
    }

    // === Scenario: Batch strategy with a failing relationship query ===
    #[tokio::test]
    async fn batch_relationship_failure_yields_placeholders() {
        let mock = Arc::new(
            MockQueryService::new()
                .with_parcels(vec![
                    ParcelFeature::new(100, 1, "Berga 1:1"),
                    ParcelFeature::new(200, 2, "Berga 1:2"),
                ])
                .with_related_failure(),
        );
        let pipeline = pipeline(&mock);
        let config = config().with_batch_owner_query(2);

        let update = success(pipeline.select(click(), &config, &SelectionState::new()).await.unwrap());

        assert_eq!(update.rows_to_process.len(), 2);
        assert!(update
            .rows_to_process
            .iter()
            .all(|r| r.status == RowStatus::QueryFailed && r.owner_text == "Owner query failed"));
        assert_eq!(mock.related_calls(), 1);
        assert_eq!(mock.owner_calls(), 0);
    }

    // === Scenario: No parcels under the click ===
    #[tokio::test]
    async fn empty_point_is_empty_result() {
        let mock = Arc::new(MockQueryService::new());
        let pipeline = pipeline(&mock);

        let result = pipeline.select(click(), &config(), &SelectionState::new()).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(mock.owner_calls(), 0);
    }

    // ================================================================
    // Toggle Scenarios
    // ================================================================

    // === Scenario: Clicking a selected parcel removes it ===
    #[tokio::test]
    async fn click_on_selected_parcel_removes_it() {
        let mock = Arc::new(anna_and_bo());
        let pipeline = pipeline(&mock);
        let first = success(pipeline.select(click(), &config(), &SelectionState::new()).await.unwrap());
        let owner_calls = mock.owner_calls();

        let second = success(pipeline.select(click(), &config(), &first.updated_rows).await.unwrap());

        assert_eq!(second.to_remove, BTreeSet::from(["100".to_string()]));
        assert!(second.rows_to_process.is_empty());
        assert!(second.updated_rows.is_empty());
        assert_eq!(mock.owner_calls(), owner_calls);
    }

    // === Scenario: Without toggle, re-clicking adds nothing twice ===
    #[tokio::test]
    async fn reclick_without_toggle_is_idempotent() {
        let mock = Arc::new(anna_and_bo());
        let pipeline = pipeline(&mock);
        let config = config().with_toggle_removal(false);
        let first = success(pipeline.select(click(), &config, &SelectionState::new()).await.unwrap());

        let second = success(pipeline.select(click(), &config, &first.updated_rows).await.unwrap());

        assert!(second.to_remove.is_empty());
        assert!(second.rows_to_process.is_empty());
        assert_eq!(second.updated_rows, first.updated_rows);
    }

    // === Scenario: Cap holds across a sequence of clicks ===
    #[tokio::test]
    async fn cap_holds_across_clicks() {
        let mut mock = MockQueryService::new();
        for i in 1..=6_i64 {
            let x = i as f64;
            mock = mock
                .with_parcels_at(x, x, vec![ParcelFeature::new(i, i, format!("Berga 1:{}", i))])
                .with_owners(
                    i,
                    vec![
                        OwnerRecord::new(i * 10).with_name("Anna Svensson"),
                        OwnerRecord::new(i * 10 + 1).with_name("Bo Berg"),
                    ],
                );
        }
        let mock = Arc::new(mock);
        let pipeline = pipeline(&mock);
        let config = config().with_max_results(3);

        let mut state = SelectionState::new();
        for i in [1.0, 2.0, 3.0, 1.0, 4.0, 5.0, 6.0] {
            if let PipelineResult::Success(update) =
                pipeline.select(Some(MapPoint::new(i, i)), &config, &state).await.unwrap()
            {
                assert!(update.updated_rows.len() <= 3);
                state = update.updated_rows;
            }
        }
        assert!(state.len() <= 3);
    }

    // ================================================================
    // Validation Scenarios
    // ================================================================

    // === Scenario: Missing point is rejected before any query ===
    #[tokio::test]
    async fn missing_point_is_validation_error() {
        let mock = Arc::new(anna_and_bo());
        let pipeline = pipeline(&mock);

        let err = pipeline.select(None, &config(), &SelectionState::new()).await.unwrap_err();

        assert_eq!(err, PipelineError::Validation(ValidationError::MissingPoint));
        assert!(err.is_user_visible());
        assert_eq!(mock.spatial_calls(), 0);
    }

    // === Scenario: Data source on a host outside the allow-list ===
    #[tokio::test]
    async fn disallowed_host_is_validation_error() {
        let mock = Arc::new(anna_and_bo());
        let pipeline = pipeline(&mock);
        let config = config().with_data_source("owners", "https://evil.example.com/rest/services/A/MapServer/1");

        let err = pipeline.select(click(), &config, &SelectionState::new()).await.unwrap_err();

        assert!(matches!(err, PipelineError::Validation(ValidationError::HostNotAllowed(_))));
        assert_eq!(mock.spatial_calls(), 0);
    }

    // === Scenario: Unknown data source id ===
    #[tokio::test]
    async fn unknown_data_source_is_validation_error() {
        let mock = Arc::new(anna_and_bo());
        let pipeline = pipeline(&mock);
        let mut config = config();
        config.owner_data_source_id = "nope".into();

        let err = pipeline.select(click(), &config, &SelectionState::new()).await.unwrap_err();

        assert_eq!(
            err,
            PipelineError::Validation(ValidationError::MissingDataSource("nope".into()))
        );
    }

    // === Scenario: Failing parcel query surfaces one pipeline error ===
    #[tokio::test]
    async fn parcel_query_failure_is_query_error() {
        let mock = Arc::new(MockQueryService::new().with_spatial_failure());
        let pipeline = pipeline(&mock);

        let err = pipeline.select(click(), &config(), &SelectionState::new()).await.unwrap_err();

        assert!(matches!(err, PipelineError::Query(_)));
        assert!(err.is_user_visible());
    }

    // ================================================================
    // Lifecycle Scenarios
    // ================================================================

    // === Scenario: A newer click supersedes a slow one ===
    #[tokio::test]
    async fn superseded_request_is_dropped() {
        let mock = Arc::new(
            MockQueryService::new()
                .with_parcels_at(1.0, 1.0, vec![ParcelFeature::new(100, 1, "Berga 1:1")])
                .with_latency_at(1.0, 1.0, Duration::from_millis(500))
                .with_parcels_at(2.0, 2.0, vec![ParcelFeature::new(200, 2, "Berga 1:2")]),
        );
        let pipeline = pipeline(&mock);
        let config = config();
        let state = SelectionState::new();

        let r1 = pipeline.begin_request();
        let slow = pipeline.run_selection_pipeline(Some(MapPoint::new(1.0, 1.0)), &config, &state, r1);
        let fast = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            pipeline.select(Some(MapPoint::new(2.0, 2.0)), &config, &state).await
        };
        let (slow, fast) = tokio::join!(slow, fast);

        let err = slow.unwrap_err();
        assert!(err.is_stale());
        assert!(!err.is_user_visible());
        let update = success(fast.unwrap());
        assert_eq!(update.updated_rows.iter().next().unwrap().fnr_key(), "200");
    }

    // === Scenario: Explicit cancellation is not staleness ===
    #[tokio::test]
    async fn cancelled_request_reports_cancelled() {
        let mock = Arc::new(
            MockQueryService::new()
                .with_parcels_at(1.0, 1.0, vec![ParcelFeature::new(100, 1, "Berga 1:1")])
                .with_latency_at(1.0, 1.0, Duration::from_millis(500)),
        );
        let pipeline = pipeline(&mock);
        let config = config();
        let state = SelectionState::new();

        let token = pipeline.begin_request();
        let run = pipeline.run_selection_pipeline(Some(MapPoint::new(1.0, 1.0)), &config, &state, token);
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            pipeline.cancel_in_flight()
        };
        let (outcome, cancelled) = tokio::join!(run, cancel);

        assert!(cancelled);
        assert_eq!(outcome.unwrap_err(), PipelineError::Cancelled);
        assert_eq!(mock.owner_calls(), 0);
    }

    // === Scenario: Tokens return to the pool after each run ===
    #[tokio::test]
    async fn tokens_are_reused() {
        let mock = Arc::new(anna_and_bo());
        let pipeline = pipeline(&mock);

        pipeline.select(click(), &config(), &SelectionState::new()).await.unwrap();
        assert_eq!(pipeline.tracker().idle_tokens(), 1);
        pipeline.select(click(), &config(), &SelectionState::new()).await.unwrap();
        assert_eq!(pipeline.tracker().idle_tokens(), 1);
    }

    // === Scenario: Caches live with the pipeline and clear on demand ===
    #[tokio::test]
    async fn caches_clear_explicitly() {
        let mock = Arc::new(anna_and_bo());
        let pipeline = pipeline(&mock);

        pipeline.select(click(), &config(), &SelectionState::new()).await.unwrap();
        assert_eq!(pipeline.cached_layers(), 2);
        assert_eq!(pipeline.cached_formats(), 2);

        pipeline.clear_caches();
        assert_eq!(pipeline.cached_layers(), 0);
        assert_eq!(pipeline.cached_formats(), 0);
    }
}
