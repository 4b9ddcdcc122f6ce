use std::time::Duration;

use ais_poller::{
    poller::{CycleOutcome, CycleReport, CycleState},
    settings::BoundingBoxSettings,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use vessel_core::Delta;

use crate::helper::{SELF_CONTEXT, SELF_MMSI, TILES, test, vessel_context, vessel_row};

fn vessel_deltas(deltas: &[Delta]) -> Vec<&Delta> {
    deltas.iter().filter(|d| !d.is_bounding_box()).collect()
}

#[tokio::test]
async fn test_cycle_emits_other_vessels_and_bounding_box() {
    test(|helper| async move {
        helper.mock_tile(TILES[0], vec![vessel_row("S1")]).await;
        helper.mock_tile(TILES[1], vec![vessel_row("S2")]).await;
        helper.mock_ship_detail("S1", 123456789, 1).await;
        helper.mock_ship_detail("S2", SELF_MMSI, 1).await;

        let poller = helper.poller().await;
        let outcome = poller.run_cycle(&CancellationToken::new()).await.unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Completed(CycleReport {
                tiles: 4,
                failed_tiles: 0,
                emitted: 1,
            })
        );

        let deltas = helper.drain();
        assert_eq!(deltas.len(), 2);

        let bbox = deltas.iter().find(|d| d.is_bounding_box()).unwrap();
        assert_eq!(bbox.context, SELF_CONTEXT);
        assert!(bbox.timestamp().is_none());

        let vessels = vessel_deltas(&deltas);
        assert_eq!(vessels.len(), 1);
        assert_eq!(vessels[0].context, vessel_context(123456789));
        assert_eq!(
            vessels[0].value("navigation.destination.commonName"),
            Some(&json!("BERGEN"))
        );
        assert_eq!(poller.state(), CycleState::Idle);
    })
    .await;
}

#[tokio::test]
async fn test_every_tile_is_fetched_once_per_cycle() {
    test(|helper| async move {
        let poller = helper.poller().await;
        poller.run_cycle(&CancellationToken::new()).await.unwrap();

        assert_eq!(helper.tile_requests().await, TILES.len());
        assert_eq!(helper.drain().len(), 1);
    })
    .await;
}

#[tokio::test]
async fn test_failed_tile_does_not_abort_cycle() {
    test(|helper| async move {
        helper.mock_tile_status(TILES[0], 500).await;
        helper.mock_tile(TILES[3], vec![vessel_row("S1")]).await;
        helper.mock_ship_detail("S1", 123456789, 1).await;

        let poller = helper.poller().await;
        let outcome = poller.run_cycle(&CancellationToken::new()).await.unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Completed(CycleReport {
                tiles: 4,
                failed_tiles: 1,
                emitted: 1,
            })
        );
        assert_eq!(vessel_deltas(&helper.drain()).len(), 1);
    })
    .await;
}

#[tokio::test]
async fn test_vessel_without_ship_details_is_dropped() {
    test(|helper| async move {
        helper
            .mock_tile(TILES[0], vec![vessel_row("S1"), vessel_row("S3")])
            .await;
        helper.mock_ship_detail("S1", 123456789, 1).await;
        helper.mock_ship_detail_status("S3", 404).await;

        let poller = helper.poller().await;
        poller.run_cycle(&CancellationToken::new()).await.unwrap();

        let deltas = helper.drain();
        let vessels = vessel_deltas(&deltas);
        assert_eq!(vessels.len(), 1);
        assert_eq!(vessels[0].context, vessel_context(123456789));
    })
    .await;
}

#[tokio::test]
async fn test_malformed_rows_are_skipped() {
    test(|helper| async move {
        helper
            .mock_tile(TILES[0], vec![json!({ "SHIPNAME": "NO ID" }), vessel_row("S1")])
            .await;
        helper.mock_ship_detail("S1", 123456789, 1).await;

        let poller = helper.poller().await;
        poller.run_cycle(&CancellationToken::new()).await.unwrap();

        assert_eq!(vessel_deltas(&helper.drain()).len(), 1);
    })
    .await;
}

#[tokio::test]
async fn test_ship_details_are_cached_between_cycles() {
    test(|helper| async move {
        helper.mock_tile(TILES[0], vec![vessel_row("S1")]).await;
        helper.mock_ship_detail("S1", 123456789, 1).await;

        let poller = helper.poller().await;
        for _ in 0..2 {
            poller.run_cycle(&CancellationToken::new()).await.unwrap();
        }

        assert_eq!(vessel_deltas(&helper.drain()).len(), 2);
    })
    .await;
}

#[tokio::test]
async fn test_same_vessel_in_two_tiles_fetches_details_once() {
    test(|helper| async move {
        helper.mock_tile(TILES[0], vec![vessel_row("S1")]).await;
        helper.mock_tile(TILES[2], vec![vessel_row("S1")]).await;
        helper.mock_ship_detail("S1", 123456789, 1).await;

        let poller = helper.poller().await;
        poller.run_cycle(&CancellationToken::new()).await.unwrap();

        assert_eq!(vessel_deltas(&helper.drain()).len(), 2);
    })
    .await;
}

#[tokio::test]
async fn test_missing_self_position_skips_cycle() {
    test(|helper| async move {
        let poller = helper
            .poller_with(helper.signal_k_position(), BoundingBoxSettings::default())
            .await;

        let outcome = poller.run_cycle(&CancellationToken::new()).await.unwrap();

        assert_eq!(outcome, CycleOutcome::NoPosition);
        assert!(helper.drain().is_empty());
        assert_eq!(helper.tile_requests().await, 0);
    })
    .await;
}

#[tokio::test]
async fn test_disabled_bounding_box_search_fetches_nothing() {
    test(|helper| async move {
        let bounding_box = BoundingBoxSettings {
            enabled: false,
            ..Default::default()
        };
        let poller = helper
            .poller_with(helper.fixed_position(), bounding_box)
            .await;

        let outcome = poller.run_cycle(&CancellationToken::new()).await.unwrap();

        assert_eq!(outcome, CycleOutcome::Disabled);
        assert!(helper.drain().is_empty());
        assert_eq!(helper.tile_requests().await, 0);
    })
    .await;
}

#[tokio::test]
async fn test_cancelled_cycle_emits_nothing() {
    test(|helper| async move {
        helper.mock_tile(TILES[0], vec![vessel_row("S1")]).await;

        let poller = helper.poller().await;
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let outcome = poller.run_cycle(&cancellation).await.unwrap();

        assert_eq!(outcome, CycleOutcome::Cancelled);
        assert!(helper.drain().is_empty());
        assert!(helper.receiver.is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_tile_arriving_after_cancellation_is_discarded() {
    test(|helper| async move {
        helper
            .mock_slow_tile(TILES[0], vec![vessel_row("S1")], Duration::from_millis(500))
            .await;
        helper.mock_ship_detail("S1", 123456789, 0).await;

        let poller = helper.poller().await;
        let cancellation = CancellationToken::new();

        let cycle = tokio::spawn({
            let poller = poller.clone();
            let cancellation = cancellation.clone();
            async move { poller.run_cycle(&cancellation).await }
        });

        // The bounding box is emitted right before the tile fetches start.
        let bbox = tokio::time::timeout(Duration::from_secs(5), helper.receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(bbox.is_bounding_box());

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancellation.cancel();

        let outcome = cycle.await.unwrap().unwrap();
        assert_eq!(outcome, CycleOutcome::Cancelled);
        assert_eq!(poller.state(), CycleState::Idle);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(helper.drain().is_empty());
    })
    .await;
}
