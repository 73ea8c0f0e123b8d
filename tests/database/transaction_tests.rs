use season_elo_processor::{
    database::{
        db_structs::{CalculationMetadata, RatingSnapshot},
        store::RecordStore
    },
    model::season_model::SeasonProcessor
};
use serial_test::serial;
use std::{collections::HashSet, sync::Arc, time::Duration};
use uuid::Uuid;

use super::test_helpers::TestDatabase;
use crate::common::init_test_env;

#[tokio::test]
#[serial]
async fn test_failed_replace_keeps_previous_snapshots() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let seed = test_db.seed_test_data().await.expect("Failed to seed test data");
    let client = Arc::new(test_db.connect().await);
    let processor = SeasonProcessor::new(Arc::clone(&client));

    processor.recalculate_season_elo(seed.season).await.unwrap();
    let before = client.season_snapshots(seed.season).await.unwrap();

    // Duplicate sequence violates the unique constraint halfway through the insert
    let duplicate = |player| RatingSnapshot {
        id: Uuid::new_v4(),
        player_id: player,
        season_id: seed.season,
        sequence: 0,
        elo: 100,
        timestamp: before[0].timestamp,
        calculation_metadata: CalculationMetadata::SeasonStart
    };
    let result = client
        .replace_season_snapshots(seed.season, &[duplicate(seed.players[0]), duplicate(seed.players[1])])
        .await;

    assert!(result.is_err());
    assert_eq!(client.season_snapshots(seed.season).await.unwrap(), before);
}

#[tokio::test]
#[serial]
async fn test_recalculation_issues_new_ids() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let seed = test_db.seed_test_data().await.expect("Failed to seed test data");
    let client = Arc::new(test_db.connect().await);
    let processor = SeasonProcessor::new(Arc::clone(&client));

    processor.recalculate_season_elo(seed.season).await.unwrap();
    let first = client.season_snapshots(seed.season).await.unwrap();
    processor.recalculate_season_elo(seed.season).await.unwrap();
    let second = client.season_snapshots(seed.season).await.unwrap();

    let first_ids: HashSet<Uuid> = first.iter().map(|s| s.id).collect();
    assert!(second.iter().all(|s| !first_ids.contains(&s.id)));

    let values = |set: &[RatingSnapshot]| -> Vec<(i32, i32)> { set.iter().map(|s| (s.sequence, s.elo)).collect() };
    assert_eq!(values(&first), values(&second));
}

#[tokio::test]
#[serial]
async fn test_readers_never_observe_partial_season() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let seed = test_db.seed_test_data().await.expect("Failed to seed test data");
    let client = Arc::new(test_db.connect().await);
    let processor = SeasonProcessor::new(Arc::clone(&client));

    let expected = processor
        .recalculate_season_elo(seed.season)
        .await
        .unwrap()
        .snapshots_written;

    let writer = {
        let processor = processor.clone();
        let season = seed.season;
        tokio::spawn(async move {
            for _ in 0..20 {
                processor.recalculate_season_elo(season).await.unwrap();
            }
        })
    };

    while !writer.is_finished() {
        let observed = client.season_snapshots(seed.season).await.unwrap();
        assert_eq!(observed.len(), expected);
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    writer.await.unwrap();
}
