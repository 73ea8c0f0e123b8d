use season_elo_processor::{
    database::{
        db_structs::{PlayerId, SeasonId},
        memory::{InMemoryStore, MatchPatch},
        store::RecordStore
    },
    error::ProcessorError,
    model::season_model::SeasonProcessor,
    queries::SnapshotQueries,
    utils::test_utils::{days, generate_random_history, ts, MockDates}
};
use std::sync::Arc;

use crate::common::init_test_env;

struct League {
    store: Arc<InMemoryStore>,
    processor: SeasonProcessor<InMemoryStore>,
    queries: SnapshotQueries<InMemoryStore>,
    players: Vec<PlayerId>,
    spring: SeasonId,
    autumn: SeasonId
}

async fn league() -> League {
    init_test_env();
    let store = Arc::new(InMemoryStore::new());

    let mut players = Vec::new();
    for name in ["Ann", "Ben", "Cat", "Dan"] {
        players.push(store.insert_player(name, None).await);
    }
    let spring = store
        .insert_season("Spring", ts("2024-01-01T00:00:00Z"), ts("2024-06-30T23:59:59Z"))
        .await;
    let autumn = store
        .insert_season("Autumn", ts("2024-07-01T00:00:00Z"), ts("2024-12-31T23:59:59Z"))
        .await;

    League {
        processor: SeasonProcessor::new(Arc::clone(&store)),
        queries: SnapshotQueries::new(Arc::clone(&store)),
        store,
        players,
        spring,
        autumn
    }
}

#[tokio::test]
async fn test_season_end_to_end() {
    let l = league().await;
    let (ann, ben) = (l.players[0], l.players[1]);
    let first = l.store.insert_match(MockDates::match1(), None, ann, ben).await;
    l.store.insert_match(MockDates::match2(), None, ben, ann).await;
    l.store.insert_match(MockDates::match3(), None, ann, ben).await;
    l.store
        .insert_tournament("Spring Open", MockDates::tournament1(), ann)
        .await;

    let summary = l.processor.recalculate_season_elo(l.spring).await.unwrap();
    let now = MockDates::tournament1() + days(1.0);

    assert_eq!(summary.players_processed, 2);
    assert_eq!(summary.matches_processed, 3);

    // 112 + floor(112 * 0.08)
    let board = l.queries.get_season_leaderboard(l.spring, None, now).await.unwrap();
    assert_eq!(board[0].player_id, ann);
    assert_eq!(board[0].current_elo, 120);
    assert_eq!(board[1].player_id, ben);

    let stats = l.queries.get_player_season_stats(ben, l.spring, now).await.unwrap();
    assert_eq!((stats.wins, stats.losses), (1, 2));

    let changes = l.queries.get_match_elo_changes(first).await.unwrap().unwrap();
    assert_eq!((changes.winner.change, changes.loser.change), (10, -8));

    // Nothing in autumn yet
    let autumn = l.queries.get_season_leaderboard(l.autumn, None, now).await.unwrap();
    assert!(autumn.is_empty());
    let empty = l.queries.get_player_season_stats(ann, l.autumn, now).await.unwrap();
    assert_eq!((empty.wins, empty.losses, empty.current_elo), (0, 0, 0));
}

#[tokio::test]
async fn test_moving_a_match_between_seasons() {
    let l = league().await;
    let (ann, ben) = (l.players[0], l.players[1]);
    let old_date = MockDates::match1();
    let new_date = ts("2024-08-01T00:00:00Z");
    let m = l.store.insert_match(old_date, None, ann, ben).await;
    l.processor.recalculate_all_seasons().await.unwrap();

    l.store
        .patch_match(
            m,
            MatchPatch {
                date: Some(new_date),
                ..Default::default()
            }
        )
        .await;
    let summaries = l
        .processor
        .recalculate_seasons_containing(&[old_date, new_date])
        .await
        .unwrap();

    assert_eq!(summaries.len(), 2);
    assert!(l.store.season_snapshots(l.spring).await.unwrap().is_empty());

    let changes = l.queries.get_match_elo_changes(m).await.unwrap().unwrap();
    assert_eq!(changes.season_id, l.autumn);
    assert_eq!(changes.winner.new_elo, 110);
}

#[tokio::test]
async fn test_seasons_are_independent() {
    let l = league().await;
    let (ann, ben) = (l.players[0], l.players[1]);
    l.store.insert_match(MockDates::match1(), None, ann, ben).await;
    l.store
        .insert_match(ts("2024-09-01T00:00:00Z"), None, ben, ann)
        .await;

    l.processor.recalculate_all_seasons().await.unwrap();

    let now = ts("2024-09-02T00:00:00Z");
    let autumn = l.queries.get_season_leaderboard(l.autumn, None, now).await.unwrap();
    assert_eq!(autumn[0].player_id, ben);
    assert_eq!(autumn[0].base_elo, 110);
    assert_eq!(autumn[1].base_elo, 92);

    let current = l.queries.get_current_season(now).await.unwrap().unwrap();
    assert_eq!(current.id, l.autumn);
}

#[tokio::test]
async fn test_spring_decay_is_capped_at_season_end() {
    let l = league().await;
    let (ann, ben) = (l.players[0], l.players[1]);
    l.store
        .insert_match(ts("2024-01-02T00:00:00Z"), None, ann, ben)
        .await;
    l.processor.recalculate_season_elo(l.spring).await.unwrap();

    let at_close = l
        .queries
        .get_season_leaderboard(l.spring, None, ts("2024-06-30T23:59:59Z"))
        .await
        .unwrap();
    let years_later = l
        .queries
        .get_season_leaderboard(l.spring, None, ts("2027-01-01T00:00:00Z"))
        .await
        .unwrap();

    assert_eq!(at_close, years_later);
    assert!(at_close[0].inactivity_penalty > 0);
}

#[tokio::test]
async fn test_random_league_is_reproducible() {
    let l = league().await;
    generate_random_history(&l.store, &l.players, 200, 12, 7).await;

    let first = l.processor.recalculate_all_seasons().await.unwrap();
    let now = MockDates::season_end();
    let board = l.queries.get_season_leaderboard(l.spring, None, now).await.unwrap();
    let again = l.processor.recalculate_all_seasons().await.unwrap();

    assert_eq!(first, again);
    assert_eq!(
        board,
        l.queries.get_season_leaderboard(l.spring, None, now).await.unwrap()
    );
    assert!(board.windows(2).all(|w| w[0].current_elo >= w[1].current_elo));
    assert!(board.iter().all(|e| e.current_elo >= 0));
}

#[tokio::test]
async fn test_self_match_surfaces_as_invariant_violation() {
    let l = league().await;
    l.store
        .insert_match(MockDates::match1(), None, l.players[2], l.players[2])
        .await;

    let result = l.processor.recalculate_season_elo(l.spring).await;

    assert!(matches!(result, Err(ProcessorError::InvariantViolation(_))));
    assert!(l.store.season_snapshots(l.spring).await.unwrap().is_empty());
}
