use crate::database::{
    db_structs::{
        CalculationMetadata, Match, MatchId, PlayerId, RatingSnapshot, Season, SeasonId, Tournament, TournamentId
    },
    memory::InMemoryStore
};
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

/// Parses an RFC 3339 instant, panicking on bad input
pub fn ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .unwrap_or_else(|e| panic!("Invalid timestamp '{}': {}", value, e))
        .with_timezone(&Utc)
}

/// Fractional days, millisecond precision
pub fn days(n: f64) -> Duration {
    Duration::milliseconds((n * 86_400_000.0).round() as i64)
}

/// Millisecond epoch to instant
pub fn ms(epoch_millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(epoch_millis)
        .unwrap_or_else(|| panic!("Epoch millis out of range: {}", epoch_millis))
}

pub fn to_ms(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

/// Fixed instants inside the default 2024 test season
pub struct MockDates;

impl MockDates {
    pub fn season_start() -> DateTime<Utc> {
        ts("2024-01-01T00:00:00Z")
    }

    pub fn season_end() -> DateTime<Utc> {
        ts("2024-12-31T23:59:59Z")
    }

    pub fn match1() -> DateTime<Utc> {
        ts("2024-02-01T12:00:00Z")
    }

    pub fn match2() -> DateTime<Utc> {
        ts("2024-03-01T12:00:00Z")
    }

    pub fn match3() -> DateTime<Utc> {
        ts("2024-04-01T12:00:00Z")
    }

    pub fn tournament1() -> DateTime<Utc> {
        ts("2024-05-01T12:00:00Z")
    }
}

pub fn generate_season(id: i32) -> Season {
    Season {
        id: SeasonId(id),
        name: format!("Season {}", id),
        start: MockDates::season_start(),
        end: MockDates::season_end(),
        deleted: false
    }
}

pub fn generate_match(id: i32, date: DateTime<Utc>, winner: PlayerId, loser: PlayerId) -> Match {
    Match {
        id: MatchId(id),
        date,
        tournament: None,
        winner,
        loser,
        deleted: false
    }
}

pub fn generate_tournament(id: i32, date: DateTime<Utc>, winner: PlayerId) -> Tournament {
    Tournament {
        id: TournamentId(id),
        name: format!("Tournament {}", id),
        date,
        winner,
        deleted: false
    }
}

/// Snapshot stamped at the season start plus `sequence` minutes
pub fn generate_snapshot(
    player_id: PlayerId,
    season_id: SeasonId,
    sequence: i32,
    elo: i32,
    calculation_metadata: CalculationMetadata
) -> RatingSnapshot {
    RatingSnapshot {
        id: Uuid::new_v4(),
        player_id,
        season_id,
        sequence,
        elo,
        timestamp: MockDates::season_start() + Duration::minutes(sequence as i64),
        calculation_metadata
    }
}

/// Rating after the player's last snapshot, if any
pub fn latest_elo(snapshots: &[RatingSnapshot], player_id: PlayerId) -> Option<i32> {
    snapshots
        .iter()
        .filter(|s| s.player_id == player_id)
        .max_by_key(|s| s.order_key())
        .map(|s| s.elo)
}

/// Fills the store with a reproducible history inside the default test season.
///
/// Timestamps are drawn at whole-day resolution, so same-instant events are common.
pub async fn generate_random_history(
    store: &InMemoryStore,
    players: &[PlayerId],
    n_matches: usize,
    n_tournaments: usize,
    seed: u64
) -> (Vec<MatchId>, Vec<TournamentId>) {
    if players.len() < 2 {
        panic!("At least two players are required for a match history");
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let span_days = (MockDates::season_end() - MockDates::season_start()).num_days();
    let random_date = |rng: &mut ChaCha8Rng| MockDates::season_start() + Duration::days(rng.random_range(0..span_days));

    let mut matches = Vec::with_capacity(n_matches);
    for _ in 0..n_matches {
        let winner = players[rng.random_range(0..players.len())];
        let loser = loop {
            let candidate = players[rng.random_range(0..players.len())];
            if candidate != winner {
                break candidate;
            }
        };
        let date = random_date(&mut rng);

        matches.push(store.insert_match(date, None, winner, loser).await);
    }

    let mut tournaments = Vec::with_capacity(n_tournaments);
    for i in 0..n_tournaments {
        let winner = players[rng.random_range(0..players.len())];
        let date = random_date(&mut rng);

        tournaments.push(
            store
                .insert_tournament(&format!("Random Open {}", i + 1), date, winner)
                .await
        );
    }

    (matches, tournaments)
}
