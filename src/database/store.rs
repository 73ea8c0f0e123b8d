use super::db_structs::{Match, MatchId, Player, PlayerId, RatingSnapshot, Season, SeasonId, Tournament};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Stored record is unreadable: {0}")]
    Corrupt(String)
}

/// Read/write surface of the record store consumed by the rating engine.
///
/// Range queries return soft-deleted records as well; filtering them out is
/// the engine's job. The snapshot collection is owned by the engine and is
/// only ever replaced a whole season at a time.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_season(&self, id: SeasonId) -> Result<Option<Season>, StoreError>;
    async fn list_seasons(&self) -> Result<Vec<Season>, StoreError>;

    /// Matches with `start <= date <= end`
    async fn matches_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Match>, StoreError>;

    /// Tournaments with `start <= date <= end`
    async fn tournaments_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>
    ) -> Result<Vec<Tournament>, StoreError>;

    async fn get_players(&self, ids: &[PlayerId]) -> Result<Vec<Player>, StoreError>;

    /// Deletes every snapshot of `season` and inserts `snapshots` as one atomic unit.
    /// Readers must observe either the previous set or the new one.
    async fn replace_season_snapshots(&self, season: SeasonId, snapshots: &[RatingSnapshot]) -> Result<(), StoreError>;

    async fn season_snapshots(&self, season: SeasonId) -> Result<Vec<RatingSnapshot>, StoreError>;
    async fn player_snapshots(&self, player: PlayerId, season: SeasonId) -> Result<Vec<RatingSnapshot>, StoreError>;
    async fn match_snapshots(&self, match_id: MatchId) -> Result<Vec<RatingSnapshot>, StoreError>;

    /// Seasons in which the player has at least one snapshot
    async fn player_snapshot_seasons(&self, player: PlayerId) -> Result<Vec<SeasonId>, StoreError>;
}
