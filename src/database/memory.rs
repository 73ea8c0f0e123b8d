use super::{
    db_structs::{Match, MatchId, Player, PlayerId, RatingSnapshot, Season, SeasonId, Tournament, TournamentId},
    store::{RecordStore, StoreError}
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc
};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Partial update of a match; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct MatchPatch {
    pub date: Option<DateTime<Utc>>,
    pub tournament: Option<Option<TournamentId>>,
    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>
}

#[derive(Debug, Clone, Default)]
pub struct TournamentPatch {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub winner: Option<PlayerId>
}

#[derive(Debug, Clone, Default)]
pub struct SeasonPatch {
    pub name: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>
}

#[derive(Default)]
struct Records {
    next_id: i32,
    players: BTreeMap<PlayerId, Player>,
    seasons: BTreeMap<SeasonId, Season>,
    matches: BTreeMap<MatchId, Match>,
    tournaments: BTreeMap<TournamentId, Tournament>
}

impl Records {
    fn issue_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory document store for embedding and testing.
///
/// Each season's snapshot set is held behind an `Arc` and replaced wholesale
/// under the write lock, so a reader clones either the old or the new set.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Records>,
    snapshots: RwLock<HashMap<SeasonId, Arc<Vec<RatingSnapshot>>>>
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_player(&self, name: &str, image: Option<&str>) -> PlayerId {
        let mut records = self.records.write().await;
        let id = PlayerId(records.issue_id());
        records.players.insert(
            id,
            Player {
                id,
                name: name.to_string(),
                image: image.map(str::to_string),
                deleted: false
            }
        );

        id
    }

    pub async fn insert_season(&self, name: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> SeasonId {
        let mut records = self.records.write().await;
        let id = SeasonId(records.issue_id());
        records.seasons.insert(
            id,
            Season {
                id,
                name: name.to_string(),
                start,
                end,
                deleted: false
            }
        );

        id
    }

    pub async fn insert_tournament(&self, name: &str, date: DateTime<Utc>, winner: PlayerId) -> TournamentId {
        let mut records = self.records.write().await;
        let id = TournamentId(records.issue_id());
        records.tournaments.insert(
            id,
            Tournament {
                id,
                name: name.to_string(),
                date,
                winner,
                deleted: false
            }
        );

        id
    }

    pub async fn insert_match(
        &self,
        date: DateTime<Utc>,
        tournament: Option<TournamentId>,
        winner: PlayerId,
        loser: PlayerId
    ) -> MatchId {
        let mut records = self.records.write().await;
        let id = MatchId(records.issue_id());
        records.matches.insert(
            id,
            Match {
                id,
                date,
                tournament,
                winner,
                loser,
                deleted: false
            }
        );

        id
    }

    /// Returns false if the match does not exist
    pub async fn patch_match(&self, id: MatchId, patch: MatchPatch) -> bool {
        let mut records = self.records.write().await;
        let Some(m) = records.matches.get_mut(&id) else {
            return false;
        };

        if let Some(date) = patch.date {
            m.date = date;
        }
        if let Some(tournament) = patch.tournament {
            m.tournament = tournament;
        }
        if let Some(winner) = patch.winner {
            m.winner = winner;
        }
        if let Some(loser) = patch.loser {
            m.loser = loser;
        }

        true
    }

    pub async fn patch_tournament(&self, id: TournamentId, patch: TournamentPatch) -> bool {
        let mut records = self.records.write().await;
        let Some(t) = records.tournaments.get_mut(&id) else {
            return false;
        };

        if let Some(name) = patch.name {
            t.name = name;
        }
        if let Some(date) = patch.date {
            t.date = date;
        }
        if let Some(winner) = patch.winner {
            t.winner = winner;
        }

        true
    }

    pub async fn patch_season(&self, id: SeasonId, patch: SeasonPatch) -> bool {
        let mut records = self.records.write().await;
        let Some(s) = records.seasons.get_mut(&id) else {
            return false;
        };

        if let Some(name) = patch.name {
            s.name = name;
        }
        if let Some(start) = patch.start {
            s.start = start;
        }
        if let Some(end) = patch.end {
            s.end = end;
        }

        true
    }

    pub async fn soft_delete_match(&self, id: MatchId) -> bool {
        let mut records = self.records.write().await;
        records.matches.get_mut(&id).map(|m| m.deleted = true).is_some()
    }

    pub async fn soft_delete_tournament(&self, id: TournamentId) -> bool {
        let mut records = self.records.write().await;
        records.tournaments.get_mut(&id).map(|t| t.deleted = true).is_some()
    }

    pub async fn soft_delete_season(&self, id: SeasonId) -> bool {
        let mut records = self.records.write().await;
        records.seasons.get_mut(&id).map(|s| s.deleted = true).is_some()
    }

    pub async fn soft_delete_player(&self, id: PlayerId) -> bool {
        let mut records = self.records.write().await;
        records.players.get_mut(&id).map(|p| p.deleted = true).is_some()
    }

    async fn all_snapshots(&self) -> Vec<Arc<Vec<RatingSnapshot>>> {
        self.snapshots.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get_season(&self, id: SeasonId) -> Result<Option<Season>, StoreError> {
        Ok(self.records.read().await.seasons.get(&id).cloned())
    }

    async fn list_seasons(&self) -> Result<Vec<Season>, StoreError> {
        Ok(self.records.read().await.seasons.values().cloned().collect())
    }

    async fn matches_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Match>, StoreError> {
        let records = self.records.read().await;

        Ok(records
            .matches
            .values()
            .filter(|m| start <= m.date && m.date <= end)
            .cloned()
            .collect())
    }

    async fn tournaments_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>
    ) -> Result<Vec<Tournament>, StoreError> {
        let records = self.records.read().await;

        Ok(records
            .tournaments
            .values()
            .filter(|t| start <= t.date && t.date <= end)
            .cloned()
            .collect())
    }

    async fn get_players(&self, ids: &[PlayerId]) -> Result<Vec<Player>, StoreError> {
        let records = self.records.read().await;

        Ok(ids
            .iter()
            .unique()
            .filter_map(|id| records.players.get(id).cloned())
            .collect())
    }

    #[instrument(skip(self, snapshots), fields(count = snapshots.len()))]
    async fn replace_season_snapshots(&self, season: SeasonId, snapshots: &[RatingSnapshot]) -> Result<(), StoreError> {
        let replacement = Arc::new(snapshots.to_vec());
        let previous = self.snapshots.write().await.insert(season, replacement);

        debug!(
            replaced = previous.map(|p| p.len()).unwrap_or_default(),
            "Swapped season snapshot set"
        );
        Ok(())
    }

    async fn season_snapshots(&self, season: SeasonId) -> Result<Vec<RatingSnapshot>, StoreError> {
        let set = self.snapshots.read().await.get(&season).cloned();

        Ok(set.map(|s| s.as_ref().clone()).unwrap_or_default())
    }

    async fn player_snapshots(&self, player: PlayerId, season: SeasonId) -> Result<Vec<RatingSnapshot>, StoreError> {
        let set = self.snapshots.read().await.get(&season).cloned();

        Ok(set
            .map(|s| s.iter().filter(|snap| snap.player_id == player).cloned().collect())
            .unwrap_or_default())
    }

    async fn match_snapshots(&self, match_id: MatchId) -> Result<Vec<RatingSnapshot>, StoreError> {
        Ok(self
            .all_snapshots()
            .await
            .iter()
            .flat_map(|set| set.iter())
            .filter(|snap| snap.calculation_metadata.match_id() == Some(match_id))
            .cloned()
            .collect())
    }

    async fn player_snapshot_seasons(&self, player: PlayerId) -> Result<Vec<SeasonId>, StoreError> {
        let snapshots = self.snapshots.read().await;

        Ok(snapshots
            .iter()
            .filter(|(_, set)| set.iter().any(|snap| snap.player_id == player))
            .map(|(season, _)| *season)
            .sorted()
            .collect())
    }
}
