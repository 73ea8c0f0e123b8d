use std::cmp::Reverse;

use super::{latest_snapshot, LiveRating, SnapshotQueries};
use crate::{
    database::{
        db_structs::{CalculationMetadata, PlayerId, Season, SeasonId},
        store::RecordStore
    },
    error::ProcessorError,
    model::structures::snapshot_reason::SnapshotReason
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;
use tracing::instrument;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSeasonStats {
    pub wins: usize,
    pub losses: usize,
    /// Live rating, inactivity decay included. 0 without history.
    pub current_elo: i32
}

impl PlayerSeasonStats {
    pub fn games(&self) -> usize {
        self.wins + self.losses
    }

    pub fn win_rate(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            games => self.wins as f64 / games as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EloHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub elo: i32,
    pub metadata: CalculationMetadata
}

impl EloHistoryEntry {
    pub fn reason(&self) -> SnapshotReason {
        self.metadata.reason()
    }
}

impl<S: RecordStore> SnapshotQueries<S> {
    #[instrument(skip(self))]
    pub async fn get_player_season_stats(
        &self,
        player_id: PlayerId,
        season_id: SeasonId,
        now: DateTime<Utc>
    ) -> Result<PlayerSeasonStats, ProcessorError> {
        let player_id = player_id.validate()?;
        let season_id = season_id.validate()?;
        let Some(season) = self.live_season(season_id).await? else {
            return Ok(PlayerSeasonStats::default());
        };

        let snapshots = self.store.player_snapshots(player_id, season.id).await?;
        let Some(latest) = latest_snapshot(&snapshots) else {
            return Ok(PlayerSeasonStats::default());
        };

        let count = |reason: SnapshotReason| snapshots.iter().filter(|s| s.reason() == reason).count();

        Ok(PlayerSeasonStats {
            wins: count(SnapshotReason::MatchWin),
            losses: count(SnapshotReason::MatchLoss),
            current_elo: LiveRating::from_latest(latest, &season, now)?.current_elo
        })
    }

    /// Every stored snapshot for the player in the season, oldest first. No decay is applied.
    /// A deleted season has no history.
    #[instrument(skip(self))]
    pub async fn get_player_elo_history(
        &self,
        player_id: PlayerId,
        season_id: SeasonId
    ) -> Result<Vec<EloHistoryEntry>, ProcessorError> {
        let player_id = player_id.validate()?;
        let season_id = season_id.validate()?;
        if self.live_season(season_id).await?.is_none() {
            return Ok(Vec::new());
        }

        Ok(self
            .store
            .player_snapshots(player_id, season_id)
            .await?
            .into_iter()
            .sorted_by_key(|s| s.order_key())
            .map(|s| EloHistoryEntry {
                timestamp: s.timestamp,
                elo: s.elo,
                metadata: s.calculation_metadata
            })
            .collect())
    }

    /// Non-deleted seasons in which the player has history, newest start first.
    ///
    /// Membership comes from stored snapshots, so a season counts once it has been
    /// recalculated and the player took part in a match or won a tournament in it.
    #[instrument(skip(self))]
    pub async fn get_player_seasons(&self, player_id: PlayerId) -> Result<Vec<Season>, ProcessorError> {
        let player_id = player_id.validate()?;

        let mut seasons = Vec::new();
        for season_id in self.store.player_snapshot_seasons(player_id).await? {
            if let Some(season) = self.live_season(season_id).await? {
                seasons.push(season);
            }
        }

        seasons.sort_by_key(|s| (Reverse(s.start), s.id));
        Ok(seasons)
    }
}
