use std::collections::BTreeMap;

use super::SnapshotQueries;
use crate::{
    database::{
        db_structs::{CalculationMetadata, MatchId, RatingSnapshot, SeasonId},
        store::RecordStore
    },
    error::ProcessorError
};
use serde::Serialize;
use tracing::{instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EloChange {
    pub previous_elo: i32,
    pub new_elo: i32,
    pub change: i32
}

impl EloChange {
    fn from_snapshot(snapshot: &RatingSnapshot) -> Option<EloChange> {
        let previous_elo = snapshot.calculation_metadata.previous_elo()?;

        Some(EloChange {
            previous_elo,
            new_elo: snapshot.elo,
            change: snapshot.elo - previous_elo
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEloChanges {
    pub season_id: SeasonId,
    pub winner: EloChange,
    pub loser: EloChange
}

impl<S: RecordStore> SnapshotQueries<S> {
    /// Rating deltas recorded for a match.
    ///
    /// `None` when the match has not been replayed (or was excluded). When the
    /// match falls in several live seasons, the lowest season id is reported.
    #[instrument(skip(self))]
    pub async fn get_match_elo_changes(&self, match_id: MatchId) -> Result<Option<MatchEloChanges>, ProcessorError> {
        let match_id = match_id.validate()?;

        let mut by_season: BTreeMap<SeasonId, Vec<RatingSnapshot>> = BTreeMap::new();
        for snapshot in self.store.match_snapshots(match_id).await? {
            by_season.entry(snapshot.season_id).or_default().push(snapshot);
        }

        for (season_id, snapshots) in by_season {
            if self.live_season(season_id).await?.is_none() {
                continue;
            }

            let winner = snapshots
                .iter()
                .find(|s| matches!(s.calculation_metadata, CalculationMetadata::MatchWin { .. }))
                .and_then(EloChange::from_snapshot);
            let loser = snapshots
                .iter()
                .find(|s| matches!(s.calculation_metadata, CalculationMetadata::MatchLoss { .. }))
                .and_then(EloChange::from_snapshot);

            match (winner, loser) {
                (Some(winner), Some(loser)) => {
                    return Ok(Some(MatchEloChanges {
                        season_id,
                        winner,
                        loser
                    }))
                }
                _ => warn!(%match_id, %season_id, "Match has an incomplete snapshot pair")
            }
        }

        Ok(None)
    }
}
