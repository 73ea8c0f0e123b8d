use std::{cmp::Reverse, collections::HashMap};

use super::{latest_snapshot, LiveRating, SnapshotQueries, UNKNOWN_PLAYER_NAME};
use crate::{
    database::{
        db_structs::{Player, PlayerId, RatingSnapshot, SeasonId},
        store::RecordStore
    },
    error::ProcessorError,
    model::rating_utils::RatingError
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based
    pub rank: usize,
    pub player_id: PlayerId,
    pub player_name: String,
    pub player_image: Option<String>,
    pub current_elo: i32,
    pub inactivity_penalty: i32,
    /// Rating after the player's last event, before decay
    pub base_elo: i32
}

impl<S: RecordStore> SnapshotQueries<S> {
    /// # Season leaderboard
    ///
    /// One entry per player with history in the season, ranked by live rating
    /// (descending; ties by ascending player id). An unknown season or one
    /// without snapshots gives an empty list.
    #[instrument(skip(self))]
    pub async fn get_season_leaderboard(
        &self,
        season_id: SeasonId,
        limit: Option<usize>,
        now: DateTime<Utc>
    ) -> Result<Vec<LeaderboardEntry>, ProcessorError> {
        let season_id = season_id.validate()?;
        let Some(season) = self.live_season(season_id).await? else {
            return Ok(Vec::new());
        };

        let snapshots = self.store.season_snapshots(season.id).await?;
        let mut by_player: HashMap<PlayerId, Vec<&RatingSnapshot>> = HashMap::new();
        for snapshot in &snapshots {
            by_player.entry(snapshot.player_id).or_default().push(snapshot);
        }

        let standings = by_player
            .into_iter()
            .filter_map(|(player_id, history)| latest_snapshot(history).map(|latest| (player_id, latest)))
            .map(|(player_id, latest)| LiveRating::from_latest(latest, &season, now).map(|live| (player_id, live)))
            .collect::<Result<Vec<_>, RatingError>>()?
            .into_iter()
            .sorted_by_key(|(player_id, live)| (Reverse(live.current_elo), *player_id))
            .take(limit.unwrap_or(usize::MAX))
            .collect_vec();

        let ids = standings.iter().map(|(id, _)| *id).collect_vec();
        let players: HashMap<PlayerId, Player> = self
            .store
            .get_players(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(standings
            .into_iter()
            .enumerate()
            .map(|(i, (player_id, live))| {
                let player = players.get(&player_id);

                LeaderboardEntry {
                    rank: i + 1,
                    player_id,
                    player_name: player.map_or_else(|| UNKNOWN_PLAYER_NAME.to_string(), |p| p.name.clone()),
                    player_image: player.and_then(|p| p.image.clone()),
                    current_elo: live.current_elo,
                    inactivity_penalty: live.inactivity_penalty,
                    base_elo: live.base_elo
                }
            })
            .collect())
    }
}
