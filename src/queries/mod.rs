//! Read-only views over persisted snapshots.
//!
//! Nothing here recomputes ratings. The only derived value is the inactivity
//! penalty, computed against the caller-supplied `now`.

pub mod leaderboard;
pub mod matches;
pub mod player;
pub mod seasons;

use std::sync::Arc;

use crate::{
    database::{
        db_structs::{RatingSnapshot, Season, SeasonId},
        store::RecordStore
    },
    error::ProcessorError,
    model::{decay::inactivity_penalty, rating_utils::RatingError}
};
use chrono::{DateTime, Utc};

/// Display name for snapshots whose player record is missing
pub const UNKNOWN_PLAYER_NAME: &str = "Unknown player";

/// A player's stored rating with live inactivity decay applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveRating {
    pub base_elo: i32,
    pub inactivity_penalty: i32,
    pub current_elo: i32,
    pub last_event: DateTime<Utc>
}

impl LiveRating {
    pub fn from_latest(latest: &RatingSnapshot, season: &Season, now: DateTime<Utc>) -> Result<Self, RatingError> {
        let penalty = inactivity_penalty(latest.elo, latest.timestamp, now, season.end)?;

        Ok(LiveRating {
            base_elo: latest.elo,
            inactivity_penalty: penalty,
            current_elo: latest.elo - penalty,
            last_event: latest.timestamp
        })
    }
}

pub struct SnapshotQueries<S: RecordStore> {
    store: Arc<S>
}

impl<S: RecordStore> Clone for SnapshotQueries<S> {
    fn clone(&self) -> Self {
        SnapshotQueries {
            store: Arc::clone(&self.store)
        }
    }
}

impl<S: RecordStore> SnapshotQueries<S> {
    pub fn new(store: Arc<S>) -> SnapshotQueries<S> {
        SnapshotQueries { store }
    }

    /// Non-deleted season by id. Unknown and deleted seasons read as `None`.
    async fn live_season(&self, season_id: SeasonId) -> Result<Option<Season>, ProcessorError> {
        Ok(self.store.get_season(season_id).await?.filter(|s| !s.deleted))
    }
}

/// Chronologically latest snapshot, by `(timestamp, sequence)`
pub fn latest_snapshot<'a, I>(snapshots: I) -> Option<&'a RatingSnapshot>
where
    I: IntoIterator<Item = &'a RatingSnapshot>
{
    snapshots.into_iter().max_by_key(|s| s.order_key())
}
