use std::sync::Arc;

use crate::{
    database::{
        db_structs::{RatingSnapshot, Season, SeasonId},
        store::RecordStore
    },
    error::ProcessorError,
    model::{
        events::{collect_season_events, CollectedEvents},
        rating_tracker::RatingTracker,
        rating_utils::RatingError,
        season_locks::SeasonLocks,
        structures::{recalculation_summary::RecalculationSummary, season_event::SeasonEvent}
    },
    utils::progress_utils::progress_bar
};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use itertools::Itertools;
use tracing::{debug, error, info, instrument, warn};

/// The complete snapshot set for a season, computed in memory before anything is written
#[derive(Debug, Clone)]
pub struct SeasonPlan {
    pub snapshots: Vec<RatingSnapshot>,
    pub summary: RecalculationSummary
}

/// # Season replay
///
/// Replays the season's events in order through a fresh [`RatingTracker`].
/// Pure: the same season and events always give the same ratings and ordering,
/// only the snapshot ids differ between runs.
pub fn plan_season(season: &Season, collected: &CollectedEvents) -> Result<SeasonPlan, RatingError> {
    let bar = progress_bar(
        collected.events.len() as u64,
        format!("Replaying season {}", season.name)
    );
    let mut tracker = RatingTracker::new(season);

    for event in &collected.events {
        match event {
            SeasonEvent::Match(m) => {
                debug!(match_id = %m.id, winner = %m.winner, loser = %m.loser, "Applying match");
                tracker.apply_match(m)?;
            }
            SeasonEvent::Tournament(t) => {
                debug!(tournament_id = %t.id, winner = %t.winner, "Applying tournament bonus");
                tracker.apply_tournament(t)?;
            }
        }

        if let Some(bar) = &bar {
            bar.inc(1);
        }
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let players_processed = tracker.player_count();
    let snapshots = tracker.into_snapshots();

    Ok(SeasonPlan {
        summary: RecalculationSummary {
            season_id: season.id,
            players_processed,
            matches_processed: collected.match_count,
            tournaments_processed: collected.tournament_count,
            snapshots_written: snapshots.len()
        },
        snapshots
    })
}

/// Season-level entry point for rating recalculation
pub struct SeasonProcessor<S: RecordStore> {
    store: Arc<S>,
    locks: Arc<SeasonLocks>
}

impl<S: RecordStore> Clone for SeasonProcessor<S> {
    fn clone(&self) -> Self {
        SeasonProcessor {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks)
        }
    }
}

impl<S: RecordStore> SeasonProcessor<S> {
    pub fn new(store: Arc<S>) -> SeasonProcessor<S> {
        SeasonProcessor {
            store,
            locks: Arc::new(SeasonLocks::new())
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// # Season recalculation
    ///
    /// Steps:
    /// 1. Validate the season id and load the season. Nothing is touched on failure.
    /// 2. Collect the season's in-window, non-deleted matches and tournaments.
    /// 3. Plan the complete snapshot set in memory (see [`plan_season`]).
    /// 4. Swap the season's previous snapshot set for the new one in a single write.
    ///
    /// Concurrent calls for the same season run one after another.
    #[instrument(skip(self))]
    pub async fn recalculate_season_elo(&self, season_id: SeasonId) -> Result<RecalculationSummary, ProcessorError> {
        let season_id = season_id.validate()?;
        let _guard = self.locks.acquire(season_id).await;

        let season = self.load_season(season_id).await?;
        let collected = collect_season_events(self.store.as_ref(), &season).await?;
        let plan = plan_season(&season, &collected)?;

        if let Err(e) = self.store.replace_season_snapshots(season.id, &plan.snapshots).await {
            error!(season = %season.id, "Failed to replace season snapshots: {}", e);
            return Err(e.into());
        }

        info!(
            season = %season.id,
            players = plan.summary.players_processed,
            matches = plan.summary.matches_processed,
            tournaments = plan.summary.tournaments_processed,
            "Season recalculated"
        );
        Ok(plan.summary)
    }

    /// Recalculates every live season whose window contains any of `instants`.
    ///
    /// After a match or tournament is created, edited or deleted, pass its old
    /// and new dates so every affected season is rebuilt.
    pub async fn recalculate_seasons_containing(
        &self,
        instants: &[DateTime<Utc>]
    ) -> Result<Vec<RecalculationSummary>, ProcessorError> {
        let seasons = self
            .live_seasons()
            .await?
            .into_iter()
            .filter(|s| instants.iter().any(|instant| s.contains(*instant)))
            .collect_vec();

        debug!(count = seasons.len(), "Seasons affected by change");
        try_join_all(seasons.iter().map(|s| self.recalculate_season_elo(s.id))).await
    }

    /// Recalculates every live season concurrently
    pub async fn recalculate_all_seasons(&self) -> Result<Vec<RecalculationSummary>, ProcessorError> {
        let seasons = self.live_seasons().await?;

        info!(count = seasons.len(), "Recalculating all seasons");
        try_join_all(seasons.iter().map(|s| self.recalculate_season_elo(s.id))).await
    }

    async fn live_seasons(&self) -> Result<Vec<Season>, ProcessorError> {
        Ok(self
            .store
            .list_seasons()
            .await?
            .into_iter()
            .filter(|s| !s.deleted && s.is_well_formed())
            .collect())
    }

    async fn load_season(&self, season_id: SeasonId) -> Result<Season, ProcessorError> {
        let reason = match self.store.get_season(season_id).await? {
            Some(season) if !season.deleted && season.is_well_formed() => return Ok(season),
            Some(season) if season.deleted => format!("Season {} has been deleted", season_id),
            Some(_) => format!("Season {} does not end after it starts", season_id),
            None => format!("Season {} does not exist", season_id)
        };

        warn!("{}", reason);
        Err(ProcessorError::Validation(reason))
    }
}
