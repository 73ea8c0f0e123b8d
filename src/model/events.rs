use crate::{
    database::{
        db_structs::{Match, Season, Tournament},
        store::{RecordStore, StoreError}
    },
    model::structures::season_event::SeasonEvent
};
use itertools::Itertools;
use tracing::debug;

/// A season's rating-affecting events in replay order
#[derive(Debug, Clone, Default)]
pub struct CollectedEvents {
    pub events: Vec<SeasonEvent>,
    /// In-window, non-deleted matches
    pub match_count: usize,
    pub tournament_count: usize
}

/// Reads the season's matches and tournaments from the store and merges them
pub async fn collect_season_events<S: RecordStore + ?Sized>(
    store: &S,
    season: &Season
) -> Result<CollectedEvents, StoreError> {
    let matches = store.matches_in_range(season.start, season.end).await?;
    let tournaments = store.tournaments_in_range(season.start, season.end).await?;

    debug!(
        season = %season.id,
        matches = matches.len(),
        tournaments = tournaments.len(),
        "Fetched season records"
    );

    Ok(merge_events(season, matches, tournaments))
}

/// Drops soft-deleted and out-of-window records, then orders everything by
/// [`SeasonEvent::replay_key`]. The store's own ordering is not trusted.
pub fn merge_events(season: &Season, matches: Vec<Match>, tournaments: Vec<Tournament>) -> CollectedEvents {
    let matches = matches
        .into_iter()
        .filter(|m| !m.deleted && season.contains(m.date))
        .map(SeasonEvent::Match)
        .collect_vec();
    let tournaments = tournaments
        .into_iter()
        .filter(|t| !t.deleted && season.contains(t.date))
        .map(SeasonEvent::Tournament)
        .collect_vec();

    let match_count = matches.len();
    let tournament_count = tournaments.len();

    let events = matches
        .into_iter()
        .chain(tournaments)
        .sorted_by_key(SeasonEvent::replay_key)
        .collect();

    CollectedEvents {
        events,
        match_count,
        tournament_count
    }
}
