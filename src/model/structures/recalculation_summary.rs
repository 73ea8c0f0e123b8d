use crate::database::db_structs::SeasonId;
use serde::Serialize;

/// Returned by a season recalculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculationSummary {
    pub season_id: SeasonId,
    /// Distinct players seen during replay
    pub players_processed: usize,
    /// In-window, non-deleted matches
    pub matches_processed: usize,
    pub tournaments_processed: usize,
    pub snapshots_written: usize
}
