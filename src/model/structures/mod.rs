pub mod recalculation_summary;
pub mod season_event;
pub mod snapshot_reason;
