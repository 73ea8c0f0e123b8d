use crate::database::db_structs::{Match, Tournament};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A rating-affecting event within a season, in replay order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum SeasonEvent {
    Match(Match),
    Tournament(Tournament)
}

impl SeasonEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            SeasonEvent::Match(m) => m.date,
            SeasonEvent::Tournament(t) => t.date
        }
    }

    /// Ascending by date; at the same instant matches replay before
    /// tournaments, then lower record ids first.
    pub fn replay_key(&self) -> (DateTime<Utc>, u8, i32) {
        match self {
            SeasonEvent::Match(m) => (m.date, 0, m.id.0),
            SeasonEvent::Tournament(t) => (t.date, 1, t.id.0)
        }
    }
}
