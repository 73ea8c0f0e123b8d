use crate::model::structures::snapshot_reason::SnapshotReason;
use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use std::{fmt, num::ParseIntError, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdParseError {
    #[error("'{0}' is not a valid {1} id")]
    Malformed(String, &'static str),

    #[error("{1} id must be positive, got {0}")]
    NonPositive(i32, &'static str)
}

macro_rules! record_id {
    ($name:ident, $label:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSql, FromSql,
        )]
        #[serde(transparent)]
        #[postgres(transparent)]
        pub struct $name(pub i32);

        impl $name {
            pub const LABEL: &'static str = $label;

            /// Ids are issued by the store starting at 1
            pub fn validate(self) -> Result<Self, IdParseError> {
                if self.0 <= 0 {
                    return Err(IdParseError::NonPositive(self.0, Self::LABEL));
                }

                Ok(self)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value: i32 = s
                    .trim()
                    .parse()
                    .map_err(|_: ParseIntError| IdParseError::Malformed(s.to_string(), Self::LABEL))?;

                $name(value).validate()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(PlayerId, "player");
record_id!(SeasonId, "season");
record_id!(MatchId, "match");
record_id!(TournamentId, "tournament");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub image: Option<String>,
    pub deleted: bool
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub id: SeasonId,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub deleted: bool
}

impl Season {
    /// Inclusive on both ends
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub date: DateTime<Utc>,
    pub tournament: Option<TournamentId>,
    pub winner: PlayerId,
    pub loser: PlayerId,
    pub deleted: bool
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub date: DateTime<Utc>,
    pub winner: PlayerId,
    pub deleted: bool
}

/// Why a snapshot exists, plus the details needed to explain the rating change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CalculationMetadata {
    SeasonStart,
    #[serde(rename_all = "camelCase")]
    MatchWin {
        match_id: MatchId,
        opponent_id: PlayerId,
        points_transferred: i32,
        previous_elo: i32,
        new_elo: i32
    },
    #[serde(rename_all = "camelCase")]
    MatchLoss {
        match_id: MatchId,
        opponent_id: PlayerId,
        points_transferred: i32,
        previous_elo: i32,
        new_elo: i32
    },
    #[serde(rename_all = "camelCase")]
    TournamentBonus {
        tournament_id: TournamentId,
        tournament_bonus: i32,
        previous_elo: i32,
        new_elo: i32
    }
}

impl CalculationMetadata {
    pub fn reason(&self) -> SnapshotReason {
        match self {
            CalculationMetadata::SeasonStart => SnapshotReason::SeasonStart,
            CalculationMetadata::MatchWin { .. } => SnapshotReason::MatchWin,
            CalculationMetadata::MatchLoss { .. } => SnapshotReason::MatchLoss,
            CalculationMetadata::TournamentBonus { .. } => SnapshotReason::TournamentBonus
        }
    }

    pub fn match_id(&self) -> Option<MatchId> {
        match self {
            CalculationMetadata::MatchWin { match_id, .. } | CalculationMetadata::MatchLoss { match_id, .. } => {
                Some(*match_id)
            }
            _ => None
        }
    }

    /// Rating before the event. The season baseline has none.
    pub fn previous_elo(&self) -> Option<i32> {
        match self {
            CalculationMetadata::SeasonStart => None,
            CalculationMetadata::MatchWin { previous_elo, .. }
            | CalculationMetadata::MatchLoss { previous_elo, .. }
            | CalculationMetadata::TournamentBonus { previous_elo, .. } => Some(*previous_elo)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSnapshot {
    /// Fresh on every recalculation
    pub id: Uuid,
    pub player_id: PlayerId,
    pub season_id: SeasonId,
    /// Replay ordinal within the season; breaks timestamp ties
    pub sequence: i32,
    /// Rating immediately after the event
    pub elo: i32,
    /// When the event happened, not when the snapshot was written
    pub timestamp: DateTime<Utc>,
    pub calculation_metadata: CalculationMetadata
}

impl RatingSnapshot {
    pub fn reason(&self) -> SnapshotReason {
        self.calculation_metadata.reason()
    }

    /// Chronological order key within one player's season history
    pub fn order_key(&self) -> (DateTime<Utc>, i32) {
        (self.timestamp, self.sequence)
    }
}
