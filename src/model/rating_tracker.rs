use indexmap::IndexMap;

use crate::{
    database::db_structs::{CalculationMetadata, Match, PlayerId, RatingSnapshot, Season, SeasonId, Tournament},
    model::{
        constants::STARTING_ELO,
        rating_utils::{apply_gain, match_outcome, tournament_bonus, RatingError}
    }
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Replay accumulator for one season.
///
/// Tracks every player's running rating, keyed in first-seen order, and the
/// snapshots the replay has produced so far. Nothing here touches the store;
/// the finished snapshot set is handed to the store in one piece.
pub struct RatingTracker {
    season_id: SeasonId,
    season_start: DateTime<Utc>,
    ratings: IndexMap<PlayerId, i32>,
    snapshots: Vec<RatingSnapshot>
}

impl RatingTracker {
    pub fn new(season: &Season) -> RatingTracker {
        RatingTracker {
            season_id: season.id,
            season_start: season.start,
            ratings: IndexMap::new(),
            snapshots: Vec::new()
        }
    }

    /// Returns the current rating value for the player, if they have been seen.
    pub fn get_rating(&self, player_id: PlayerId) -> Option<i32> {
        self.ratings.get(&player_id).copied()
    }

    pub fn player_count(&self) -> usize {
        self.ratings.len()
    }

    pub fn snapshots(&self) -> &[RatingSnapshot] {
        &self.snapshots
    }

    pub fn into_snapshots(self) -> Vec<RatingSnapshot> {
        self.snapshots
    }

    /// Current rating of the player. On first sight the player is seeded at
    /// `STARTING_ELO` with a baseline snapshot at the season's start instant.
    fn current_or_seed(&mut self, player_id: PlayerId) -> i32 {
        if let Some(elo) = self.get_rating(player_id) {
            return elo;
        }

        self.ratings.insert(player_id, STARTING_ELO);
        self.record(
            player_id,
            STARTING_ELO,
            self.season_start,
            CalculationMetadata::SeasonStart
        );

        STARTING_ELO
    }

    fn record(&mut self, player_id: PlayerId, elo: i32, timestamp: DateTime<Utc>, metadata: CalculationMetadata) {
        self.ratings.insert(player_id, elo);
        self.snapshots.push(RatingSnapshot {
            id: Uuid::new_v4(),
            player_id,
            season_id: self.season_id,
            sequence: self.snapshots.len() as i32,
            elo,
            timestamp,
            calculation_metadata: metadata
        });
    }

    /// Applies a win/loss and records one snapshot per participant, winner first
    pub fn apply_match(&mut self, match_: &Match) -> Result<(), RatingError> {
        if match_.winner == match_.loser {
            return Err(RatingError::SelfMatch(match_.winner));
        }

        let winner_elo = self.current_or_seed(match_.winner);
        let loser_elo = self.current_or_seed(match_.loser);
        let outcome = match_outcome(winner_elo, loser_elo)?;

        self.record(
            match_.winner,
            outcome.new_winner_elo,
            match_.date,
            CalculationMetadata::MatchWin {
                match_id: match_.id,
                opponent_id: match_.loser,
                points_transferred: outcome.points_transferred,
                previous_elo: winner_elo,
                new_elo: outcome.new_winner_elo
            }
        );
        self.record(
            match_.loser,
            outcome.new_loser_elo,
            match_.date,
            CalculationMetadata::MatchLoss {
                match_id: match_.id,
                opponent_id: match_.winner,
                points_transferred: outcome.points_transferred,
                previous_elo: loser_elo,
                new_elo: outcome.new_loser_elo
            }
        );

        Ok(())
    }

    pub fn apply_tournament(&mut self, tournament: &Tournament) -> Result<(), RatingError> {
        let previous_elo = self.current_or_seed(tournament.winner);
        let bonus = tournament_bonus(previous_elo)?;
        let new_elo = apply_gain(previous_elo, bonus)?;

        self.record(
            tournament.winner,
            new_elo,
            tournament.date,
            CalculationMetadata::TournamentBonus {
                tournament_id: tournament.id,
                tournament_bonus: bonus,
                previous_elo,
                new_elo
            }
        );

        Ok(())
    }
}
