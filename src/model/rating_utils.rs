use thiserror::Error;

use crate::{
    database::db_structs::PlayerId,
    model::constants::{LOSS_FRACTION, TOURNAMENT_BONUS_FRACTION, WIN_BONUS}
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RatingError {
    #[error("Rating must be non-negative, got {0}")]
    NegativeRating(i32),

    #[error("Rating overflowed while applying a change of {delta} to {rating}")]
    Overflow { rating: i32, delta: i32 },

    #[error("Player {0} cannot play a match against themselves")]
    SelfMatch(PlayerId)
}

/// Outcome of a single win/loss between two rated players
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub points_transferred: i32,
    pub new_winner_elo: i32,
    pub new_loser_elo: i32
}

/// The loser gives up `floor(loser * LOSS_FRACTION)` points to the winner,
/// who additionally receives a flat `WIN_BONUS`.
pub fn match_outcome(winner_elo: i32, loser_elo: i32) -> Result<MatchOutcome, RatingError> {
    ensure_non_negative(winner_elo)?;
    ensure_non_negative(loser_elo)?;

    let points_transferred = fraction_of(loser_elo, LOSS_FRACTION);
    let gain = points_transferred + WIN_BONUS;

    let new_winner_elo = winner_elo
        .checked_add(gain)
        .ok_or(RatingError::Overflow {
            rating: winner_elo,
            delta: gain
        })?;

    Ok(MatchOutcome {
        points_transferred,
        new_winner_elo,
        new_loser_elo: loser_elo - points_transferred
    })
}

/// Bonus awarded to a tournament winner, based on their rating at the time of the tournament
pub fn tournament_bonus(elo: i32) -> Result<i32, RatingError> {
    ensure_non_negative(elo)?;

    Ok(fraction_of(elo, TOURNAMENT_BONUS_FRACTION))
}

/// Applies a non-negative delta, failing instead of wrapping
pub fn apply_gain(elo: i32, delta: i32) -> Result<i32, RatingError> {
    elo.checked_add(delta)
        .ok_or(RatingError::Overflow { rating: elo, delta })
}

fn ensure_non_negative(elo: i32) -> Result<(), RatingError> {
    if elo < 0 {
        return Err(RatingError::NegativeRating(elo));
    }

    Ok(())
}

fn fraction_of(elo: i32, fraction: f64) -> i32 {
    // Always <= elo for fractions below 1, so the cast cannot overflow
    (elo as f64 * fraction).floor() as i32
}
