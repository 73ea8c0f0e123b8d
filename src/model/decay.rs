use super::constants::{INACTIVITY_DECAY_FRACTION, INACTIVITY_PERIOD_DAYS, MILLIS_PER_DAY};
use crate::model::rating_utils::RatingError;
use chrono::{DateTime, Utc};

/// # How this works
/// - A player's last rating-affecting event happened at time T
/// - The leaderboard is read at time D (`now`), capped at the season's end
/// - For every whole `INACTIVITY_PERIOD_DAYS` between T and min(D, season end),
///     the rating shrinks by `INACTIVITY_DECAY_FRACTION`, compounding.
///
/// The returned value is the number of points lost. It is never persisted;
/// callers compute it on every read.
pub fn inactivity_penalty(
    current_elo: i32,
    last_event: DateTime<Utc>,
    now: DateTime<Utc>,
    season_end: DateTime<Utc>
) -> Result<i32, RatingError> {
    if current_elo < 0 {
        return Err(RatingError::NegativeRating(current_elo));
    }

    let periods = decay_periods(last_event, now.min(season_end));
    if periods == 0 {
        return Ok(0);
    }

    let decayed = current_elo as f64 * decay_factor(periods);

    Ok((current_elo as f64 - decayed).floor() as i32)
}

/// Number of whole inactivity periods between the last event and `effective_now`.
/// An event that lies after `effective_now` counts as zero elapsed time.
pub fn decay_periods(last_event: DateTime<Utc>, effective_now: DateTime<Utc>) -> u32 {
    let elapsed_days = (effective_now - last_event).num_milliseconds() as f64 / MILLIS_PER_DAY;
    if elapsed_days <= 0.0 {
        return 0;
    }

    (elapsed_days / INACTIVITY_PERIOD_DAYS as f64).floor() as u32
}

/// Multiplier remaining after `periods` compounding decays
fn decay_factor(periods: u32) -> f64 {
    (1.0 - INACTIVITY_DECAY_FRACTION).powi(periods.min(i32::MAX as u32) as i32)
}
