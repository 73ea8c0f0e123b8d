// Rating model constants
pub const STARTING_ELO: i32 = 100;
pub const LOSS_FRACTION: f64 = 0.08;
pub const WIN_BONUS: i32 = 2;
pub const TOURNAMENT_BONUS_FRACTION: f64 = 0.08;
// Inactivity decay
pub const INACTIVITY_PERIOD_DAYS: u32 = 60;
pub const INACTIVITY_DECAY_FRACTION: f64 = 0.08;
pub const MILLIS_PER_DAY: f64 = 86_400_000.0;
