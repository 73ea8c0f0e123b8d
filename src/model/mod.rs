pub mod constants;
pub mod decay;
pub mod events;
pub mod rating_tracker;
pub mod rating_utils;
pub mod season_locks;
pub mod season_model;
pub mod structures;
