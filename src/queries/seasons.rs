use std::cmp::Reverse;

use super::SnapshotQueries;
use crate::{
    database::{db_structs::Season, store::RecordStore},
    error::ProcessorError
};
use chrono::{DateTime, Utc};
use tracing::instrument;

impl<S: RecordStore> SnapshotQueries<S> {
    /// The live season whose window contains `now`. Overlaps resolve to the
    /// latest start, then the lowest id.
    #[instrument(skip(self))]
    pub async fn get_current_season(&self, now: DateTime<Utc>) -> Result<Option<Season>, ProcessorError> {
        Ok(self
            .store
            .list_seasons()
            .await?
            .into_iter()
            .filter(|s| !s.deleted && s.contains(now))
            .min_by_key(|s| (Reverse(s.start), s.id)))
    }
}
