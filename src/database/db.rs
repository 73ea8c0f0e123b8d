use super::{
    db_structs::{
        CalculationMetadata, Match, MatchId, Player, PlayerId, RatingSnapshot, Season, SeasonId, Tournament,
        TournamentId
    },
    store::{RecordStore, StoreError}
};
use crate::model::structures::snapshot_reason::SnapshotReason;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postgres_types::ToSql;
use std::{str::FromStr, sync::Arc};
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{error, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = include_str!("schema.sql");

const SNAPSHOT_COLUMNS: &str = "id, player_id, season_id, sequence, elo, timestamp, reason, match_id, \
    tournament_id, opponent_id, points_transferred, bonus, previous_elo";

/// PostgreSQL-backed record store.
///
/// Reads share one connection. Snapshot replacement runs on a second, dedicated
/// connection inside a transaction so readers never see a half-written season.
#[derive(Clone)]
pub struct DbClient {
    client: Arc<Client>,
    writer: Arc<Mutex<Client>>
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str) -> Result<Self, StoreError> {
        let client = Self::open(connection_str).await?;
        let writer = Self::open(connection_str).await?;

        Ok(DbClient {
            client: Arc::new(client),
            writer: Arc::new(Mutex::new(writer))
        })
    }

    async fn open(connection_str: &str) -> Result<Client, StoreError> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls).await?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        Ok(client)
    }

    /// Creates any missing tables and indexes
    pub async fn migrate(&self) -> Result<(), StoreError> {
        self.client.batch_execute(SCHEMA).await?;

        info!("Schema applied");
        Ok(())
    }

    // Access the underlying read client
    pub fn client(&self) -> Arc<Client> {
        Arc::clone(&self.client)
    }

    fn season_from_row(row: &Row) -> Result<Season, StoreError> {
        Ok(Season {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            start: row.try_get("start_time")?,
            end: row.try_get("end_time")?,
            deleted: row.try_get("deleted")?
        })
    }

    fn match_from_row(row: &Row) -> Result<Match, StoreError> {
        Ok(Match {
            id: row.try_get("id")?,
            date: row.try_get("date")?,
            tournament: row.try_get("tournament_id")?,
            winner: row.try_get("winner_id")?,
            loser: row.try_get("loser_id")?,
            deleted: row.try_get("deleted")?
        })
    }

    fn tournament_from_row(row: &Row) -> Result<Tournament, StoreError> {
        Ok(Tournament {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            date: row.try_get("date")?,
            winner: row.try_get("winner_id")?,
            deleted: row.try_get("deleted")?
        })
    }

    fn player_from_row(row: &Row) -> Result<Player, StoreError> {
        Ok(Player {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            image: row.try_get("image")?,
            deleted: row.try_get("deleted")?
        })
    }

    fn snapshot_from_row(row: &Row) -> Result<RatingSnapshot, StoreError> {
        let id: Uuid = row.try_get("id")?;
        let reason: String = row.try_get("reason")?;
        let reason = SnapshotReason::from_str(&reason)
            .map_err(|_| StoreError::Corrupt(format!("snapshot {} has unknown reason '{}'", id, reason)))?;

        let required = |column: &str| -> Result<i32, StoreError> {
            row.try_get::<_, Option<i32>>(column)?
                .ok_or_else(|| StoreError::Corrupt(format!("snapshot {} is missing {}", id, column)))
        };

        let elo: i32 = row.try_get("elo")?;
        let calculation_metadata = match reason {
            SnapshotReason::SeasonStart => CalculationMetadata::SeasonStart,
            SnapshotReason::MatchWin => CalculationMetadata::MatchWin {
                match_id: MatchId(required("match_id")?),
                opponent_id: PlayerId(required("opponent_id")?),
                points_transferred: required("points_transferred")?,
                previous_elo: required("previous_elo")?,
                new_elo: elo
            },
            SnapshotReason::MatchLoss => CalculationMetadata::MatchLoss {
                match_id: MatchId(required("match_id")?),
                opponent_id: PlayerId(required("opponent_id")?),
                points_transferred: required("points_transferred")?,
                previous_elo: required("previous_elo")?,
                new_elo: elo
            },
            SnapshotReason::TournamentBonus => CalculationMetadata::TournamentBonus {
                tournament_id: TournamentId(required("tournament_id")?),
                tournament_bonus: required("bonus")?,
                previous_elo: required("previous_elo")?,
                new_elo: elo
            }
        };

        Ok(RatingSnapshot {
            id,
            player_id: row.try_get("player_id")?,
            season_id: row.try_get("season_id")?,
            sequence: row.try_get("sequence")?,
            elo,
            timestamp: row.try_get("timestamp")?,
            calculation_metadata
        })
    }

    async fn query_snapshots(
        &self,
        filter: &str,
        params: &[&(dyn ToSql + Sync)]
    ) -> Result<Vec<RatingSnapshot>, StoreError> {
        let sql = format!(
            "SELECT {} FROM rating_snapshots WHERE {} ORDER BY season_id, sequence",
            SNAPSHOT_COLUMNS, filter
        );

        self.client
            .query(sql.as_str(), params)
            .await?
            .iter()
            .map(Self::snapshot_from_row)
            .collect()
    }
}

/// Flattened metadata columns:
/// (match_id, tournament_id, opponent_id, points_transferred, bonus, previous_elo)
type MetadataColumns = (
    Option<MatchId>,
    Option<TournamentId>,
    Option<PlayerId>,
    Option<i32>,
    Option<i32>,
    Option<i32>
);

fn metadata_columns(metadata: &CalculationMetadata) -> MetadataColumns {
    match *metadata {
        CalculationMetadata::SeasonStart => (None, None, None, None, None, None),
        CalculationMetadata::MatchWin {
            match_id,
            opponent_id,
            points_transferred,
            previous_elo,
            ..
        }
        | CalculationMetadata::MatchLoss {
            match_id,
            opponent_id,
            points_transferred,
            previous_elo,
            ..
        } => (
            Some(match_id),
            None,
            Some(opponent_id),
            Some(points_transferred),
            None,
            Some(previous_elo)
        ),
        CalculationMetadata::TournamentBonus {
            tournament_id,
            tournament_bonus,
            previous_elo,
            ..
        } => (None, Some(tournament_id), None, None, Some(tournament_bonus), Some(previous_elo))
    }
}

/// Insert parameters in `SNAPSHOT_COLUMNS` order
#[allow(clippy::ptr_arg)]
fn snapshot_params<'a>(
    s: &'a RatingSnapshot,
    reason: &'a String,
    meta: &'a MetadataColumns
) -> [&'a (dyn ToSql + Sync); 13] {
    [
        &s.id,
        &s.player_id,
        &s.season_id,
        &s.sequence,
        &s.elo,
        &s.timestamp,
        reason,
        &meta.0,
        &meta.1,
        &meta.2,
        &meta.3,
        &meta.4,
        &meta.5
    ]
}

#[async_trait]
impl RecordStore for DbClient {
    async fn get_season(&self, id: SeasonId) -> Result<Option<Season>, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT id, name, start_time, end_time, deleted FROM seasons WHERE id = $1",
                &[&id]
            )
            .await?;

        row.as_ref().map(Self::season_from_row).transpose()
    }

    async fn list_seasons(&self) -> Result<Vec<Season>, StoreError> {
        self.client
            .query(
                "SELECT id, name, start_time, end_time, deleted FROM seasons ORDER BY id",
                &[]
            )
            .await?
            .iter()
            .map(Self::season_from_row)
            .collect()
    }

    async fn matches_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Match>, StoreError> {
        self.client
            .query(
                "SELECT id, date, tournament_id, winner_id, loser_id, deleted FROM matches \
                WHERE date >= $1 AND date <= $2 ORDER BY date, id",
                &[&start, &end]
            )
            .await?
            .iter()
            .map(Self::match_from_row)
            .collect()
    }

    async fn tournaments_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>
    ) -> Result<Vec<Tournament>, StoreError> {
        self.client
            .query(
                "SELECT id, name, date, winner_id, deleted FROM tournaments \
                WHERE date >= $1 AND date <= $2 ORDER BY date, id",
                &[&start, &end]
            )
            .await?
            .iter()
            .map(Self::tournament_from_row)
            .collect()
    }

    async fn get_players(&self, ids: &[PlayerId]) -> Result<Vec<Player>, StoreError> {
        self.client
            .query(
                "SELECT id, name, image, deleted FROM players WHERE id = ANY($1) ORDER BY id",
                &[&ids]
            )
            .await?
            .iter()
            .map(Self::player_from_row)
            .collect()
    }

    #[instrument(skip(self, snapshots), fields(count = snapshots.len()))]
    async fn replace_season_snapshots(&self, season: SeasonId, snapshots: &[RatingSnapshot]) -> Result<(), StoreError> {
        let mut writer = self.writer.lock().await;
        let transaction = writer.transaction().await?;

        let deleted = transaction
            .execute("DELETE FROM rating_snapshots WHERE season_id = $1", &[&season])
            .await?;

        let insert = transaction
            .prepare(
                format!(
                    "INSERT INTO rating_snapshots ({}) \
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
                    SNAPSHOT_COLUMNS
                )
                .as_str()
            )
            .await?;

        let rows: Vec<(String, MetadataColumns)> = snapshots
            .iter()
            .map(|s| (s.reason().to_string(), metadata_columns(&s.calculation_metadata)))
            .collect();

        // Pipelined on the single transaction connection
        let (tx, stmt) = (&transaction, &insert);
        let inserts = snapshots
            .iter()
            .zip(rows.iter())
            .map(|(s, (reason, meta))| async move { tx.execute(stmt, &snapshot_params(s, reason, meta)).await });
        futures::future::try_join_all(inserts).await?;

        transaction.commit().await?;

        info!(deleted, inserted = snapshots.len(), "Season snapshots replaced");
        Ok(())
    }

    async fn season_snapshots(&self, season: SeasonId) -> Result<Vec<RatingSnapshot>, StoreError> {
        self.query_snapshots("season_id = $1", &[&season]).await
    }

    async fn player_snapshots(&self, player: PlayerId, season: SeasonId) -> Result<Vec<RatingSnapshot>, StoreError> {
        self.query_snapshots("player_id = $1 AND season_id = $2", &[&player, &season])
            .await
    }

    async fn match_snapshots(&self, match_id: MatchId) -> Result<Vec<RatingSnapshot>, StoreError> {
        self.query_snapshots("match_id = $1", &[&match_id]).await
    }

    async fn player_snapshot_seasons(&self, player: PlayerId) -> Result<Vec<SeasonId>, StoreError> {
        self.client
            .query(
                "SELECT DISTINCT season_id FROM rating_snapshots WHERE player_id = $1 ORDER BY season_id",
                &[&player]
            )
            .await?
            .iter()
            .map(|row| row.try_get("season_id").map_err(StoreError::from))
            .collect()
    }
}
