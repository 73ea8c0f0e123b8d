use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use season_elo_processor::database::{
    db::DbClient,
    db_structs::{MatchId, PlayerId, SeasonId, TournamentId}
};
use std::sync::Arc;
use testcontainers::{clients::Cli, Container};
use testcontainers_modules::postgres::Postgres;
use tokio_postgres::{Client, NoTls};

pub struct TestDatabase {
    pub connection_string: String,
    _container: Container<'static, Postgres>
}

/// Ids of the rows inserted by [`TestDatabase::seed_test_data`]
pub struct SeedData {
    pub players: Vec<PlayerId>,
    pub season: SeasonId,
    pub matches: Vec<MatchId>,
    pub tournament: TournamentId
}

impl TestDatabase {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Create a static CLI instance
        lazy_static! {
            static ref DOCKER: Arc<Cli> = Arc::new(Cli::default());
        }

        // Start PostgreSQL container
        let container = DOCKER.run(Postgres::default());
        let port = container.get_host_port_ipv4(5432);

        let connection_string = format!(
            "host=localhost port={} user=postgres password=postgres dbname=postgres",
            port
        );

        // Load and execute schema
        let client = DbClient::connect(&connection_string).await?;
        client.migrate().await?;

        Ok(TestDatabase {
            connection_string,
            _container: container
        })
    }

    pub async fn get_client(&self) -> Result<Client, Box<dyn std::error::Error>> {
        let (client, connection) = tokio_postgres::connect(&self.connection_string, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                eprintln!("Database connection error: {}", e);
            }
        });

        Ok(client)
    }

    pub async fn connect(&self) -> DbClient {
        DbClient::connect(&self.connection_string)
            .await
            .expect("Failed to connect")
    }

    /// Four players, one 2024 season, three matches (one of them outside the
    /// season, one soft-deleted) and a tournament won by the first player.
    pub async fn seed_test_data(&self) -> Result<SeedData, Box<dyn std::error::Error>> {
        let client = self.get_client().await?;

        client
            .execute(
                "INSERT INTO players (name, image) VALUES
                 ('TestPlayer1', 'https://img.example/1.png'),
                 ('TestPlayer2', NULL),
                 ('TestPlayer3', NULL),
                 ('TestPlayer4', NULL)",
                &[]
            )
            .await?;

        let players: Vec<PlayerId> = client
            .query("SELECT id FROM players ORDER BY id", &[])
            .await?
            .iter()
            .map(|row| row.get(0))
            .collect();

        let season: SeasonId = client
            .query_one(
                "INSERT INTO seasons (name, start_time, end_time) VALUES
                 ('Season 2024', '2024-01-01 00:00:00+00', '2024-12-31 23:59:59+00')
                 RETURNING id",
                &[]
            )
            .await?
            .get(0);

        let tournament: TournamentId = client
            .query_one(
                "INSERT INTO tournaments (name, date, winner_id) VALUES
                 ('Spring Open', '2024-05-01 12:00:00+00', $1)
                 RETURNING id",
                &[&players[0]]
            )
            .await?
            .get(0);

        let matches: Vec<MatchId> = client
            .query(
                "INSERT INTO matches (date, tournament_id, winner_id, loser_id, deleted) VALUES
                 ('2024-02-01 12:00:00+00', $1, $2, $3, FALSE),
                 ('2024-03-01 12:00:00+00', NULL, $3, $2, FALSE),
                 ('2024-03-15 12:00:00+00', NULL, $4, $5, TRUE),
                 ('2025-02-01 12:00:00+00', NULL, $4, $5, FALSE)
                 RETURNING id",
                &[&tournament, &players[0], &players[1], &players[2], &players[3]]
            )
            .await?
            .iter()
            .map(|row| row.get(0))
            .collect();

        Ok(SeedData {
            players,
            season,
            matches,
            tournament
        })
    }

    pub async fn insert_match(
        &self,
        date: DateTime<Utc>,
        winner: PlayerId,
        loser: PlayerId
    ) -> Result<MatchId, Box<dyn std::error::Error>> {
        let client = self.get_client().await?;

        Ok(client
            .query_one(
                "INSERT INTO matches (date, winner_id, loser_id) VALUES ($1, $2, $3) RETURNING id",
                &[&date, &winner, &loser]
            )
            .await?
            .get(0))
    }

    pub async fn snapshot_count(&self, season: SeasonId) -> Result<i64, Box<dyn std::error::Error>> {
        let client = self.get_client().await?;

        Ok(client
            .query_one("SELECT COUNT(*) FROM rating_snapshots WHERE season_id = $1", &[&season])
            .await?
            .get(0))
    }
}
