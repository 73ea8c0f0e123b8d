use std::{error::Error, process, sync::Arc};

use chrono::Utc;
use clap::Parser;
use season_elo_processor::{
    args::Args,
    database::{db::DbClient, db_structs::SeasonId},
    model::{season_model::SeasonProcessor, structures::recalculation_summary::RecalculationSummary},
    queries::{leaderboard::LeaderboardEntry, SnapshotQueries}
};
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SeasonReport {
    #[serde(flatten)]
    summary: RecalculationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    leaderboard: Option<Vec<LeaderboardEntry>>
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level);

    let Some(connection_string) = args.connection_string.clone() else {
        error!("CONNECTION_STRING environment variable must be set");
        process::exit(1);
    };

    let client = match DbClient::connect(&connection_string).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            error!("Application cannot start without a valid database connection");
            process::exit(1);
        }
    };

    if let Err(e) = run(args, Arc::new(client)).await {
        error!("Processing failed: {}", e);
        process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();
}

async fn run(args: Args, client: Arc<DbClient>) -> Result<(), Box<dyn Error>> {
    if args.migrate {
        info!("Applying schema");
        client.migrate().await?;
    }

    let processor = SeasonProcessor::new(Arc::clone(&client));
    let queries = SnapshotQueries::new(client);
    let now = Utc::now();

    let summaries = if args.all {
        processor.recalculate_all_seasons().await?
    } else {
        let seasons: Vec<SeasonId> = if args.seasons.is_empty() {
            match queries.get_current_season(now).await? {
                Some(season) => vec![season.id],
                None => {
                    warn!("No season contains the current time, nothing to recalculate");
                    Vec::new()
                }
            }
        } else {
            args.seasons.clone()
        };

        let mut summaries = Vec::with_capacity(seasons.len());
        for season in seasons {
            summaries.push(processor.recalculate_season_elo(season).await?);
        }

        summaries
    };

    let mut reports = Vec::with_capacity(summaries.len());
    for summary in summaries {
        let leaderboard = match args.leaderboard {
            Some(n) => Some(queries.get_season_leaderboard(summary.season_id, Some(n), now).await?),
            None => None
        };

        reports.push(SeasonReport { summary, leaderboard });
    }

    println!("{}", serde_json::to_string_pretty(&reports)?);
    info!(seasons = reports.len(), "Processing complete");

    Ok(())
}
