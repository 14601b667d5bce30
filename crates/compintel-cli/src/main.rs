mod cycle;
mod monitoring;

use clap::{Parser, Subcommand};
use compintel_core::{AppConfig, Frequency, Platform, Priority};
use compintel_pipeline::MonitoringRequest;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::monitoring::MonitoringCommands;

#[derive(Debug, Parser)]
#[command(name = "compintel-cli")]
#[command(about = "Competitive intelligence pipeline operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Run one processing cycle (due jobs, then analysis) and exit
    RunCycle,
    /// Create monitoring jobs for a competitor
    Schedule {
        #[arg(long)]
        competitor: Uuid,
        #[arg(long)]
        user: Uuid,
        /// Platform to monitor; repeat for several. Defaults to linkedin and twitter
        #[arg(long = "platform")]
        platforms: Vec<Platform>,
        #[arg(long, default_value = "daily", value_parser = parse_frequency)]
        frequency: Frequency,
        #[arg(long, default_value = "medium")]
        priority: Priority,
    },
    #[command(flatten)]
    Monitoring(MonitoringCommands),
    /// Delete job results older than the retention window
    Cleanup {
        /// Days of results to keep; defaults to COMPINTEL_RESULT_RETENTION_DAYS
        #[arg(long)]
        days: Option<u32>,
    },
    /// Score a piece of text with the sentiment lexicon
    Sentiment { text: String },
}

fn parse_frequency(raw: &str) -> Result<Frequency, String> {
    let frequency = Frequency::parse_lossy(raw);
    if frequency.as_str() == raw.trim().to_ascii_lowercase() {
        Ok(frequency)
    } else {
        Err(format!("expected hourly, daily or weekly, got '{raw}'"))
    }
}

/// A configured connection for commands that touch the database.
struct Database {
    pool: sqlx::PgPool,
    config: AppConfig,
}

async fn connect() -> anyhow::Result<Database> {
    let config = compintel_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = compintel_db::PoolConfig::from_app_config(&config);
    let pool = compintel_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(Database { pool, config })
}

fn print_sentiment(text: &str) {
    let sentiment = compintel_analysis::analyze_sentiment(text);
    println!("{} ({:+.2})", sentiment.label.as_str(), sentiment.score);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Migrate) => {
            let db = connect().await?;
            let applied = compintel_db::run_migrations(&db.pool).await?;
            println!("migrations applied: {applied}");
        }
        Some(Commands::RunCycle) => {
            let db = connect().await?;
            cycle::run_cycle(&db.pool, &db.config).await?;
        }
        Some(Commands::Schedule {
            competitor,
            user,
            platforms,
            frequency,
            priority,
        }) => {
            let db = connect().await?;
            let request = MonitoringRequest {
                platforms: (!platforms.is_empty()).then_some(platforms),
                frequency,
                priority,
                ..MonitoringRequest::default()
            };
            monitoring::run_schedule(&db.pool, &db.config, competitor, user, &request).await?;
        }
        Some(Commands::Monitoring(command)) => {
            let db = connect().await?;
            monitoring::run_monitoring_command(&db.pool, &db.config, command).await?;
        }
        Some(Commands::Cleanup { days }) => {
            let db = connect().await?;
            let days = days.unwrap_or(db.config.result_retention_days);
            monitoring::run_cleanup(&db.pool, &db.config, days).await?;
        }
        Some(Commands::Sentiment { text }) => print_sentiment(&text),
        None => println!("compintel-cli: no command given; see --help"),
    }

    Ok(())
}
