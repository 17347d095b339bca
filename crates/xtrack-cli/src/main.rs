mod campaigns;
mod scrape;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::campaigns::CampaignsCommands;

#[derive(Debug, Parser)]
#[command(name = "xtrack-cli")]
#[command(about = "xtrack campaign mention tracker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Manage campaigns
    Campaigns {
        #[command(subcommand)]
        command: CampaignsCommands,
    },
    /// Run a scrape for one campaign
    Scrape {
        /// Campaign slug or id
        #[arg(long)]
        campaign: String,
        /// Lookback window in days (defaults to the campaign's own setting)
        #[arg(long)]
        days: Option<i32>,
    },
    /// Print engagement metrics for one campaign
    Metrics {
        /// Campaign slug or id
        #[arg(long)]
        campaign: String,
        /// Number of most recent posts to aggregate
        #[arg(long, default_value = "200")]
        limit: i64,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("xtrack-cli: no command given; run with --help for usage");
        return Ok(());
    };

    let config = xtrack_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = xtrack_db::PoolConfig::from_app_config(&config);
    let pool = xtrack_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                xtrack_db::health_check(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => {
                let applied = xtrack_db::run_migrations(&pool).await?;
                println!("migrations up to date ({applied} applied)");
            }
        },
        Commands::Campaigns { command } => campaigns::run(&pool, command).await?,
        Commands::Scrape { campaign, days } => {
            scrape::run_scrape(&pool, &config, &campaign, days).await?;
        }
        Commands::Metrics { campaign, limit } => {
            scrape::run_metrics(&pool, &campaign, limit).await?;
        }
    }

    Ok(())
}
