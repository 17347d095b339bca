//! Campaign management command handlers for the CLI.

use clap::Subcommand;
use uuid::Uuid;
use xtrack_core::CampaignInput;
use xtrack_db::CampaignRow;

/// Sub-commands available under `campaigns`.
#[derive(Debug, Subcommand)]
pub enum CampaignsCommands {
    /// List campaigns, newest first
    List,
    /// Create a campaign
    Create {
        /// Display name
        #[arg(long)]
        name: String,
        /// Search keyword (repeat for several)
        #[arg(long = "keyword", required = true)]
        keywords: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        /// Default lookback window in days
        #[arg(long)]
        scrape_days: Option<i32>,
        /// Minimum likes + retweets + replies for a post to be kept
        #[arg(long)]
        min_engagement: Option<i64>,
        /// Maximum likes + retweets + replies for a post to be kept
        #[arg(long)]
        max_engagement: Option<i64>,
    },
    /// Delete a campaign with all of its keywords, runs, and posts
    Delete {
        /// Campaign slug or id
        #[arg(long)]
        campaign: String,
    },
}

pub(crate) async fn run(pool: &sqlx::PgPool, command: CampaignsCommands) -> anyhow::Result<()> {
    match command {
        CampaignsCommands::List => run_campaigns_list(pool).await,
        CampaignsCommands::Create {
            name,
            keywords,
            description,
            scrape_days,
            min_engagement,
            max_engagement,
        } => {
            let input = CampaignInput {
                name,
                description,
                keywords,
                scrape_days,
                min_engagement,
                max_engagement,
            };
            run_campaigns_create(pool, input).await
        }
        CampaignsCommands::Delete { campaign } => run_campaigns_delete(pool, &campaign).await,
    }
}

/// Look up a campaign by id or slug.
///
/// # Errors
///
/// Returns an error if nothing matches or the query fails.
pub(crate) async fn resolve_campaign(
    pool: &sqlx::PgPool,
    key: &str,
) -> anyhow::Result<CampaignRow> {
    if let Ok(id) = Uuid::parse_str(key) {
        if let Some(row) = xtrack_db::get_campaign(pool, id).await? {
            return Ok(row);
        }
    }

    xtrack_db::get_campaign_by_slug(pool, key)
        .await?
        .ok_or_else(|| anyhow::anyhow!("campaign '{key}' not found"))
}

async fn run_campaigns_list(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let campaigns = xtrack_db::list_campaigns(pool).await?;
    if campaigns.is_empty() {
        println!("no campaigns yet; create one with `campaigns create`");
        return Ok(());
    }

    let ids: Vec<Uuid> = campaigns.iter().map(|c| c.id).collect();
    let keywords = xtrack_db::list_keywords_for_campaigns(pool, &ids).await?;

    println!("{:<38}{:<28}{:<6}KEYWORDS", "ID", "SLUG", "DAYS");
    for campaign in &campaigns {
        let kws: Vec<&str> = keywords
            .iter()
            .filter(|k| k.campaign_id == campaign.id)
            .map(|k| k.keyword.as_str())
            .collect();
        println!(
            "{:<38}{:<28}{:<6}{}",
            campaign.id,
            campaign.slug,
            campaign.scrape_days,
            kws.join(", ")
        );
    }

    Ok(())
}

async fn run_campaigns_create(pool: &sqlx::PgPool, input: CampaignInput) -> anyhow::Result<()> {
    let campaign = input.validate()?;
    let slug = xtrack_core::generate_slug(&campaign.name);
    let (row, keywords) = xtrack_db::create_campaign(pool, &slug, &campaign).await?;
    tracing::info!(campaign_id = %row.id, slug = %row.slug, "campaign created");

    println!(
        "created campaign {} ({}) with {} keywords",
        row.slug,
        row.id,
        keywords.len()
    );
    Ok(())
}

async fn run_campaigns_delete(pool: &sqlx::PgPool, key: &str) -> anyhow::Result<()> {
    let campaign = resolve_campaign(pool, key).await?;
    let deleted = xtrack_db::delete_campaign(pool, campaign.id).await?;
    tracing::info!(
        campaign_id = %campaign.id,
        posts = deleted.posts,
        scrape_runs = deleted.scrape_runs,
        keywords = deleted.keywords,
        "campaign deleted"
    );

    println!(
        "deleted campaign {}: {} posts, {} runs, {} keywords",
        campaign.slug, deleted.posts, deleted.scrape_runs, deleted.keywords
    );
    Ok(())
}
