//! End-to-end scrape tests against a fresh database and a scripted provider.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;
use xtrack_core::{generate_slug, CampaignInput, NewCampaign};
use xtrack_db::{create_campaign, get_scrape_run, list_posts, list_scrape_runs};
use xtrack_pipeline::{run_scrape, PipelineError, ScrapeOptions};
use xtrack_search::{RawPost, SearchError, SearchPage, SearchProvider, SearchQuery};

// ---------------------------------------------------------------------------
// Scripted provider
// ---------------------------------------------------------------------------

/// Replays scripted responses in order; an exhausted script yields empty pages.
#[derive(Default)]
struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<SearchPage, SearchError>>>,
    queries: Mutex<Vec<SearchQuery>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Result<SearchPage, SearchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for ScriptedProvider {
    async fn search_page(&self, query: &SearchQuery) -> Result<SearchPage, SearchError> {
        self.queries.lock().unwrap().push(query.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SearchPage::default()))
    }
}

fn item(id: Option<&str>, likes: i64, retweets: i64, replies: i64) -> RawPost {
    RawPost {
        id: id.map(str::to_owned),
        text: Some("Fableborne looks great".to_owned()),
        like_count: Some(likes),
        retweet_count: Some(retweets),
        reply_count: Some(replies),
        view_count: Some(1_000),
        ..RawPost::default()
    }
}

fn last_page(items: Vec<RawPost>) -> Result<SearchPage, SearchError> {
    Ok(SearchPage {
        items,
        has_next_page: false,
        next_cursor: None,
    })
}

fn new_campaign(keywords: &[&str], min: i64, max: Option<i64>) -> NewCampaign {
    CampaignInput {
        name: "Fableborne".to_owned(),
        keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
        min_engagement: Some(min),
        max_engagement: max,
        ..CampaignInput::default()
    }
    .validate()
    .expect("valid campaign")
}

async fn seed_campaign(pool: &sqlx::PgPool, campaign: &NewCampaign) -> Uuid {
    let (row, _) = create_campaign(pool, &generate_slug(&campaign.name), campaign)
        .await
        .expect("create_campaign failed");
    row.id
}

fn options() -> ScrapeOptions {
    ScrapeOptions {
        days: None,
        max_items: 500,
        inter_request_delay_ms: 0,
    }
}

// ---------------------------------------------------------------------------
// Happy paths
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn items_without_id_are_dropped(pool: sqlx::PgPool) {
    let campaign_id = seed_campaign(&pool, &new_campaign(&["fableborne"], 0, None)).await;
    let provider = ScriptedProvider::new(vec![last_page(vec![
        item(Some("101"), 5, 1, 0),
        item(None, 50, 10, 2),
        item(Some("102"), 0, 0, 0),
    ])]);

    let outcome = run_scrape(&pool, &provider, campaign_id, &options())
        .await
        .expect("run_scrape failed");
    assert_eq!(outcome.posts_found, 2);

    let run = get_scrape_run(&pool, outcome.run_id).await.expect("get run");
    assert_eq!(run.status, "completed");
    assert_eq!(run.posts_found, 2);
    assert!(run.completed_at.is_some());

    let posts = list_posts(&pool, Some(campaign_id), 100).await.expect("list posts");
    let mut ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["101", "102"]);
    assert!(posts.iter().all(|p| p.scrape_run_id == Some(outcome.run_id)));
    assert!(posts
        .iter()
        .all(|p| p.matched_keyword.as_deref() == Some("fableborne")));
}

#[sqlx::test(migrations = "../../migrations")]
async fn engagement_bounds_filter_posts(pool: sqlx::PgPool) {
    let campaign_id = seed_campaign(&pool, &new_campaign(&["fableborne"], 10, Some(50))).await;
    let provider = ScriptedProvider::new(vec![last_page(vec![
        item(Some("nine"), 9, 0, 0),
        item(Some("ten"), 8, 1, 1),
        item(Some("fifty"), 40, 5, 5),
        item(Some("fifty-one"), 51, 0, 0),
    ])]);

    let outcome = run_scrape(&pool, &provider, campaign_id, &options())
        .await
        .expect("run_scrape failed");
    assert_eq!(outcome.posts_found, 2);

    let mut ids: Vec<String> = list_posts(&pool, Some(campaign_id), 100)
        .await
        .expect("list posts")
        .into_iter()
        .map(|p| p.id)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["fifty", "ten"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicates_across_keywords_keep_first_keyword(pool: sqlx::PgPool) {
    let campaign_id = seed_campaign(&pool, &new_campaign(&["alpha", "beta"], 0, None)).await;
    let provider = ScriptedProvider::new(vec![
        last_page(vec![item(Some("shared"), 1, 0, 0)]),
        last_page(vec![item(Some("shared"), 9, 0, 0), item(Some("only-beta"), 1, 0, 0)]),
    ]);

    let outcome = run_scrape(&pool, &provider, campaign_id, &options())
        .await
        .expect("run_scrape failed");
    assert_eq!(outcome.posts_found, 2);

    let posts = list_posts(&pool, Some(campaign_id), 100).await.expect("list posts");
    let shared = posts.iter().find(|p| p.id == "shared").expect("shared post");
    assert_eq!(shared.matched_keyword.as_deref(), Some("alpha"));
    assert_eq!(shared.likes, 1);

    let queries = provider.queries();
    assert_eq!(queries.len(), 2);
    assert!(queries[0].query.starts_with("alpha since:"));
    assert!(queries[0].query.ends_with(" lang:en"));
    assert!(queries[1].query.starts_with("beta since:"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn zero_results_complete_with_zero_posts(pool: sqlx::PgPool) {
    let campaign_id = seed_campaign(&pool, &new_campaign(&["quiet"], 0, None)).await;
    let provider = ScriptedProvider::new(vec![last_page(Vec::new())]);

    let outcome = run_scrape(&pool, &provider, campaign_id, &options())
        .await
        .expect("run_scrape failed");
    assert_eq!(outcome.posts_found, 0);

    let run = get_scrape_run(&pool, outcome.run_id).await.expect("get run");
    assert_eq!(run.status, "completed");
}

#[sqlx::test(migrations = "../../migrations")]
async fn item_cap_spans_keywords(pool: sqlx::PgPool) {
    let campaign_id = seed_campaign(&pool, &new_campaign(&["alpha", "beta", "gamma"], 0, None)).await;
    let provider = ScriptedProvider::new(vec![
        last_page(vec![item(Some("a1"), 0, 0, 0), item(Some("a2"), 0, 0, 0)]),
        last_page(vec![item(Some("b1"), 0, 0, 0), item(Some("b2"), 0, 0, 0)]),
        last_page(vec![item(Some("g1"), 0, 0, 0)]),
    ]);
    let capped = ScrapeOptions {
        max_items: 3,
        ..options()
    };

    let outcome = run_scrape(&pool, &provider, campaign_id, &capped)
        .await
        .expect("run_scrape failed");
    assert_eq!(outcome.posts_found, 3);
    assert_eq!(provider.queries().len(), 2, "third keyword should be skipped");
}

#[sqlx::test(migrations = "../../migrations")]
async fn rescrape_overwrites_and_reattributes(pool: sqlx::PgPool) {
    let campaign_id = seed_campaign(&pool, &new_campaign(&["fableborne"], 0, None)).await;

    let first = ScriptedProvider::new(vec![last_page(vec![item(Some("1"), 1, 0, 0)])]);
    let first_outcome = run_scrape(&pool, &first, campaign_id, &options())
        .await
        .expect("first scrape");

    let second = ScriptedProvider::new(vec![last_page(vec![item(Some("1"), 30, 0, 0)])]);
    let second_outcome = run_scrape(&pool, &second, campaign_id, &options())
        .await
        .expect("second scrape");
    assert_ne!(first_outcome.run_id, second_outcome.run_id);

    let posts = list_posts(&pool, Some(campaign_id), 100).await.expect("list posts");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].likes, 30);
    assert_eq!(posts[0].scrape_run_id, Some(second_outcome.run_id));
}

#[sqlx::test(migrations = "../../migrations")]
async fn days_override_sets_query_window(pool: sqlx::PgPool) {
    let campaign_id = seed_campaign(&pool, &new_campaign(&["fableborne"], 0, None)).await;
    let provider = ScriptedProvider::new(vec![last_page(Vec::new())]);

    let today = chrono::Utc::now().date_naive();
    run_scrape(&pool, &provider, campaign_id, &options().with_days(Some(1)))
        .await
        .expect("run_scrape failed");

    let expected_since = today.pred_opt().expect("valid date");
    let query = &provider.queries()[0].query;
    assert!(
        query.contains(&format!("since:{}", expected_since.format("%Y-%m-%d"))),
        "unexpected query {query}"
    );
    assert!(query.contains(&format!("until:{}", today.format("%Y-%m-%d"))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn concurrent_scrapes_with_shared_ids_both_complete(pool: sqlx::PgPool) {
    let first_id = seed_campaign(&pool, &new_campaign(&["fableborne"], 0, None)).await;
    let second = CampaignInput {
        name: "Fableborne Launch".to_owned(),
        keywords: vec!["#fableborne".to_owned()],
        ..CampaignInput::default()
    }
    .validate()
    .expect("valid campaign");
    let second_id = seed_campaign(&pool, &second).await;

    let ids: Vec<String> = (0..400).map(|n| format!("p{n:04}")).collect();

    for _ in 0..3 {
        let ascending = ScriptedProvider::new(vec![last_page(
            ids.iter().map(|id| item(Some(id.as_str()), 1, 0, 0)).collect(),
        )]);
        let descending = ScriptedProvider::new(vec![last_page(
            ids.iter().rev().map(|id| item(Some(id.as_str()), 2, 0, 0)).collect(),
        )]);

        let opts_a = options();
        let opts_b = options();
        let (a, b) = tokio::join!(
            run_scrape(&pool, &ascending, first_id, &opts_a),
            run_scrape(&pool, &descending, second_id, &opts_b),
        );
        let a = a.expect("ascending scrape failed");
        let b = b.expect("descending scrape failed");
        assert_eq!(a.posts_found, 400);
        assert_eq!(b.posts_found, 400);

        let a_run = get_scrape_run(&pool, a.run_id).await.expect("get run");
        let b_run = get_scrape_run(&pool, b.run_id).await.expect("get run");
        assert_eq!(a_run.status, "completed");
        assert_eq!(b_run.status, "completed");
    }

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(&pool)
        .await
        .expect("count posts");
    assert_eq!(stored, 400);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn provider_failure_marks_run_failed(pool: sqlx::PgPool) {
    let campaign_id = seed_campaign(&pool, &new_campaign(&["fableborne"], 0, None)).await;
    let provider = ScriptedProvider::new(vec![Err(SearchError::UnexpectedStatus {
        status: 401,
        body: "invalid api key".to_owned(),
    })]);

    let err = run_scrape(&pool, &provider, campaign_id, &options())
        .await
        .expect_err("scrape should fail");
    assert!(matches!(
        err,
        PipelineError::Search(SearchError::UnexpectedStatus { status: 401, .. })
    ));
    assert!(err.to_string().contains("invalid api key"));

    let runs = list_scrape_runs(&pool, campaign_id, 10).await.expect("list runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "failed");
    assert!(runs[0].completed_at.is_some());
    assert_eq!(runs[0].posts_found, 0);

    let posts = list_posts(&pool, Some(campaign_id), 100).await.expect("list posts");
    assert!(posts.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn failure_on_later_keyword_writes_nothing(pool: sqlx::PgPool) {
    let campaign_id = seed_campaign(&pool, &new_campaign(&["alpha", "beta"], 0, None)).await;
    let provider = ScriptedProvider::new(vec![
        last_page(vec![item(Some("a1"), 1, 0, 0)]),
        Err(SearchError::RateLimited {
            retry_after_secs: 60,
        }),
    ]);

    run_scrape(&pool, &provider, campaign_id, &options())
        .await
        .expect_err("scrape should fail");

    let posts = list_posts(&pool, Some(campaign_id), 100).await.expect("list posts");
    assert!(posts.is_empty());
    let runs = list_scrape_runs(&pool, campaign_id, 10).await.expect("list runs");
    assert_eq!(runs[0].status, "failed");
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_campaign_creates_no_run(pool: sqlx::PgPool) {
    let provider = ScriptedProvider::default();
    let missing = Uuid::new_v4();

    let err = run_scrape(&pool, &provider, missing, &options())
        .await
        .expect_err("unknown campaign");
    assert!(matches!(err, PipelineError::CampaignNotFound(id) if id == missing));
    assert!(provider.queries().is_empty());

    let runs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scrape_runs")
        .fetch_one(&pool)
        .await
        .expect("count runs");
    assert_eq!(runs, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn campaign_without_keywords_creates_no_run(pool: sqlx::PgPool) {
    let campaign_id = seed_campaign(&pool, &new_campaign(&["temp"], 0, None)).await;
    sqlx::query("DELETE FROM keywords WHERE campaign_id = $1")
        .bind(campaign_id)
        .execute(&pool)
        .await
        .expect("delete keywords");

    let provider = ScriptedProvider::default();
    let err = run_scrape(&pool, &provider, campaign_id, &options())
        .await
        .expect_err("no keywords");
    assert!(matches!(err, PipelineError::NoKeywords(_)));

    let runs = list_scrape_runs(&pool, campaign_id, 10).await.expect("list runs");
    assert!(runs.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn non_positive_days_are_rejected(pool: sqlx::PgPool) {
    let campaign_id = seed_campaign(&pool, &new_campaign(&["fableborne"], 0, None)).await;
    let provider = ScriptedProvider::default();

    let err = run_scrape(&pool, &provider, campaign_id, &options().with_days(Some(0)))
        .await
        .expect_err("zero days");
    assert!(matches!(err, PipelineError::InvalidDays(0)));

    let runs = list_scrape_runs(&pool, campaign_id, 10).await.expect("list runs");
    assert!(runs.is_empty());
}
