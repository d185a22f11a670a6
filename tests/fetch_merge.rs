// tests/fetch_merge.rs
//
// Orchestrator merge contract against canned providers:
// selection-order concatenation, URL dedup, isolated failures,
// client-side paging, opt-in date sort, determinism.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use nt_news::{
    aggregate, ArticleRecord, FetchError, FetchErrorKind, FetchOutcome, NewsProvider, ProviderId,
    SearchRequest,
};

struct CannedProvider {
    id: ProviderId,
    outcome: FetchOutcome,
    native_paging: bool,
}

impl CannedProvider {
    fn ok(id: ProviderId, articles: Vec<ArticleRecord>) -> Self {
        Self {
            id,
            outcome: Ok(articles),
            native_paging: true,
        }
    }

    fn failing(id: ProviderId, err: FetchError) -> Self {
        Self {
            id,
            outcome: Err(err),
            native_paging: true,
        }
    }

    fn without_native_paging(mut self) -> Self {
        self.native_paging = false;
        self
    }
}

#[async_trait]
impl NewsProvider for CannedProvider {
    async fn search(&self, _req: &SearchRequest) -> FetchOutcome {
        self.outcome.clone()
    }

    fn id(&self) -> ProviderId {
        self.id
    }

    fn native_paging(&self) -> bool {
        self.native_paging
    }
}

fn article(provider: ProviderId, n: usize) -> ArticleRecord {
    ArticleRecord {
        title: format!("{} article {n}", provider.display_name()),
        description: Some(format!("description {n}")),
        url: format!("https://example.com/{}/{n}", provider.as_str()),
        source_provider: provider,
        published_at: Utc.with_ymd_and_hms(2025, 2, 16, 8, (n % 60) as u32, 0).single(),
    }
}

fn articles(provider: ProviderId, count: usize) -> Vec<ArticleRecord> {
    (0..count).map(|n| article(provider, n)).collect()
}

fn request(providers: &[ProviderId]) -> SearchRequest {
    SearchRequest::new("climate", providers.to_vec())
}

#[tokio::test]
async fn scenario_newsapi_then_guardian_concatenates_in_selection_order() {
    let newsapi = CannedProvider::ok(ProviderId::NewsApi, articles(ProviderId::NewsApi, 5));
    let guardian = CannedProvider::ok(ProviderId::Guardian, articles(ProviderId::Guardian, 3));
    let providers: Vec<&dyn NewsProvider> = vec![&newsapi, &guardian];

    let req = request(&[ProviderId::NewsApi, ProviderId::Guardian]);
    let out = aggregate(&providers, &req, 25).await;

    assert_eq!(out.articles.len(), 8);
    assert!(out.errors.is_empty());
    for art in &out.articles[..5] {
        assert_eq!(art.source_provider, ProviderId::NewsApi);
    }
    for art in &out.articles[5..] {
        assert_eq!(art.source_provider, ProviderId::Guardian);
    }
}

#[tokio::test]
async fn duplicate_url_keeps_first_provider_in_selection_order() {
    let shared_url = "https://example.com/shared";
    let mut a1 = article(ProviderId::NewsApi, 0);
    a1.url = shared_url.to_string();
    let mut a2 = article(ProviderId::Guardian, 0);
    a2.url = shared_url.to_string();

    let newsapi = CannedProvider::ok(ProviderId::NewsApi, vec![a1]);
    let guardian = CannedProvider::ok(ProviderId::Guardian, vec![a2, article(ProviderId::Guardian, 1)]);
    let providers: Vec<&dyn NewsProvider> = vec![&newsapi, &guardian];

    let req = request(&[ProviderId::NewsApi, ProviderId::Guardian]);
    let out = aggregate(&providers, &req, 25).await;

    assert_eq!(out.articles.len(), 2);
    let kept: Vec<_> = out
        .articles
        .iter()
        .filter(|a| a.url == shared_url)
        .collect();
    assert_eq!(kept.len(), 1, "exactly one entry per URL");
    assert_eq!(kept[0].source_provider, ProviderId::NewsApi);
}

#[tokio::test]
async fn one_transport_failure_leaves_siblings_intact() {
    let currents = CannedProvider::ok(ProviderId::Currents, articles(ProviderId::Currents, 4));
    let gnews = CannedProvider::failing(
        ProviderId::GNews,
        FetchError::transport(ProviderId::GNews, "connection reset"),
    );
    let guardian = CannedProvider::ok(ProviderId::Guardian, articles(ProviderId::Guardian, 2));
    let providers: Vec<&dyn NewsProvider> = vec![&currents, &gnews, &guardian];

    let req = request(&[ProviderId::Currents, ProviderId::GNews, ProviderId::Guardian]);
    let out = aggregate(&providers, &req, 25).await;

    assert_eq!(out.articles.len(), 6);
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].provider, ProviderId::GNews);
    assert_eq!(out.errors[0].kind, FetchErrorKind::Transport);
}

#[tokio::test]
async fn all_providers_failing_yields_empty_articles_not_a_panic() {
    let newsapi = CannedProvider::failing(
        ProviderId::NewsApi,
        FetchError::transport(ProviderId::NewsApi, "timed out"),
    );
    let guardian = CannedProvider::failing(
        ProviderId::Guardian,
        FetchError::configuration(ProviderId::Guardian, "GUARDIAN_API_KEY is not set"),
    );
    let providers: Vec<&dyn NewsProvider> = vec![&newsapi, &guardian];

    let req = request(&[ProviderId::NewsApi, ProviderId::Guardian]);
    let out = aggregate(&providers, &req, 25).await;

    assert!(out.articles.is_empty());
    assert_eq!(out.errors.len(), 2);
    assert!(out.errors.len() <= req.providers.len());
}

#[tokio::test]
async fn article_count_is_sum_of_successes_minus_duplicates() {
    let mut guardian_articles = articles(ProviderId::Guardian, 3);
    // Two of Guardian's three URLs collide with NewsAPI's.
    guardian_articles[0].url = format!("https://example.com/{}/0", ProviderId::NewsApi.as_str());
    guardian_articles[1].url = format!("https://example.com/{}/1", ProviderId::NewsApi.as_str());

    let newsapi = CannedProvider::ok(ProviderId::NewsApi, articles(ProviderId::NewsApi, 5));
    let guardian = CannedProvider::ok(ProviderId::Guardian, guardian_articles);
    let providers: Vec<&dyn NewsProvider> = vec![&newsapi, &guardian];

    let req = request(&[ProviderId::NewsApi, ProviderId::Guardian]);
    let out = aggregate(&providers, &req, 25).await;

    assert_eq!(out.articles.len(), 5 + 3 - 2);
    assert!(out.errors.is_empty());
}

#[tokio::test]
async fn same_request_same_responses_same_result() {
    let newsapi = CannedProvider::ok(ProviderId::NewsApi, articles(ProviderId::NewsApi, 5));
    let guardian = CannedProvider::ok(ProviderId::Guardian, articles(ProviderId::Guardian, 3));
    let providers: Vec<&dyn NewsProvider> = vec![&newsapi, &guardian];

    let req = request(&[ProviderId::NewsApi, ProviderId::Guardian]);
    let first = aggregate(&providers, &req, 25).await;
    let second = aggregate(&providers, &req, 25).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn provider_without_native_paging_gets_sliced_client_side() {
    let gnews = CannedProvider::ok(ProviderId::GNews, articles(ProviderId::GNews, 25))
        .without_native_paging();
    let providers: Vec<&dyn NewsProvider> = vec![&gnews];

    let mut req = request(&[ProviderId::GNews]);
    req.page = 2;
    let out = aggregate(&providers, &req, 10).await;

    assert_eq!(out.articles.len(), 10);
    assert_eq!(out.articles[0].url, "https://example.com/gnews/10");
    assert_eq!(out.articles[9].url, "https://example.com/gnews/19");
}

#[tokio::test]
async fn native_paging_provider_is_never_resliced() {
    // A natively-paged provider already returned "page 2"; slicing it again
    // would drop everything.
    let newsapi = CannedProvider::ok(ProviderId::NewsApi, articles(ProviderId::NewsApi, 7));
    let providers: Vec<&dyn NewsProvider> = vec![&newsapi];

    let mut req = request(&[ProviderId::NewsApi]);
    req.page = 2;
    let out = aggregate(&providers, &req, 10).await;

    assert_eq!(out.articles.len(), 7);
}

#[tokio::test]
async fn sort_by_date_orders_newest_first_with_undated_last() {
    let mut a = article(ProviderId::NewsApi, 0);
    a.published_at = Utc.with_ymd_and_hms(2025, 2, 15, 8, 0, 0).single();
    let mut b = article(ProviderId::NewsApi, 1);
    b.published_at = Utc.with_ymd_and_hms(2025, 2, 16, 9, 0, 5).single();
    let mut c = article(ProviderId::NewsApi, 2);
    c.published_at = None;

    let newsapi = CannedProvider::ok(ProviderId::NewsApi, vec![a, b.clone(), c]);
    let providers: Vec<&dyn NewsProvider> = vec![&newsapi];

    let mut req = request(&[ProviderId::NewsApi]);
    req.sort_by_date = true;
    let out = aggregate(&providers, &req, 25).await;

    assert_eq!(out.articles[0], b);
    assert!(out.articles[2].published_at.is_none());
}
