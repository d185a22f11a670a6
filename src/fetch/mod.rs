// src/fetch/mod.rs
pub mod providers;
pub mod types;

use std::collections::HashSet;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::fetch::types::{AggregatedResult, ArticleRecord, NewsProvider, SearchRequest};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_fetch_runs_total", "Aggregation runs executed.");
        describe_counter!(
            "news_fetch_articles_total",
            "Articles parsed from providers."
        );
        describe_counter!(
            "news_fetch_merged_total",
            "Articles kept after merge + URL dedup."
        );
        describe_counter!("news_fetch_dedup_total", "Articles removed as duplicate URLs.");
        describe_counter!(
            "news_fetch_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_histogram!("news_fetch_parse_ms", "Provider parse time in milliseconds.");
        describe_gauge!(
            "news_fetch_last_run_ts",
            "Unix ts when an aggregation last ran."
        );
    });
}

/// Normalize article text: decode HTML entities, strip tags, collapse
/// whitespace. Guardian trailText in particular arrives with markup.
pub fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Like `clean_text`, but maps blank input (or blank output) to `None`.
pub fn clean_optional(s: Option<&str>) -> Option<String> {
    let cleaned = clean_text(s?);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Page window `[(page-1)*size .. page*size)` over `len` items, clamped.
fn page_bounds(len: usize, page: u32, page_size: usize) -> (usize, usize) {
    let start = (page.max(1) as usize - 1).saturating_mul(page_size).min(len);
    let end = start.saturating_add(page_size).min(len);
    (start, end)
}

/// Fan a request out to every selected provider, fan their outcomes back in.
///
/// Merge contract: successful results are concatenated in selection order
/// (`req.providers` order, which `join_all` preserves), then deduplicated by
/// exact URL keeping the first occurrence. Providers without native paging
/// get their own result sliced to the requested page window before the
/// merge. A provider failure is recorded and never blocks its siblings; if
/// every provider fails the result is simply empty with a full error list.
pub async fn aggregate(
    providers: &[&dyn NewsProvider],
    req: &SearchRequest,
    page_size: usize,
) -> AggregatedResult {
    ensure_metrics_described();

    let tasks = providers.iter().map(|p| async move {
        let outcome = p.search(req).await;
        (*p, outcome)
    });
    let outcomes = futures::future::join_all(tasks).await;

    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut articles: Vec<ArticleRecord> = Vec::new();
    let mut errors = Vec::new();
    let mut dedup_out = 0usize;

    for (provider, outcome) in outcomes {
        match outcome {
            Ok(mut batch) => {
                if !provider.native_paging() {
                    let (start, end) = page_bounds(batch.len(), req.page, page_size);
                    batch.truncate(end);
                    batch.drain(..start);
                }
                for art in batch {
                    if !seen_urls.insert(art.url.clone()) {
                        dedup_out += 1;
                        continue;
                    }
                    articles.push(art);
                }
            }
            Err(e) => {
                tracing::warn!(provider = %e.provider, kind = ?e.kind, error = %e.message, "provider error");
                counter!("news_fetch_provider_errors_total").increment(1);
                errors.push(e);
            }
        }
    }

    if req.sort_by_date {
        // Stable: equal timestamps keep selection order. Undated articles sink.
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    }

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    counter!("news_fetch_runs_total").increment(1);
    counter!("news_fetch_merged_total").increment(articles.len() as u64);
    counter!("news_fetch_dedup_total").increment(dedup_out as u64);
    gauge!("news_fetch_last_run_ts").set(now as f64);

    tracing::info!(
        target: "fetch",
        query = %req.query(),
        providers = providers.len(),
        articles = articles.len(),
        dedup = dedup_out,
        errors = errors.len(),
        "aggregation run"
    );

    AggregatedResult { articles, errors }
}
