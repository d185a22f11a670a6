use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::fetch::providers::{get_body, parse_rfc3339, require_key};
use crate::fetch::types::{
    ArticleRecord, FetchError, FetchOutcome, NewsProvider, ProviderId, SearchRequest,
};
use crate::fetch::{clean_optional, clean_text};

const DEFAULT_BASE_URL: &str = "https://gnews.io";

/// The free tier caps `max` at 10.
const MAX_RESULTS: usize = 10;

#[derive(Debug, Deserialize)]
struct Envelope {
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

pub struct GNewsProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl GNewsProvider {
    pub fn new(client: reqwest::Client, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn map_articles(raw: Vec<Article>) -> Vec<ArticleRecord> {
        let t0 = std::time::Instant::now();
        let mut out = Vec::with_capacity(raw.len());
        for a in raw {
            let Some(url) = a.url.filter(|u| !u.is_empty()) else {
                continue;
            };
            out.push(ArticleRecord {
                title: clean_text(a.title.as_deref().unwrap_or_default()),
                description: clean_optional(a.description.as_deref()),
                url,
                source_provider: ProviderId::GNews,
                published_at: a.published_at.as_deref().and_then(parse_rfc3339),
            });
        }
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_fetch_parse_ms").record(ms);
        counter!("news_fetch_articles_total").increment(out.len() as u64);
        out
    }
}

#[async_trait]
impl NewsProvider for GNewsProvider {
    async fn search(&self, req: &SearchRequest) -> FetchOutcome {
        let key = require_key(self.api_key.as_deref(), ProviderId::GNews)?;

        let params = [
            ("token", key),
            ("q", req.query()),
            ("lang", "en".to_string()),
            ("max", MAX_RESULTS.to_string()),
        ];

        let url = format!("{}/api/v4/search", self.base_url);
        let body = get_body(&self.client, ProviderId::GNews, &url, &params, self.timeout).await?;

        let env: Envelope = serde_json::from_str(&body).map_err(|e| {
            FetchError::response_format(ProviderId::GNews, format!("parsing GNews response: {e}"))
        })?;

        let out = Self::map_articles(env.articles);
        if out.is_empty() {
            return Err(FetchError::empty(ProviderId::GNews));
        }
        Ok(out)
    }

    fn id(&self) -> ProviderId {
        ProviderId::GNews
    }

    /// The search endpoint has no page parameter on this plan; the
    /// orchestrator slices this provider's results client-side.
    fn native_paging(&self) -> bool {
        false
    }
}
