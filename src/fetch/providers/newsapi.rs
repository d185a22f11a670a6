use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::fetch::providers::{get_body, parse_rfc3339, require_key};
use crate::fetch::types::{
    ArticleRecord, FetchError, FetchOutcome, NewsProvider, ProviderId, SearchRequest,
};
use crate::fetch::{clean_optional, clean_text};

const DEFAULT_BASE_URL: &str = "https://newsapi.org";

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

pub struct NewsApiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    page_size: usize,
    timeout: Duration,
}

impl NewsApiProvider {
    pub fn new(client: reqwest::Client, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    fn map_articles(raw: Vec<Article>) -> Vec<ArticleRecord> {
        let t0 = std::time::Instant::now();
        let mut out = Vec::with_capacity(raw.len());
        for a in raw {
            // An entry without a URL can't be linked or deduplicated; skip it.
            let Some(url) = a.url.filter(|u| !u.is_empty()) else {
                continue;
            };
            out.push(ArticleRecord {
                title: clean_text(a.title.as_deref().unwrap_or_default()),
                description: clean_optional(a.description.as_deref()),
                url,
                source_provider: ProviderId::NewsApi,
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
impl NewsProvider for NewsApiProvider {
    async fn search(&self, req: &SearchRequest) -> FetchOutcome {
        let key = require_key(self.api_key.as_deref(), ProviderId::NewsApi)?;

        // An empty query falls back to US top headlines, matching the
        // dashboard's default view.
        let query = req.query();
        let (path, mut params) = if query.is_empty() {
            ("/v2/top-headlines", vec![("country", "us".to_string())])
        } else {
            ("/v2/everything", vec![("q", query)])
        };
        params.push(("apiKey", key));
        params.push(("language", "en".to_string()));
        params.push(("pageSize", self.page_size.to_string()));
        params.push(("page", req.page.to_string()));

        let url = format!("{}{}", self.base_url, path);
        let body = get_body(&self.client, ProviderId::NewsApi, &url, &params, self.timeout).await?;

        let env: Envelope = serde_json::from_str(&body).map_err(|e| {
            FetchError::response_format(ProviderId::NewsApi, format!("parsing NewsAPI response: {e}"))
        })?;

        let out = Self::map_articles(env.articles);
        if out.is_empty() {
            return Err(FetchError::empty(ProviderId::NewsApi));
        }
        Ok(out)
    }

    fn id(&self) -> ProviderId {
        ProviderId::NewsApi
    }
}
