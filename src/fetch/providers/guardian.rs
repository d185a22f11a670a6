use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::fetch::providers::{get_body, parse_rfc3339, require_key};
use crate::fetch::types::{
    ArticleRecord, FetchError, FetchOutcome, NewsProvider, ProviderId, SearchRequest,
};
use crate::fetch::{clean_optional, clean_text};

const DEFAULT_BASE_URL: &str = "https://content.guardianapis.com";

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Response,
}

#[derive(Debug, Deserialize)]
struct Response {
    results: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(rename = "webTitle")]
    web_title: Option<String>,
    #[serde(rename = "webUrl")]
    web_url: Option<String>,
    #[serde(rename = "webPublicationDate")]
    web_publication_date: Option<String>,
    fields: Option<Fields>,
}

#[derive(Debug, Deserialize)]
struct Fields {
    #[serde(rename = "trailText")]
    trail_text: Option<String>,
}

pub struct GuardianProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    page_size: usize,
    timeout: Duration,
}

impl GuardianProvider {
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

    fn map_results(results: Vec<Item>) -> Vec<ArticleRecord> {
        let t0 = std::time::Instant::now();
        let mut out = Vec::with_capacity(results.len());
        for item in results {
            let Some(url) = item.web_url.filter(|u| !u.is_empty()) else {
                continue;
            };
            // trailText is an HTML fragment; clean_optional strips it down.
            let description =
                clean_optional(item.fields.as_ref().and_then(|f| f.trail_text.as_deref()));
            out.push(ArticleRecord {
                title: clean_text(item.web_title.as_deref().unwrap_or_default()),
                description,
                url,
                source_provider: ProviderId::Guardian,
                published_at: item
                    .web_publication_date
                    .as_deref()
                    .and_then(parse_rfc3339),
            });
        }
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_fetch_parse_ms").record(ms);
        counter!("news_fetch_articles_total").increment(out.len() as u64);
        out
    }
}

#[async_trait]
impl NewsProvider for GuardianProvider {
    async fn search(&self, req: &SearchRequest) -> FetchOutcome {
        let key = require_key(self.api_key.as_deref(), ProviderId::Guardian)?;

        // The content API rejects an empty q; "*" matches everything.
        let query = req.query();
        let q = if query.is_empty() { "*".to_string() } else { query };
        let params = [
            ("api-key", key),
            ("q", q),
            ("show-fields", "trailText".to_string()),
            ("page", req.page.to_string()),
            ("page-size", self.page_size.to_string()),
        ];

        let url = format!("{}/search", self.base_url);
        let body =
            get_body(&self.client, ProviderId::Guardian, &url, &params, self.timeout).await?;

        let env: Envelope = serde_json::from_str(&body).map_err(|e| {
            FetchError::response_format(
                ProviderId::Guardian,
                format!("parsing Guardian response: {e}"),
            )
        })?;

        let out = Self::map_results(env.response.results);
        if out.is_empty() {
            return Err(FetchError::empty(ProviderId::Guardian));
        }
        Ok(out)
    }

    fn id(&self) -> ProviderId {
        ProviderId::Guardian
    }
}
