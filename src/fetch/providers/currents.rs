use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::fetch::providers::{get_body, require_key};
use crate::fetch::types::{
    ArticleRecord, FetchError, FetchOutcome, NewsProvider, ProviderId, SearchRequest,
};
use crate::fetch::{clean_optional, clean_text};

const DEFAULT_BASE_URL: &str = "https://api.currentsapi.services";

#[derive(Debug, Deserialize)]
struct Envelope {
    news: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published: Option<String>,
}

/// Currents timestamps look like "2025-02-16 08:00:00 +0000".
fn parse_published(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub struct CurrentsProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl CurrentsProvider {
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
                source_provider: ProviderId::Currents,
                published_at: a.published.as_deref().and_then(parse_published),
            });
        }
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_fetch_parse_ms").record(ms);
        counter!("news_fetch_articles_total").increment(out.len() as u64);
        out
    }
}

#[async_trait]
impl NewsProvider for CurrentsProvider {
    async fn search(&self, req: &SearchRequest) -> FetchOutcome {
        let key = require_key(self.api_key.as_deref(), ProviderId::Currents)?;

        let params = [
            ("apiKey", key),
            ("keywords", req.query()),
            ("language", "en".to_string()),
            ("page_number", req.page.to_string()),
        ];

        let url = format!("{}/v1/search", self.base_url);
        let body =
            get_body(&self.client, ProviderId::Currents, &url, &params, self.timeout).await?;

        let env: Envelope = serde_json::from_str(&body).map_err(|e| {
            FetchError::response_format(
                ProviderId::Currents,
                format!("parsing Currents response: {e}"),
            )
        })?;

        let out = Self::map_articles(env.news);
        if out.is_empty() {
            return Err(FetchError::empty(ProviderId::Currents));
        }
        Ok(out)
    }

    fn id(&self) -> ProviderId {
        ProviderId::Currents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_format_parses_with_offset() {
        let dt = parse_published("2025-02-16 08:00:00 +0000").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-02-16T08:00:00+00:00");
        assert!(parse_published("2025-02-16T08:00:00Z").is_none());
    }
}
