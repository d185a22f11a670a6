// src/fetch/types.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// One upstream news API integrated by an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Currents,
    NewsApi,
    GNews,
    Guardian,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Currents,
        ProviderId::NewsApi,
        ProviderId::GNews,
        ProviderId::Guardian,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Currents => "currents",
            ProviderId::NewsApi => "newsapi",
            ProviderId::GNews => "gnews",
            ProviderId::Guardian => "guardian",
        }
    }

    /// Human-facing name, as shown in the dashboard.
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderId::Currents => "Currents",
            ProviderId::NewsApi => "NewsAPI",
            ProviderId::GNews => "GNews",
            ProviderId::Guardian => "The Guardian",
        }
    }

    /// Env var holding this provider's API key.
    pub fn env_key(self) -> &'static str {
        match self {
            ProviderId::Currents => "CURRENTS_API_KEY",
            ProviderId::NewsApi => "NEWS_API_KEY",
            ProviderId::GNews => "GNEWS_API_KEY",
            ProviderId::Guardian => "GUARDIAN_API_KEY",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "currents" => Ok(ProviderId::Currents),
            "newsapi" => Ok(ProviderId::NewsApi),
            "gnews" => Ok(ProviderId::GNews),
            "guardian" => Ok(ProviderId::Guardian),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

/// One search as issued by the presenter. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub keyword: String,
    pub topic: Option<String>,
    /// Selection order is the merge order.
    pub providers: Vec<ProviderId>,
    /// 1-based.
    pub page: u32,
    pub sort_by_date: bool,
}

impl SearchRequest {
    pub fn new(keyword: impl Into<String>, providers: Vec<ProviderId>) -> Self {
        Self {
            keyword: keyword.into(),
            topic: None,
            providers,
            page: 1,
            sort_by_date: false,
        }
    }

    /// The query string actually sent upstream: keyword plus topic, space-joined.
    pub fn query(&self) -> String {
        match self.topic.as_deref() {
            Some(t) if !t.trim().is_empty() => format!("{} {}", self.keyword.trim(), t.trim())
                .trim()
                .to_string(),
            _ => self.keyword.trim().to_string(),
        }
    }
}

/// Normalized article shape shared by every provider. Never mutated after
/// the adapter produces it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub source_provider: ProviderId,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// Missing or invalid credential.
    Configuration,
    /// Network failure, timeout, or non-2xx status.
    Transport,
    /// Body did not match the provider's documented shape.
    ResponseFormat,
    /// The call succeeded but mapped to zero articles.
    Empty,
}

/// Per-provider failure, returned as a value across the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FetchError {
    pub provider: ProviderId,
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn configuration(provider: ProviderId, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind: FetchErrorKind::Configuration,
            message: message.into(),
        }
    }

    pub fn transport(provider: ProviderId, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind: FetchErrorKind::Transport,
            message: message.into(),
        }
    }

    pub fn response_format(provider: ProviderId, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind: FetchErrorKind::ResponseFormat,
            message: message.into(),
        }
    }

    pub fn empty(provider: ProviderId) -> Self {
        Self {
            provider,
            kind: FetchErrorKind::Empty,
            message: "no articles returned".to_string(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider.display_name(), self.message)
    }
}

/// What one adapter call produced: articles, or one typed error.
pub type FetchOutcome = Result<Vec<ArticleRecord>, FetchError>;

/// The merged view over every selected provider for one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct AggregatedResult {
    pub articles: Vec<ArticleRecord>,
    pub errors: Vec<FetchError>,
}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    /// One HTTP round-trip. All failure modes come back as `FetchError`;
    /// this must not panic or bubble transport errors past the adapter.
    async fn search(&self, req: &SearchRequest) -> FetchOutcome;

    fn id(&self) -> ProviderId;

    /// Whether the upstream API honors a page parameter. Providers that
    /// don't get client-side slicing in the orchestrator.
    fn native_paging(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_round_trips_through_str() {
        for id in ProviderId::ALL {
            assert_eq!(id.as_str().parse::<ProviderId>().unwrap(), id);
        }
        assert_eq!("  GUARDIAN ".parse::<ProviderId>().unwrap(), ProviderId::Guardian);
        assert!("bloomberg".parse::<ProviderId>().is_err());
    }

    #[test]
    fn query_joins_keyword_and_topic() {
        let mut req = SearchRequest::new("climate", vec![ProviderId::NewsApi]);
        assert_eq!(req.query(), "climate");
        req.topic = Some("Science".into());
        assert_eq!(req.query(), "climate Science");
        req.topic = Some("   ".into());
        assert_eq!(req.query(), "climate");
    }

    #[test]
    fn empty_keyword_with_topic_has_no_stray_space() {
        let mut req = SearchRequest::new("", vec![ProviderId::Guardian]);
        req.topic = Some("Technology".into());
        assert_eq!(req.query(), "Technology");
    }
}
