// src/fetch/providers/mod.rs
pub mod currents;
pub mod gnews;
pub mod guardian;
pub mod newsapi;

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::fetch::types::{FetchError, NewsProvider, ProviderId};

pub use currents::CurrentsProvider;
pub use gnews::GNewsProvider;
pub use guardian::GuardianProvider;
pub use newsapi::NewsApiProvider;

/// Build one adapter per provider, all sharing `client`'s connection pool.
/// Adapters for unconfigured providers still exist; they surface a
/// configuration FetchError on first use instead of being silently absent.
pub fn build_registry(cfg: &AppConfig, client: &reqwest::Client) -> Vec<Box<dyn NewsProvider>> {
    let timeout = cfg.fetch_timeout;
    vec![
        Box::new(CurrentsProvider::new(
            client.clone(),
            cfg.api_key(ProviderId::Currents),
            timeout,
        )),
        Box::new(
            NewsApiProvider::new(client.clone(), cfg.api_key(ProviderId::NewsApi), timeout)
                .with_page_size(cfg.page_size),
        ),
        Box::new(GNewsProvider::new(
            client.clone(),
            cfg.api_key(ProviderId::GNews),
            timeout,
        )),
        Box::new(
            GuardianProvider::new(client.clone(), cfg.api_key(ProviderId::Guardian), timeout)
                .with_page_size(cfg.page_size),
        ),
    ]
}

pub(crate) fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// One GET with query params; returns the body on 2xx. Transport failures,
/// timeouts, and non-2xx statuses all map to a transport FetchError.
pub(crate) async fn get_body(
    client: &reqwest::Client,
    provider: ProviderId,
    url: &str,
    params: &[(&str, String)],
    timeout: Duration,
) -> Result<String, FetchError> {
    let resp = client
        .get(url)
        .query(params)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                FetchError::transport(provider, "request timed out")
            } else {
                FetchError::transport(provider, e.to_string())
            }
        })?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| FetchError::transport(provider, format!("reading body: {e}")))?;

    if !status.is_success() {
        let snippet: String = body.chars().take(200).collect();
        return Err(FetchError::transport(
            provider,
            format!("unexpected status {status}: {snippet}"),
        ));
    }
    Ok(body)
}

/// The shared "credential present" gate every adapter runs first.
pub(crate) fn require_key(
    api_key: Option<&str>,
    provider: ProviderId,
) -> Result<String, FetchError> {
    match api_key {
        Some(k) if !k.trim().is_empty() => Ok(k.to_string()),
        _ => Err(FetchError::configuration(
            provider,
            format!("{} is not set", provider.env_key()),
        )),
    }
}
