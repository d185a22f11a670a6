// src/config.rs
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::fetch::types::ProviderId;

pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Process-wide configuration, read once at startup. Credentials come from
/// the per-provider env vars (`CURRENTS_API_KEY`, `NEWS_API_KEY`,
/// `GNEWS_API_KEY`, `GUARDIAN_API_KEY`); `.env` is honored via dotenvy in
/// `main` before this is built.
#[derive(Debug, Clone)]
pub struct AppConfig {
    api_keys: HashMap<ProviderId, String>,
    pub fetch_timeout: Duration,
    pub page_size: usize,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut api_keys = HashMap::new();
        for id in ProviderId::ALL {
            if let Ok(v) = std::env::var(id.env_key()) {
                let v = v.trim();
                if !v.is_empty() {
                    api_keys.insert(id, v.to_string());
                }
            }
        }

        let fetch_timeout =
            Duration::from_secs(env_u64("NEWS_FETCH_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS).max(1));
        let page_size = env_u64("NEWS_PAGE_SIZE", DEFAULT_PAGE_SIZE as u64).max(1) as usize;

        let bind_addr = std::env::var("NEWS_BIND_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| {
                DEFAULT_BIND_ADDR
                    .parse()
                    .expect("default bind addr is valid")
            });

        Self {
            api_keys,
            fetch_timeout,
            page_size,
            bind_addr,
        }
    }

    pub fn api_key(&self, id: ProviderId) -> Option<String> {
        self.api_keys.get(&id).cloned()
    }

    /// Providers that have a credential, in canonical order. This is the
    /// default selection when a search names none explicitly.
    pub fn configured_providers(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.api_keys.contains_key(id))
            .collect()
    }

    /// Startup gate: with no credential at all every request would fail, so
    /// report it once here instead of per request.
    pub fn ensure_any_configured(&self) -> Result<()> {
        if self.api_keys.is_empty() {
            return Err(anyhow!(
                "no provider API key configured; set at least one of {}",
                ProviderId::ALL
                    .iter()
                    .map(|id| id.env_key())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        Ok(())
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn clear_provider_keys() {
        for id in ProviderId::ALL {
            env::remove_var(id.env_key());
        }
    }

    #[serial_test::serial]
    #[test]
    fn from_env_reads_keys_and_defaults() {
        clear_provider_keys();
        env::remove_var("NEWS_FETCH_TIMEOUT_SECS");
        env::remove_var("NEWS_PAGE_SIZE");
        env::remove_var("NEWS_BIND_ADDR");

        env::set_var("GUARDIAN_API_KEY", "  gkey  ");
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.api_key(ProviderId::Guardian).as_deref(), Some("gkey"));
        assert_eq!(cfg.api_key(ProviderId::NewsApi), None);
        assert_eq!(cfg.configured_providers(), vec![ProviderId::Guardian]);
        assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(cfg.ensure_any_configured().is_ok());

        env::remove_var("GUARDIAN_API_KEY");
    }

    #[serial_test::serial]
    #[test]
    fn no_keys_at_all_is_a_startup_error() {
        clear_provider_keys();
        let cfg = AppConfig::from_env();
        let err = cfg.ensure_any_configured().unwrap_err().to_string();
        assert!(err.contains("GNEWS_API_KEY"), "lists env var names: {err}");
    }

    #[serial_test::serial]
    #[test]
    fn overrides_parse_and_blank_key_is_ignored() {
        clear_provider_keys();
        env::set_var("NEWS_API_KEY", "   ");
        env::set_var("NEWS_FETCH_TIMEOUT_SECS", "3");
        env::set_var("NEWS_PAGE_SIZE", "0");
        env::set_var("NEWS_BIND_ADDR", "127.0.0.1:9999");

        let cfg = AppConfig::from_env();
        assert_eq!(cfg.api_key(ProviderId::NewsApi), None);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(3));
        assert_eq!(cfg.page_size, 1, "page size is clamped to >= 1");
        assert_eq!(cfg.bind_addr, "127.0.0.1:9999".parse().unwrap());

        env::remove_var("NEWS_API_KEY");
        env::remove_var("NEWS_FETCH_TIMEOUT_SECS");
        env::remove_var("NEWS_PAGE_SIZE");
        env::remove_var("NEWS_BIND_ADDR");
    }
}
