// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod fetch;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::fetch::aggregate;
pub use crate::fetch::types::{
    AggregatedResult, ArticleRecord, FetchError, FetchErrorKind, FetchOutcome, NewsProvider,
    ProviderId, SearchRequest,
};
