use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::config::AppConfig;
use crate::fetch;
use crate::fetch::providers::build_registry;
use crate::fetch::types::{
    AggregatedResult, ArticleRecord, FetchError, NewsProvider, ProviderId, SearchRequest,
};

#[derive(Clone)]
pub struct AppState {
    registry: Arc<Vec<Box<dyn NewsProvider>>>,
    /// Default selection when a search names no providers.
    default_selection: Arc<Vec<ProviderId>>,
    page_size: usize,
}

impl AppState {
    pub fn new(cfg: &AppConfig, client: &reqwest::Client) -> Self {
        Self {
            registry: Arc::new(build_registry(cfg, client)),
            default_selection: Arc::new(cfg.configured_providers()),
            page_size: cfg.page_size,
        }
    }

    /// State over an arbitrary adapter set. Tests use this to swap the real
    /// adapters for canned ones.
    pub fn with_providers(providers: Vec<Box<dyn NewsProvider>>, page_size: usize) -> Self {
        let ids = providers.iter().map(|p| p.id()).collect();
        Self {
            registry: Arc::new(providers),
            default_selection: Arc::new(ids),
            page_size,
        }
    }

    fn select(&self, ids: &[ProviderId]) -> Vec<&dyn NewsProvider> {
        ids.iter()
            .filter_map(|id| self.registry.iter().find(|p| p.id() == *id))
            .map(|b| b.as_ref())
            .collect()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/search", get(search))
        .route("/api/export", get(export))
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, serde::Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    keyword: String,
    topic: Option<String>,
    /// CSV of provider names; absent or empty means every configured provider.
    providers: Option<String>,
    page: Option<u32>,
    /// `sort=date` opts into publish-date ordering.
    sort: Option<String>,
}

fn to_request(params: SearchParams, state: &AppState) -> Result<SearchRequest, String> {
    let providers = match params.providers.as_deref().map(str::trim) {
        None | Some("") => state.default_selection.as_ref().clone(),
        Some(csv) => {
            let mut ids = Vec::new();
            for part in csv.split(',') {
                let id: ProviderId = part.parse()?;
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            ids
        }
    };

    // The dashboard's topic select uses "All" as the no-filter sentinel.
    let topic = params
        .topic
        .filter(|t| !t.trim().is_empty() && !t.trim().eq_ignore_ascii_case("all"));

    Ok(SearchRequest {
        keyword: params.keyword,
        topic,
        providers,
        page: params.page.unwrap_or(1).max(1),
        sort_by_date: params.sort.as_deref() == Some("date"),
    })
}

#[derive(serde::Serialize)]
struct SearchResponse {
    query: String,
    page: u32,
    articles: Vec<ArticleRecord>,
    errors: Vec<FetchError>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let req = to_request(params, &state).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let result = run_aggregate(&state, &req).await;
    Ok(Json(SearchResponse {
        query: req.query(),
        page: req.page,
        articles: result.articles,
        errors: result.errors,
    }))
}

/// Same aggregation as `search`, rendered as a downloadable JSON file;
/// the dashboard's "Download Results (JSON)" button points here.
async fn export(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<(HeaderMap, String), (StatusCode, String)> {
    let req = to_request(params, &state).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let result = run_aggregate(&state, &req).await;

    let body = serde_json::to_string_pretty(&result.articles)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"news_results.json\""),
    );
    Ok((headers, body))
}

async fn run_aggregate(state: &AppState, req: &SearchRequest) -> AggregatedResult {
    let selected = state.select(&req.providers);
    fetch::aggregate(&selected, req, state.page_size).await
}
