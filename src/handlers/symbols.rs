use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::StockSearchResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/symbols/search?q= - Symbol directory search. An empty query
/// serves the popular-stocks list. Each hit is flagged with the caller's
/// current watchlist membership; anonymous callers see everything unflagged.
pub async fn search_symbols(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<StockSearchResult>>, AppError> {
    let mut results = state.quote_service.search_symbols(&query.q).await?;

    let membership: HashSet<String> = match state.auth_service.session_from_headers(&headers) {
        Some(session) => state
            .watchlist_service
            .list_symbols(&session.email)
            .await
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    for result in &mut results {
        result.is_in_watchlist = membership.contains(&result.symbol);
    }

    Ok(Json(results))
}
