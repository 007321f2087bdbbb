use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde_json::json;

use crate::models::{AddWatchlistRequest, RemoveWatchlistRequest, WatchlistRow};
use crate::services::StoreStatus;
use crate::AppState;

/// GET /api/watchlist/symbols - The caller's watchlist symbols.
/// Unauthenticated callers get an empty array with a 401, never a
/// persistence-layer error.
pub async fn get_watchlist_symbols(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Vec<String>>) {
    let Some(session) = state.auth_service.session_from_headers(&headers) else {
        return (StatusCode::UNAUTHORIZED, Json(Vec::new()));
    };

    let symbols = state.watchlist_service.list_symbols(&session.email).await;
    (StatusCode::OK, Json(symbols))
}

/// POST /api/watchlist/add - Add a symbol (form-encoded `symbol`, `company`)
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(req): Form<AddWatchlistRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let Some(session) = state.auth_service.session_from_headers(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        );
    };

    match state
        .watchlist_service
        .add_symbol(&session.email, &req.symbol, &req.company)
        .await
    {
        StoreStatus::Ok => (StatusCode::OK, Json(json!({ "success": true }))),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to add to watchlist" })),
        ),
    }
}

/// POST /api/watchlist/remove - Remove a symbol (form-encoded `symbol`).
/// Removing a symbol that is not on the list reports failure, matching the
/// add/remove asymmetry of the shipped product.
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(req): Form<RemoveWatchlistRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let Some(session) = state.auth_service.session_from_headers(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        );
    };

    match state
        .watchlist_service
        .remove_symbol(&session.email, &req.symbol)
        .await
    {
        StoreStatus::Ok => (StatusCode::OK, Json(json!({ "success": true }))),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to remove from watchlist" })),
        ),
    }
}

/// GET /api/watchlist/contains/:symbol - Membership probe. Any failure along
/// the way (no session, no user, store down) reads as "not a member".
pub async fn check_watchlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(symbol): Path<String>,
) -> Json<serde_json::Value> {
    let in_watchlist = match state.auth_service.session_from_headers(&headers) {
        Some(session) => {
            state
                .watchlist_service
                .is_member(&session.email, &symbol)
                .await
        }
        None => false,
    };

    Json(json!({
        "symbol": symbol.to_uppercase(),
        "in_watchlist": in_watchlist
    }))
}

// ==================== Page-Level Action Path ====================
//
// The page actions redirect unauthenticated callers to the sign-in flow,
// while the API endpoints above return 401. The inconsistency is observed
// behavior and is kept as-is.

/// POST /watchlist/actions/add
pub async fn watchlist_action_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(req): Form<AddWatchlistRequest>,
) -> Response {
    let Some(session) = state.auth_service.session_from_headers(&headers) else {
        return Redirect::to(&state.config.sign_in_url).into_response();
    };

    match state
        .watchlist_service
        .add_symbol(&session.email, &req.symbol, &req.company)
        .await
    {
        StoreStatus::Ok => {
            state.watchlist_service.invalidate_view(&session.email).await;
            (StatusCode::OK, Json(json!({ "success": true }))).into_response()
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to add to watchlist" })),
        )
            .into_response(),
    }
}

/// POST /watchlist/actions/remove
pub async fn watchlist_action_remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(req): Form<RemoveWatchlistRequest>,
) -> Response {
    let Some(session) = state.auth_service.session_from_headers(&headers) else {
        return Redirect::to(&state.config.sign_in_url).into_response();
    };

    match state
        .watchlist_service
        .remove_symbol(&session.email, &req.symbol)
        .await
    {
        StoreStatus::Ok => {
            state.watchlist_service.invalidate_view(&session.email).await;
            (StatusCode::OK, Json(json!({ "success": true }))).into_response()
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to remove from watchlist" })),
        )
            .into_response(),
    }
}

// ==================== Dashboard ====================

/// GET /watchlist - The watchlist joined with quote and profile data.
/// Provider failures degrade to rows without market data; the dashboard is
/// cached per user until the next mutation invalidates it.
pub async fn get_watchlist_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let Some(session) = state.auth_service.session_from_headers(&headers) else {
        return Redirect::to(&state.config.sign_in_url).into_response();
    };

    if let Some(rows) = state.watchlist_service.cached_view(&session.email).await {
        return Json(rows).into_response();
    }

    let entries = state.watchlist_service.list_entries(&session.email).await;

    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let quote = match state.quote_service.get_quote(&entry.symbol).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                tracing::warn!("Quote fetch failed for {}: {}", entry.symbol, e);
                None
            }
        };
        let profile = match state.quote_service.get_profile(&entry.symbol).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!("Profile fetch failed for {}: {}", entry.symbol, e);
                None
            }
        };

        let company = profile
            .as_ref()
            .and_then(|p| p.name.clone())
            .unwrap_or_else(|| entry.company.clone());

        rows.push(WatchlistRow {
            symbol: entry.symbol,
            company,
            quote,
            profile,
        });
    }

    state
        .watchlist_service
        .store_view(&session.email, rows.clone())
        .await;

    Json(rows).into_response()
}
