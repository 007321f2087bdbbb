use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::models::{WatchlistEntry, WatchlistRow};
use crate::services::StoreClient;

/// Outcome of a watchlist operation. Persistence and identity failures are
/// policy here, not exceptions: callers get a status they can branch on and
/// nothing ever propagates out of this service.
///
/// Note the asymmetry carried over from the product behavior: add of an
/// already-present symbol is `Ok`, remove of an absent one is `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    /// The record exists (add) or was deleted (remove)
    Ok,
    /// Identity did not resolve, or the record to remove was absent
    NotFound,
    /// The underlying store reported an error
    Failed,
}

/// Email-keyed watchlist operations. Watchlist records are keyed by internal
/// user id, so every call resolves the authenticated email first; an email
/// with no user record degrades to the empty/NotFound outcome.
///
/// Also owns the per-user dashboard view cache, invalidated after mutations
/// that go through the page-action path.
#[derive(Clone)]
pub struct WatchlistService {
    store: StoreClient,
    views: Arc<RwLock<HashMap<String, (Instant, Vec<WatchlistRow>)>>>,
    view_ttl: Duration,
}

impl WatchlistService {
    pub fn new(store: StoreClient) -> Self {
        Self {
            store,
            views: Arc::new(RwLock::new(HashMap::new())),
            view_ttl: Duration::from_secs(60),
        }
    }

    /// Map an authenticated email to the internal user id watchlist records
    /// are keyed by.
    async fn resolve_user_id(&self, email: &str) -> Option<String> {
        if email.is_empty() {
            return None;
        }
        let user = self.store.find_user_by_email(email).await?;
        user.resolved_id()
    }

    /// Full watchlist entries for a user. Unresolved identity and store
    /// failures both degrade to an empty list; the caller never needs to
    /// distinguish "no such user" from "store unavailable".
    pub async fn list_entries(&self, email: &str) -> Vec<WatchlistEntry> {
        let Some(user_id) = self.resolve_user_id(email).await else {
            return Vec::new();
        };

        match self.store.list_entries(&user_id).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("list_entries failed for {}: {}", email, e);
                Vec::new()
            }
        }
    }

    /// Symbols on the user's watchlist, same degradation policy as
    /// [`Self::list_entries`].
    pub async fn list_symbols(&self, email: &str) -> Vec<String> {
        self.list_entries(email)
            .await
            .into_iter()
            .map(|e| e.symbol)
            .collect()
    }

    /// Add a symbol. `Ok` means the record exists after the call, whether it
    /// was created now or was already present.
    pub async fn add_symbol(&self, email: &str, symbol: &str, company: &str) -> StoreStatus {
        let Some(user_id) = self.resolve_user_id(email).await else {
            tracing::warn!("add_symbol: no user record for {}", email);
            return StoreStatus::NotFound;
        };

        match self.store.upsert_entry(&user_id, symbol, company).await {
            Ok(_) => StoreStatus::Ok,
            Err(e) => {
                tracing::error!("add_symbol failed for {}: {}", email, e);
                StoreStatus::Failed
            }
        }
    }

    /// Remove a symbol. Removing a symbol that was never on the list is
    /// `NotFound`, not success.
    pub async fn remove_symbol(&self, email: &str, symbol: &str) -> StoreStatus {
        let Some(user_id) = self.resolve_user_id(email).await else {
            return StoreStatus::NotFound;
        };

        match self.store.delete_entry(&user_id, symbol).await {
            Ok(true) => StoreStatus::Ok,
            Ok(false) => StoreStatus::NotFound,
            Err(e) => {
                tracing::error!("remove_symbol failed for {}: {}", email, e);
                StoreStatus::Failed
            }
        }
    }

    /// Membership check; any failure along the way resolves to false.
    pub async fn is_member(&self, email: &str, symbol: &str) -> bool {
        let Some(user_id) = self.resolve_user_id(email).await else {
            return false;
        };

        self.store
            .contains(&user_id, symbol)
            .await
            .unwrap_or(false)
    }

    // ==================== Dashboard View Cache ====================

    /// Cached dashboard rows for a user, if still fresh.
    pub async fn cached_view(&self, email: &str) -> Option<Vec<WatchlistRow>> {
        let views = self.views.read().await;
        let (built_at, rows) = views.get(email)?;
        if built_at.elapsed() < self.view_ttl {
            Some(rows.clone())
        } else {
            None
        }
    }

    pub async fn store_view(&self, email: &str, rows: Vec<WatchlistRow>) {
        let mut views = self.views.write().await;
        views.insert(email.to_string(), (Instant::now(), rows));
    }

    /// Mark the user's dashboard view stale so the next render recomputes it.
    pub async fn invalidate_view(&self, email: &str) {
        let mut views = self.views.write().await;
        views.remove(email);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;

    async fn service_with_user(email: &str, external_id: &str) -> WatchlistService {
        let store = StoreClient::new_for_tests();
        store
            .seed_user(UserRecord {
                id: external_id.to_string(),
                record_id: "rec0000000001".to_string(),
                email: email.to_string(),
                name: None,
            })
            .await;
        WatchlistService::new(store)
    }

    #[tokio::test]
    async fn operations_for_unknown_email_degrade_without_error() {
        let service = service_with_user("u@example.com", "u1").await;

        assert!(service.list_symbols("nobody@example.com").await.is_empty());
        assert_eq!(
            service.add_symbol("nobody@example.com", "AAPL", "Apple").await,
            StoreStatus::NotFound
        );
        assert_eq!(
            service.remove_symbol("nobody@example.com", "AAPL").await,
            StoreStatus::NotFound
        );
        assert!(!service.is_member("nobody@example.com", "AAPL").await);
    }

    #[tokio::test]
    async fn add_then_query_with_different_case_finds_the_symbol() {
        let service = service_with_user("u@example.com", "u1").await;

        assert_eq!(
            service.add_symbol("u@example.com", "aapl", "Apple Inc.").await,
            StoreStatus::Ok
        );
        assert!(service.is_member("u@example.com", "AAPL").await);
        assert_eq!(service.list_symbols("u@example.com").await, vec!["AAPL"]);
    }

    #[tokio::test]
    async fn repeated_add_is_ok_but_remove_of_absent_is_not_found() {
        let service = service_with_user("u@example.com", "u1").await;

        assert_eq!(
            service.add_symbol("u@example.com", "TSLA", "Tesla").await,
            StoreStatus::Ok
        );
        assert_eq!(
            service.add_symbol("u@example.com", "TSLA", "Tesla").await,
            StoreStatus::Ok
        );

        assert_eq!(
            service.remove_symbol("u@example.com", "TSLA").await,
            StoreStatus::Ok
        );
        assert_eq!(
            service.remove_symbol("u@example.com", "TSLA").await,
            StoreStatus::NotFound
        );
    }

    #[tokio::test]
    async fn list_returns_exactly_the_stored_symbols() {
        let service = service_with_user("u@example.com", "u1").await;
        service.add_symbol("u@example.com", "MSFT", "Microsoft").await;
        service.add_symbol("u@example.com", "NFLX", "Netflix").await;

        let mut symbols = service.list_symbols("u@example.com").await;
        symbols.sort();
        assert_eq!(symbols, vec!["MSFT".to_string(), "NFLX".to_string()]);
    }

    #[tokio::test]
    async fn view_cache_round_trips_and_invalidates() {
        let service = service_with_user("u@example.com", "u1").await;
        let rows = vec![WatchlistRow {
            symbol: "AAPL".to_string(),
            company: "Apple Inc.".to_string(),
            quote: None,
            profile: None,
        }];

        assert!(service.cached_view("u@example.com").await.is_none());
        service.store_view("u@example.com", rows.clone()).await;
        assert_eq!(
            service.cached_view("u@example.com").await.unwrap().len(),
            1
        );

        service.invalidate_view("u@example.com").await;
        assert!(service.cached_view("u@example.com").await.is_none());
    }
}
