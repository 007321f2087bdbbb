use std::collections::HashMap;
use std::sync::Arc;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{normalize_symbol, UserRecord, WatchlistEntry};

/// Document store client for the `users` and `watchlist` collections.
/// Reads go through an in-memory cache loaded once from PocketBase; writes
/// mutate the cache under its lock and sync to PocketBase in the background.
///
/// The cache write lock is what makes insert-if-absent and delete-if-present
/// atomic per entry; the external store only sees the already-settled record.
#[derive(Clone)]
pub struct StoreClient {
    pocketbase_url: String,
    client: reqwest::Client,
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
    watchlist: Arc<RwLock<HashMap<String, WatchlistEntry>>>,
    loaded_users: Arc<RwLock<bool>>,
    loaded_watchlist: Arc<RwLock<bool>>,
}

#[derive(Debug, Deserialize)]
struct PBListResponse<T> {
    items: Vec<T>,
}

/// Cache key for a watchlist record: one entry per `(user, symbol)` pair.
fn entry_key(user_id: &str, symbol: &str) -> String {
    format!("{}:{}", user_id, normalize_symbol(symbol))
}

impl StoreClient {
    pub fn new(config: &Config) -> Self {
        Self {
            pocketbase_url: config.pocketbase_url.clone(),
            client: reqwest::Client::new(),
            users: Arc::new(RwLock::new(HashMap::new())),
            watchlist: Arc::new(RwLock::new(HashMap::new())),
            loaded_users: Arc::new(RwLock::new(false)),
            loaded_watchlist: Arc::new(RwLock::new(false)),
        }
    }

    // ==================== User Operations ====================

    /// Load users from PocketBase (called once on first access). An
    /// unreachable store leaves the cache empty, which downstream reads as
    /// "no such user"; a malformed payload is an error worth retrying.
    async fn load_users_from_pb(&self) -> Result<(), AppError> {
        let loaded = *self.loaded_users.read().await;
        if loaded {
            return Ok(());
        }

        let url = format!(
            "{}/api/collections/users/records?perPage=500",
            self.pocketbase_url
        );

        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let data = response
                    .json::<PBListResponse<UserRecord>>()
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(format!("Bad users payload: {}", e))
                    })?;
                let mut cache = self.users.write().await;
                for user in data.items {
                    cache.insert(user.email.clone(), user);
                }
                tracing::info!("Loaded {} users from PocketBase", cache.len());
            }
            Ok(response) => {
                tracing::warn!(
                    "Could not load users from PocketBase: {}",
                    response.status()
                );
            }
            Err(e) => {
                tracing::warn!("Could not connect to PocketBase for users: {}", e);
            }
        }

        *self.loaded_users.write().await = true;
        Ok(())
    }

    /// Look up a user document by email. The auth provider owns this
    /// collection; we only ever read it.
    pub async fn find_user_by_email(&self, email: &str) -> Option<UserRecord> {
        if let Err(e) = self.load_users_from_pb().await {
            tracing::error!("User lookup unavailable: {}", e);
            return None;
        }

        let cache = self.users.read().await;
        cache.get(email).cloned()
    }

    // ==================== Watchlist Operations ====================

    /// Load watchlist records from PocketBase (called once on first access)
    async fn load_watchlist_from_pb(&self) -> Result<(), AppError> {
        let loaded = *self.loaded_watchlist.read().await;
        if loaded {
            return Ok(());
        }

        let url = format!(
            "{}/api/collections/watchlist/records?perPage=500",
            self.pocketbase_url
        );

        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let data = response
                    .json::<PBListResponse<WatchlistEntry>>()
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(format!("Bad watchlist payload: {}", e))
                    })?;
                let mut cache = self.watchlist.write().await;
                for entry in data.items {
                    cache.insert(entry_key(&entry.user_id, &entry.symbol), entry);
                }
                tracing::info!("Loaded {} watchlist entries from PocketBase", cache.len());
            }
            Ok(response) => {
                tracing::warn!(
                    "Could not load watchlist from PocketBase: {}",
                    response.status()
                );
            }
            Err(e) => {
                tracing::warn!("Could not connect to PocketBase for watchlist: {}", e);
            }
        }

        *self.loaded_watchlist.write().await = true;
        Ok(())
    }

    /// Insert-if-absent for `(user_id, symbol)`. An existing entry is returned
    /// untouched: `company` and `added_at` are fixed at first insert.
    pub async fn upsert_entry(
        &self,
        user_id: &str,
        symbol: &str,
        company: &str,
    ) -> Result<WatchlistEntry, AppError> {
        self.load_watchlist_from_pb().await?;

        let key = entry_key(user_id, symbol);
        let entry = {
            let mut cache = self.watchlist.write().await;
            if let Some(existing) = cache.get(&key) {
                return Ok(existing.clone());
            }

            let entry = WatchlistEntry::new(user_id.to_string(), symbol, company);
            cache.insert(key, entry.clone());
            entry
        };

        // Sync to PocketBase (async, don't block)
        let url = format!(
            "{}/api/collections/watchlist/records",
            self.pocketbase_url
        );
        let entry_clone = entry.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            match client.post(&url).json(&entry_clone).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        let body = resp.text().await.unwrap_or_default();
                        tracing::warn!(
                            "Failed to sync watchlist entry {}: {} - {}",
                            entry_clone.id,
                            status,
                            body
                        );
                    }
                }
                Err(e) => tracing::warn!("Could not sync watchlist entry: {}", e),
            }
        });

        tracing::info!("Added {} to watchlist for user {}", entry.symbol, user_id);
        Ok(entry)
    }

    /// Delete-if-present for `(user_id, symbol)`. Returns true only when a
    /// record was actually removed.
    pub async fn delete_entry(&self, user_id: &str, symbol: &str) -> Result<bool, AppError> {
        self.load_watchlist_from_pb().await?;

        let removed = {
            let mut cache = self.watchlist.write().await;
            cache.remove(&entry_key(user_id, symbol))
        };

        let Some(entry) = removed else {
            return Ok(false);
        };

        // Sync to PocketBase
        let url = format!(
            "{}/api/collections/watchlist/records/{}",
            self.pocketbase_url, entry.id
        );
        let client = self.client.clone();

        tokio::spawn(async move {
            match client.delete(&url).send().await {
                Ok(resp) => {
                    if !resp.status().is_success() {
                        tracing::warn!(
                            "Failed to sync watchlist delete: {}",
                            resp.status()
                        );
                    }
                }
                Err(e) => tracing::warn!("Could not sync watchlist delete: {}", e),
            }
        });

        tracing::info!("Removed {} from watchlist for user {}", entry.symbol, user_id);
        Ok(true)
    }

    /// All watchlist entries for a user, newest first.
    pub async fn list_entries(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, AppError> {
        self.load_watchlist_from_pb().await?;

        let cache = self.watchlist.read().await;
        let mut list: Vec<WatchlistEntry> = cache
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();

        list.sort_by(|a, b| b.added_at.cmp(&a.added_at));

        Ok(list)
    }

    /// Existence check for `(user_id, symbol)`.
    pub async fn contains(&self, user_id: &str, symbol: &str) -> Result<bool, AppError> {
        self.load_watchlist_from_pb().await?;

        let cache = self.watchlist.read().await;
        Ok(cache.contains_key(&entry_key(user_id, symbol)))
    }
}

#[cfg(test)]
impl StoreClient {
    /// Client with the load-once flags pre-set: nothing listens on the sync
    /// target, so the cache behaves as the sole store.
    pub(crate) fn new_for_tests() -> Self {
        Self {
            pocketbase_url: "http://127.0.0.1:9".to_string(),
            client: reqwest::Client::new(),
            users: Arc::new(RwLock::new(HashMap::new())),
            watchlist: Arc::new(RwLock::new(HashMap::new())),
            loaded_users: Arc::new(RwLock::new(true)),
            loaded_watchlist: Arc::new(RwLock::new(true)),
        }
    }

    pub(crate) async fn seed_user(&self, user: UserRecord) {
        self.users.write().await.insert(user.email.clone(), user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> StoreClient {
        StoreClient::new_for_tests()
    }

    #[tokio::test]
    async fn add_is_idempotent_and_preserves_first_insert_fields() {
        let store = test_client();

        let first = store.upsert_entry("u1", "aapl", "Apple Inc.").await.unwrap();
        let second = store
            .upsert_entry("u1", "AAPL", "Apple Computer")
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.company, "Apple Inc.");
        assert_eq!(second.added_at, first.added_at);

        let entries = store.list_entries("u1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn remove_of_absent_symbol_reports_false_and_changes_nothing() {
        let store = test_client();
        store.upsert_entry("u1", "MSFT", "Microsoft").await.unwrap();

        assert!(!store.delete_entry("u1", "NFLX").await.unwrap());
        assert_eq!(store.list_entries("u1").await.unwrap().len(), 1);

        assert!(store.delete_entry("u1", "msft").await.unwrap());
        assert!(!store.delete_entry("u1", "MSFT").await.unwrap());
        assert!(store.list_entries("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn membership_check_is_case_insensitive() {
        let store = test_client();
        store.upsert_entry("u1", "aapl", "Apple Inc.").await.unwrap();

        assert!(store.contains("u1", "AAPL").await.unwrap());
        assert!(store.contains("u1", "aapl").await.unwrap());
        assert!(!store.contains("u2", "AAPL").await.unwrap());
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_owning_user() {
        let store = test_client();
        store.upsert_entry("u1", "MSFT", "Microsoft").await.unwrap();
        store.upsert_entry("u1", "NFLX", "Netflix").await.unwrap();
        store.upsert_entry("u2", "TSLA", "Tesla").await.unwrap();

        let mut symbols: Vec<String> = store
            .list_entries("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.symbol)
            .collect();
        symbols.sort();

        assert_eq!(symbols, vec!["MSFT".to_string(), "NFLX".to_string()]);
    }

    #[tokio::test]
    async fn user_lookup_hits_the_cache_by_email() {
        let store = test_client();
        store
            .seed_user(UserRecord {
                id: "ext-1".to_string(),
                record_id: "rec-1".to_string(),
                email: "u@example.com".to_string(),
                name: Some("U".to_string()),
            })
            .await;

        let found = store.find_user_by_email("u@example.com").await.unwrap();
        assert_eq!(found.resolved_id(), Some("ext-1".to_string()));
        assert!(store.find_user_by_email("other@example.com").await.is_none());
    }
}
