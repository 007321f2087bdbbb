use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single watchlist record: one tracked symbol for one user.
///
/// `company` and `added_at` are insert-only: repeated adds of the same symbol
/// never touch an existing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub company: String,
    pub added_at: DateTime<Utc>,
}

/// Generate a PocketBase compatible ID (15 chars, a-z0-9)
fn generate_record_id() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..15)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

impl WatchlistEntry {
    /// New entry for `user_id`. The symbol is uppercased and the company name
    /// trimmed before storage; `added_at` is fixed at creation.
    pub fn new(user_id: String, symbol: &str, company: &str) -> Self {
        Self {
            id: generate_record_id(),
            user_id,
            symbol: normalize_symbol(symbol),
            company: company.trim().to_string(),
            added_at: Utc::now(),
        }
    }
}

/// All watchlist lookups and mutations key symbols in uppercase.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Form body for the add endpoint
#[derive(Debug, Deserialize)]
pub struct AddWatchlistRequest {
    pub symbol: String,
    pub company: String,
}

/// Form body for the remove endpoint
#[derive(Debug, Deserialize)]
pub struct RemoveWatchlistRequest {
    pub symbol: String,
}
