use serde::{Deserialize, Serialize};

/// Market quote as returned by the Finnhub `/quote` endpoint.
/// Field names follow the provider's single-letter convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// Current price
    pub c: f64,
    /// Absolute change
    #[serde(default)]
    pub d: Option<f64>,
    /// Percent change
    #[serde(default)]
    pub dp: Option<f64>,
    /// Day high
    #[serde(default)]
    pub h: f64,
    /// Day low
    #[serde(default)]
    pub l: f64,
    /// Open
    #[serde(default)]
    pub o: f64,
    /// Previous close
    #[serde(default)]
    pub pc: f64,
}

/// Company profile from the Finnhub `/stock/profile2` endpoint.
/// Market cap and P/E are sometimes missing or zero for thin tickers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "marketCapitalization")]
    pub market_capitalization: Option<f64>,
    #[serde(default, rename = "peRatio")]
    pub pe_ratio: Option<f64>,
}

/// One row of the watchlist dashboard: the stored entry joined with whatever
/// quote data the provider returned. Quote fields stay `None` when the
/// provider is unavailable.
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistRow {
    pub symbol: String,
    pub company: String,
    pub quote: Option<Quote>,
    pub profile: Option<CompanyProfile>,
}

/// Search hit from the symbol directory, flagged with the caller's current
/// watchlist membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSearchResult {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default, rename = "type")]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub is_in_watchlist: bool,
}

/// Raw hit from the Finnhub `/search` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct FinnhubSearchHit {
    pub symbol: String,
    pub description: String,
    #[serde(default, rename = "type")]
    pub asset_type: Option<String>,
}

/// Finnhub `/search` response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct FinnhubSearchResponse {
    #[serde(default)]
    pub result: Vec<FinnhubSearchHit>,
}
