use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    CompanyProfile, FinnhubSearchResponse, Quote, StockSearchResult,
};

/// Finnhub-backed market data with per-symbol TTL caches. Quotes go stale in
/// a minute; company profiles barely move, so they get an hour.
#[derive(Clone)]
pub struct QuoteService {
    client: reqwest::Client,
    config: Config,
    quote_cache: Arc<RwLock<HashMap<String, (DateTime<Utc>, Quote)>>>,
    profile_cache: Arc<RwLock<HashMap<String, (DateTime<Utc>, CompanyProfile)>>>,
}

impl QuoteService {
    pub fn new(config: Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            quote_cache: Arc::new(RwLock::new(HashMap::new())),
            profile_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn api_key(&self) -> Result<&str, AppError> {
        self.config
            .finnhub_api_key
            .as_deref()
            .ok_or_else(|| AppError::ExternalApiError("FINNHUB_API_KEY not configured".into()))
    }

    /// Get a quote for a symbol, using cache if available and not expired
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, AppError> {
        let cache_key = symbol.to_uppercase();

        // Check cache first
        {
            let cache = self.quote_cache.read().await;
            if let Some((fetched_at, quote)) = cache.get(&cache_key) {
                let age = Utc::now().signed_duration_since(*fetched_at);
                if age.num_seconds() < self.config.quote_cache_ttl_seconds as i64 {
                    tracing::debug!("Quote cache hit for {}", cache_key);
                    return Ok(quote.clone());
                }
            }
        }

        let token = self.api_key()?;
        let url = format!(
            "{}/quote?symbol={}&token={}",
            self.config.finnhub_api_url,
            urlencoding::encode(&cache_key),
            token
        );

        let quote: Quote = self.client.get(&url).send().await?.json().await?;

        {
            let mut cache = self.quote_cache.write().await;
            cache.insert(cache_key, (Utc::now(), quote.clone()));
        }

        Ok(quote)
    }

    /// Get a company profile for a symbol, using cache if available and not expired
    pub async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile, AppError> {
        let cache_key = symbol.to_uppercase();

        {
            let cache = self.profile_cache.read().await;
            if let Some((fetched_at, profile)) = cache.get(&cache_key) {
                let age = Utc::now().signed_duration_since(*fetched_at);
                if age.num_seconds() < self.config.profile_cache_ttl_seconds as i64 {
                    tracing::debug!("Profile cache hit for {}", cache_key);
                    return Ok(profile.clone());
                }
            }
        }

        let token = self.api_key()?;
        let url = format!(
            "{}/stock/profile2?symbol={}&token={}",
            self.config.finnhub_api_url,
            urlencoding::encode(&cache_key),
            token
        );

        let profile: CompanyProfile = self.client.get(&url).send().await?.json().await?;

        {
            let mut cache = self.profile_cache.write().await;
            cache.insert(cache_key, (Utc::now(), profile.clone()));
        }

        Ok(profile)
    }

    /// Symbol search. Without an API key the static popular list doubles as
    /// the directory, so the search box still works in dev.
    pub async fn search_symbols(&self, query: &str) -> Result<Vec<StockSearchResult>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Self::popular_stocks());
        }

        let Ok(token) = self.api_key() else {
            return Ok(Self::popular_matching(query));
        };

        let url = format!(
            "{}/search?q={}&token={}",
            self.config.finnhub_api_url,
            urlencoding::encode(query),
            token
        );

        let response: FinnhubSearchResponse =
            self.client.get(&url).send().await?.json().await?;

        Ok(response
            .result
            .into_iter()
            .take(15)
            .map(|hit| StockSearchResult {
                symbol: hit.symbol.to_uppercase(),
                name: hit.description,
                exchange: None,
                asset_type: hit.asset_type,
                is_in_watchlist: false,
            })
            .collect())
    }

    /// Static fallback directory of widely-held US tickers.
    pub fn popular_stocks() -> Vec<StockSearchResult> {
        vec![
            ("AAPL", "Apple Inc."),
            ("MSFT", "Microsoft Corporation"),
            ("GOOGL", "Alphabet Inc. Class A"),
            ("AMZN", "Amazon.com Inc."),
            ("META", "Meta Platforms Inc."),
            ("NVDA", "NVIDIA Corporation"),
            ("TSLA", "Tesla Inc."),
            ("AMD", "Advanced Micro Devices"),
            ("INTC", "Intel Corporation"),
            ("NFLX", "Netflix Inc."),
            ("ADBE", "Adobe Inc."),
            ("CRM", "Salesforce Inc."),
            ("ORCL", "Oracle Corporation"),
            ("QCOM", "Qualcomm Inc."),
            ("PYPL", "PayPal Holdings Inc."),
            ("UBER", "Uber Technologies Inc."),
            ("SHOP", "Shopify Inc."),
            ("JPM", "JPMorgan Chase & Co."),
            ("V", "Visa Inc."),
            ("DIS", "The Walt Disney Company"),
        ]
        .into_iter()
        .map(|(symbol, name)| StockSearchResult {
            symbol: symbol.to_string(),
            name: name.to_string(),
            exchange: Some("US".to_string()),
            asset_type: Some("Common Stock".to_string()),
            is_in_watchlist: false,
        })
        .collect()
    }

    fn popular_matching(query: &str) -> Vec<StockSearchResult> {
        let needle = query.to_uppercase();
        Self::popular_stocks()
            .into_iter()
            .filter(|s| {
                s.symbol.contains(&needle) || s.name.to_uppercase().contains(&needle)
            })
            .collect()
    }
}
