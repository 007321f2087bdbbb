use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub pocketbase_url: String,
    pub finnhub_api_url: String,
    pub finnhub_api_key: Option<String>,
    pub quote_cache_ttl_seconds: u64,
    pub profile_cache_ttl_seconds: u64,
    // JWT configuration (session verification only; tokens are issued elsewhere)
    pub jwt_secret: String,
    // Frontend URLs for page-level redirects
    pub frontend_url: String,
    pub sign_in_url: String,
    // CORS configuration
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        // Try to load .env from current directory first, then parent
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_path(std::path::Path::new("../.env"));
        }

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            pocketbase_url: env::var("POCKETBASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8090".to_string()),
            finnhub_api_url: env::var("FINNHUB_API_URL")
                .unwrap_or_else(|_| "https://finnhub.io/api/v1".to_string()),
            finnhub_api_key: env::var("FINNHUB_API_KEY").ok().filter(|v| !v.is_empty()),
            quote_cache_ttl_seconds: env::var("QUOTE_CACHE_TTL")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("QUOTE_CACHE_TTL must be a number"),
            profile_cache_ttl_seconds: env::var("PROFILE_CACHE_TTL")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .expect("PROFILE_CACHE_TTL must be a number"),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-super-secret-jwt-key-change-in-production".to_string()),
            sign_in_url: env::var("SIGN_IN_URL")
                .unwrap_or_else(|_| format!("{}/sign-in", frontend_url)),
            frontend_url,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
impl Config {
    /// Config pointing at unroutable endpoints, for unit tests.
    pub(crate) fn for_tests() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            pocketbase_url: "http://127.0.0.1:9".to_string(),
            finnhub_api_url: "http://127.0.0.1:9".to_string(),
            finnhub_api_key: None,
            quote_cache_ttl_seconds: 60,
            profile_cache_ttl_seconds: 3600,
            jwt_secret: "test-secret".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            sign_in_url: "http://localhost:3000/sign-in".to_string(),
            cors_allowed_origins: vec![],
        }
    }
}
