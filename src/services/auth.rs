use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::config::Config;
use crate::error::AppError;
use crate::models::{Claims, Session};

/// Session verification against the external identity provider's JWTs.
/// This service never issues or mutates sessions; it only checks the token
/// attached to a request and extracts the caller's identity.
#[derive(Clone)]
pub struct AuthService {
    config: Config,
}

impl AuthService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn verify_jwt(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    /// Resolve the session for a request from its headers: a Bearer token in
    /// the Authorization header, or the `session` cookie browsers send with
    /// `credentials: "include"`. Missing or invalid tokens are simply "no
    /// session", not an error.
    pub fn session_from_headers(&self, headers: &HeaderMap) -> Option<Session> {
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.to_string());

        let token = bearer.or_else(|| {
            CookieJar::from_headers(headers)
                .get("session")
                .map(|c| c.value().to_string())
        })?;

        match self.verify_jwt(&token) {
            Ok(claims) => Some(Session {
                user_id: claims.sub,
                email: claims.email,
            }),
            Err(e) => {
                tracing::debug!("Rejected session token: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn test_service(secret: &str) -> AuthService {
        let mut config = Config::for_tests();
        config.jwt_secret = secret.to_string();
        AuthService::new(config)
    }

    fn sign(secret: &str, sub: &str, email: &str) -> String {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: sub.to_string(),
            email: email.to_string(),
            exp: now + 3600,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_bearer_token_yields_a_session() {
        let auth = test_service("dev-secret");
        let token = sign("dev-secret", "u1", "u@example.com");

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );

        let session = auth.session_from_headers(&headers).unwrap();
        assert_eq!(session.user_id, "u1");
        assert_eq!(session.email, "u@example.com");
    }

    #[test]
    fn session_cookie_is_accepted() {
        let auth = test_service("dev-secret");
        let token = sign("dev-secret", "u2", "c@example.com");

        let mut headers = HeaderMap::new();
        headers.insert("cookie", format!("session={}", token).parse().unwrap());

        let session = auth.session_from_headers(&headers).unwrap();
        assert_eq!(session.email, "c@example.com");
    }

    #[test]
    fn missing_or_garbage_tokens_yield_no_session() {
        let auth = test_service("dev-secret");

        assert!(auth.session_from_headers(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer not-a-jwt".parse().unwrap());
        assert!(auth.session_from_headers(&headers).is_none());
    }

    #[test]
    fn token_signed_with_wrong_secret_is_rejected() {
        let auth = test_service("dev-secret");
        let token = sign("other-secret", "u1", "u@example.com");

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        assert!(auth.session_from_headers(&headers).is_none());
    }
}
