use serde::{Deserialize, Serialize};

/// User document from the `users` collection. Read-only from this service's
/// perspective: the auth provider owns creation and mutation.
///
/// Documents written by older auth providers carry the identity in an `id`
/// field; others only have the store-level record id (`_id`). Watchlist
/// records are keyed by whichever resolves first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "_id")]
    pub record_id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl UserRecord {
    /// Internal identity the watchlist is keyed by: the external `id` field
    /// when present, otherwise the stringified record id.
    pub fn resolved_id(&self) -> Option<String> {
        if !self.id.is_empty() {
            Some(self.id.clone())
        } else if !self.record_id.is_empty() {
            Some(self.record_id.clone())
        } else {
            None
        }
    }
}

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user_id)
    pub sub: String,
    /// Email
    pub email: String,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
    /// Issued at (as UTC timestamp)
    pub iat: usize,
}

/// Verified session attached to a request.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, record_id: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            record_id: record_id.to_string(),
            email: "user@example.com".to_string(),
            name: None,
        }
    }

    #[test]
    fn resolution_prefers_external_id() {
        assert_eq!(
            record("ext-1", "abc123").resolved_id(),
            Some("ext-1".to_string())
        );
    }

    #[test]
    fn resolution_falls_back_to_record_id() {
        assert_eq!(
            record("", "abc123").resolved_id(),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn resolution_fails_when_no_identifier_present() {
        assert_eq!(record("", "").resolved_id(), None);
    }

    #[test]
    fn raw_document_without_id_fields_deserializes() {
        let user: UserRecord =
            serde_json::from_str(r#"{"email":"u@example.com","name":"U"}"#).unwrap();
        assert_eq!(user.resolved_id(), None);
        assert_eq!(user.email, "u@example.com");
    }
}
