use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Tokens expire a fixed 24 hours after issuance.
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Claims carried by a session token. The username is the only identity key
/// propagated between the auth and game services.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub exp: usize,
}

/// Sign a session token for `username` under the shared symmetric secret.
pub fn issue(secret: &str, username: &str) -> Result<String, ServiceError> {
    let exp = (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp() as usize;
    let claims = Claims {
        username: username.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::Internal(e.to_string()))
}

/// Extract the username from a raw `Authorization` header value.
///
/// Strips an optional `"Bearer "` prefix, then checks signature and expiry.
/// Every failure mode (bad signature, wrong secret, expired, malformed,
/// wrong algorithm) collapses to `None`; nothing propagates past here.
pub fn verify(secret: &str, raw_header_value: &str) -> Option<String> {
    let token = raw_header_value
        .strip_prefix("Bearer ")
        .unwrap_or(raw_header_value);

    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    ) {
        Ok(data) => Some(data.claims.username),
        Err(e) => {
            log::error!("Token validation error: {}", e);
            None
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    static SECRET: &str = "test-secret";

    #[test]
    fn test_issue_then_verify() {
        let token = issue(SECRET, "alice").unwrap();
        assert_eq!(verify(SECRET, &token), Some("alice".to_string()));
    }

    #[test]
    fn test_verify_with_bearer_prefix() {
        let token = issue(SECRET, "alice").unwrap();
        let header = format!("Bearer {}", token);
        assert_eq!(verify(SECRET, &header), Some("alice".to_string()));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = issue("some-other-secret", "alice").unwrap();
        assert_eq!(verify(SECRET, &token), None);
    }

    #[test]
    fn test_expired_token_is_invalid() {
        // Build the claim set by hand with an expiry well past the
        // validation leeway.
        let exp = (Utc::now() - Duration::hours(2)).timestamp() as usize;
        let claims = Claims {
            username: "alice".to_string(),
            exp,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(verify(SECRET, &token), None);
    }

    #[test]
    fn test_malformed_token_is_invalid() {
        assert_eq!(verify(SECRET, "Bearer not-a-real-token"), None);
        assert_eq!(verify(SECRET, ""), None);
    }
}
