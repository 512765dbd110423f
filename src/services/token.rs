//! Stateless bearer tokens
//!
//! Tokens are compact JWS strings (`header.payload.signature`, base64url
//! without padding) signed with HMAC-SHA256 over a server-held secret. The
//! payload is [`Claims`]: the user ID plus issue and expiry times. Nothing is
//! stored server-side, so a token lives until it expires and cannot be
//! revoked.

use chrono::{DateTime, Utc};
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::AuthConfig;
use crate::models::Claims;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// Reasons a token is refused
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Invalid signing key")]
    InvalidKey,

    #[error("Token lifetime of {0} seconds is out of range")]
    InvalidTtl(i64),

    #[error("Failed to encode token: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Issues and verifies signed bearer tokens
pub struct TokenService {
    secret: Vec<u8>,
    ttl_seconds: i64,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.jwt_secret.as_bytes(), config.token_ttl_seconds)
    }

    /// Token lifetime in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Mint a token for `user_id`, valid from now for the configured TTL
    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Mint a token as if the current time were `now`
    pub fn issue_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<String, TokenError> {
        let header = TokenHeader {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims::new(user_id, now, self.ttl_seconds)
            .ok_or(TokenError::InvalidTtl(self.ttl_seconds))?;

        let signing_input = format!(
            "{}.{}",
            BASE64URL_NOPAD.encode(&serde_json::to_vec(&header)?),
            BASE64URL_NOPAD.encode(&serde_json::to_vec(&claims)?)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            signing_input,
            BASE64URL_NOPAD.encode(&signature)
        ))
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature and expiry as if the current time were `now`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (header_b64, payload_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => return Err(TokenError::Malformed),
            };

        let header: TokenHeader = serde_json::from_slice(&decode_segment(header_b64)?)
            .map_err(|_| TokenError::Malformed)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        // Signature is checked before the payload is trusted.
        let signature = decode_segment(signature_b64)?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Claims = serde_json::from_slice(&decode_segment(payload_b64)?)
            .map_err(|_| TokenError::Malformed)?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::InvalidKey)
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, TokenError> {
    BASE64URL_NOPAD
        .decode(segment.as_bytes())
        .map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn service() -> TokenService {
        TokenService::new("test-secret", 3600)
    }

    #[test]
    fn test_issue_and_verify() {
        let service = service();
        let token = service.issue(42).expect("Failed to issue token");

        assert_eq!(token.split('.').count(), 3);
        let claims = service.verify(&token).expect("Token should verify");
        assert_eq!(claims.id, 42);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_valid_for_exactly_one_hour() {
        let service = service();
        let issued = Utc::now();
        let token = service.issue_at(7, issued).unwrap();

        assert!(service.verify_at(&token, issued).is_ok());
        assert!(service
            .verify_at(&token, issued + Duration::minutes(59))
            .is_ok());
        assert!(service
            .verify_at(&token, issued + Duration::seconds(3600))
            .is_ok());
        assert!(matches!(
            service.verify_at(&token, issued + Duration::seconds(3601)),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().issue(1).unwrap();
        let other = TokenService::new("another-secret", 3600);
        assert!(matches!(
            other.verify(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let service = service();
        let token = service.issue(1).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_claims = Claims::new(2, Utc::now(), 3600).unwrap();
        let forged_payload = BASE64URL_NOPAD.encode(&serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(
            service.verify(&forged),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let service = service();
        for token in ["", "abc", "a.b", "a.b.c.d", "!!!.???.***"] {
            assert!(
                matches!(service.verify(token), Err(TokenError::Malformed)),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        let service = service();
        let token = service.issue(1).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let none_header = BASE64URL_NOPAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let forged = format!("{}.{}.{}", none_header, parts[1], parts[2]);

        assert!(matches!(
            service.verify(&forged),
            Err(TokenError::UnsupportedAlgorithm(alg)) if alg == "none"
        ));
    }

    #[test]
    fn test_overflowing_ttl_fails_to_issue() {
        let service = TokenService::new("test-secret", i64::MAX);
        assert!(matches!(
            service.issue(1),
            Err(TokenError::InvalidTtl(i64::MAX))
        ));
    }

    #[test]
    fn test_from_config_uses_ttl() {
        let config = AuthConfig {
            jwt_secret: "s".to_string(),
            token_ttl_seconds: 120,
        };
        let service = TokenService::from_config(&config);
        assert_eq!(service.ttl_seconds(), 120);

        let claims = service.verify(&service.issue(3).unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, 120);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// A token issued at T verifies anywhere in [T, T+ttl] and fails after
        #[test]
        fn token_expiry_boundary(
            user_id in 1i64..1_000_000,
            issued_at in 1_600_000_000i64..1_900_000_000,
            elapsed in 0i64..=3600,
        ) {
            let service = TokenService::new("prop-secret", 3600);
            let issued = Utc.timestamp_opt(issued_at, 0).unwrap();
            let token = service.issue_at(user_id, issued).unwrap();

            let claims = service.verify_at(&token, issued + Duration::seconds(elapsed)).unwrap();
            prop_assert_eq!(claims.id, user_id);

            let late = service.verify_at(&token, issued + Duration::seconds(3601 + elapsed));
            prop_assert!(matches!(late, Err(TokenError::Expired)));
        }
    }
}
