//! Signed, time-limited bearer tokens
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(mac)`
//! with the username as `sub`. Signatures are checked in constant time.

use crate::error::{FeedbackError, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Message returned for every token rejection
pub const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct Header {
    alg: String,
    typ: String,
}

/// Token payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Expiry, unix seconds
    pub exp: i64,
    /// Issued at, unix seconds
    pub iat: i64,
}

/// Issues and verifies access tokens with a shared HMAC key
pub struct TokenSigner {
    key: SecretString,
    ttl: Duration,
}

impl TokenSigner {
    /// Create a signer whose tokens live `ttl_minutes`
    ///
    /// The lifetime must be within `1..=MAX_TOKEN_TTL_MINUTES`.
    pub fn new(key: impl Into<String>, ttl_minutes: i64) -> Result<Self> {
        let ttl = Some(ttl_minutes)
            .filter(|m| (1..=MAX_TOKEN_TTL_MINUTES).contains(m))
            .and_then(Duration::try_minutes)
            .ok_or_else(|| {
                FeedbackError::Validation(format!(
                    "Token lifetime must be between 1 and {} minutes, got {}",
                    MAX_TOKEN_TTL_MINUTES, ttl_minutes
                ))
            })?;

        Ok(Self {
            key: SecretString::from(key.into()),
            ttl,
        })
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|e| FeedbackError::Other(format!("Invalid HMAC key: {}", e)))
    }

    /// Issue a token for `subject` expiring `ttl` from now
    pub fn issue(&self, subject: &str) -> Result<String> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String> {
        let header = Header {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims {
            sub: subject.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let reject = |reason: &str| {
            debug!("Rejecting access token: {}", reason);
            FeedbackError::Unauthorized(INVALID_CREDENTIALS.to_string())
        };

        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(reject("malformed"));
        };

        let header: Header = URL_SAFE_NO_PAD
            .decode(header_b64)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or_else(|| reject("bad header"))?;
        if header.alg != "HS256" {
            return Err(reject("unsupported algorithm"));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| reject("bad signature encoding"))?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| reject("signature mismatch"))?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or_else(|| reject("bad claims"))?;

        if claims.exp <= now.timestamp() {
            return Err(reject("expired"));
        }
        if claims.sub.trim().is_empty() {
            return Err(reject("missing subject"));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret", 30).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = signer();
        let token = signer.issue("alice").unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer();
        let issued = Utc::now() - Duration::minutes(31);
        let token = signer.issue_at("alice", issued).unwrap();

        let err = signer.verify(&token).unwrap_err();
        assert!(matches!(err, FeedbackError::Unauthorized(_)));
        assert!(signer.verify_at(&token, issued + Duration::minutes(29)).is_ok());
    }

    #[test]
    fn test_forged_tokens_rejected() {
        let token = signer().issue("alice").unwrap();
        let other = TokenSigner::new("another-secret", 30).unwrap();
        assert!(other.verify(&token).is_err());

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_claims = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&Claims {
                sub: "admin".to_string(),
                exp: i64::MAX,
                iat: 0,
            })
            .unwrap(),
        );
        parts[1] = &forged_claims;
        assert!(signer().verify(&parts.join(".")).is_err());
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let signer = signer();
        for token in ["", "abc", "a.b", "a.b.c.d", "!!!.???.###"] {
            let err = signer.verify(token).unwrap_err();
            assert_eq!(err.to_string(), INVALID_CREDENTIALS);
        }
    }

    #[test]
    fn test_empty_subject_rejected() {
        let signer = signer();
        let token = signer.issue("  ").unwrap();
        assert!(signer.verify(&token).is_err());
    }

    #[test]
    fn test_token_lifetime_bounds() {
        for minutes in [0, -5, MAX_TOKEN_TTL_MINUTES + 1, i64::MAX, i64::MIN] {
            let err = TokenSigner::new("k", minutes).err().unwrap();
            assert!(matches!(err, FeedbackError::Validation(_)), "{}", minutes);
        }

        let signer = TokenSigner::new("k", MAX_TOKEN_TTL_MINUTES).unwrap();
        let claims = signer.verify(&signer.issue("alice").unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_TOKEN_TTL_MINUTES * 60);
    }
}
