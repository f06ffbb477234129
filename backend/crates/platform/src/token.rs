//! Signed Bearer Tokens
//!
//! Stateless identity tokens of the form
//! `base64url(json claims) "." base64url(HMAC-SHA256(secret, payload))`.
//!
//! There is no server-side session table: a token is valid while its
//! signature verifies and `exp` lies in the future. Sliding sessions are
//! implemented by the caller re-issuing a token after each successful
//! verification.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{from_base64url, hmac_sign, hmac_verify, to_base64url};

/// Token verification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token is malformed")]
    Malformed,

    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token payload is invalid")]
    InvalidPayload,
}

/// Claims carried by a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (identity id)
    #[serde(rename = "uid")]
    pub subject: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

impl TokenClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A freshly signed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// HMAC token signer/verifier
#[derive(Clone)]
pub struct TokenSigner {
    secret: [u8; 32],
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: [u8; 32], ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject` valid for the configured TTL
    pub fn issue(&self, subject: i64) -> IssuedToken {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: i64, now: DateTime<Utc>) -> IssuedToken {
        let claims = TokenClaims {
            subject,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        // Serializing three integers cannot fail.
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let payload = to_base64url(&json);
        let signature = to_base64url(&hmac_sign(&self.secret, payload.as_bytes()));

        IssuedToken {
            token: format!("{payload}.{signature}"),
            claims,
        }
    }

    /// Verify signature, expiry and payload shape
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let (payload, signature_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;
        if payload.is_empty() || signature_b64.contains('.') {
            return Err(TokenError::Malformed);
        }

        let signature = from_base64url(signature_b64).map_err(|_| TokenError::Malformed)?;
        if !hmac_verify(&self.secret, payload.as_bytes(), &signature) {
            return Err(TokenError::BadSignature);
        }

        let json = from_base64url(payload).map_err(|_| TokenError::Malformed)?;
        let claims: TokenClaims =
            serde_json::from_slice(&json).map_err(|_| TokenError::InvalidPayload)?;

        if claims.subject <= 0 {
            return Err(TokenError::InvalidPayload);
        }

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}
