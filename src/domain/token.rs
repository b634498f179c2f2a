//! Stateless bearer token codec.
//!
//! Compact HS256 tokens: `base64url(header).base64url(claims).base64url(sig)`
//! with an HMAC-SHA256 signature over the first two segments. Validation is
//! pure computation; there is no server-side session table and one token
//! never invalidates another.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::domain::error::JournalError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Issues and validates bearer tokens for a fixed secret and TTL.
#[derive(Clone, Debug)]
pub struct TokenCodec {
    secret: Vec<u8>,
    ttl_seconds: i64,
}

impl TokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds,
        }
    }

    /// Issue a token for `user_id` expiring `ttl_seconds` from now.
    pub fn issue(&self, user_id: &str) -> Result<String, JournalError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: Utc::now().timestamp() + self.ttl_seconds,
        };
        let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });
        let header_b64 = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&header)
                .map_err(|e| JournalError::unauthorized(e.to_string()))?,
        );
        let claims_b64 = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims)
                .map_err(|e| JournalError::unauthorized(e.to_string()))?,
        );
        let signing_input = format!("{header_b64}.{claims_b64}");
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| JournalError::unauthorized(e.to_string()))?;
        mac.update(signing_input.as_bytes());
        let sig_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{signing_input}.{sig_b64}"))
    }

    /// Validate a token and return the subject user id.
    ///
    /// Fails on malformed structure, unexpected algorithm, signature
    /// mismatch (checked in constant time) or expiry in the past.
    pub fn verify(&self, token: &str) -> Result<String, JournalError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(JournalError::unauthorized("malformed token"));
        }

        let header_bytes = URL_SAFE_NO_PAD
            .decode(parts[0].as_bytes())
            .map_err(|_| JournalError::unauthorized("invalid token header encoding"))?;
        let header: serde_json::Value = serde_json::from_slice(&header_bytes)
            .map_err(|_| JournalError::unauthorized("invalid token header"))?;
        let alg = header.get("alg").and_then(|v| v.as_str()).unwrap_or_default();
        if alg != "HS256" {
            return Err(JournalError::unauthorized(format!(
                "unsupported token alg `{alg}`"
            )));
        }

        let signing_input = format!("{}.{}", parts[0], parts[1]);
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| JournalError::unauthorized(e.to_string()))?;
        mac.update(signing_input.as_bytes());
        let sig = URL_SAFE_NO_PAD
            .decode(parts[2].as_bytes())
            .map_err(|_| JournalError::unauthorized("invalid token signature encoding"))?;
        mac.verify_slice(&sig)
            .map_err(|_| JournalError::unauthorized("token signature mismatch"))?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(parts[1].as_bytes())
            .map_err(|_| JournalError::unauthorized("invalid token claims encoding"))?;
        let claims: Claims = serde_json::from_slice(&claims_bytes)
            .map_err(|_| JournalError::unauthorized("invalid token claims"))?;

        if Utc::now().timestamp() > claims.exp {
            return Err(JournalError::unauthorized("token expired"));
        }

        Ok(claims.sub)
    }
}
