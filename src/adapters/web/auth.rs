//! Session gate: token issuance plus the bearer-auth middleware.
//!
//! Authorization is applied once, as router middleware over every
//! protected route. Handlers receive the resolved identity as a request
//! extension and never inspect credentials themselves, so a missing,
//! malformed or expired token yields a uniform 401 before any handler
//! (and therefore any ledger mutation) runs.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use crate::domain::error::JournalError;
use crate::domain::token::TokenCodec;
use crate::ports::config_port::ConfigPort;

use super::{ApiError, AppState};

/// Default token lifetime: 30 days.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct SessionGate {
    codec: TokenCodec,
}

impl SessionGate {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            codec: TokenCodec::new(secret.as_bytes().to_vec(), ttl_seconds),
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        let secret =
            config
                .get_string("auth", "token_secret")
                .ok_or_else(|| JournalError::ConfigMissing {
                    section: "auth".into(),
                    key: "token_secret".into(),
                })?;
        let ttl = config.get_int("auth", "token_ttl_seconds", DEFAULT_TOKEN_TTL_SECONDS);
        Ok(Self::new(&secret, ttl))
    }

    pub fn issue(&self, user_id: &str) -> Result<String, JournalError> {
        self.codec.issue(user_id)
    }

    /// Validate the bearer token in `headers` and return the user id it
    /// was issued to. Pure computation, no store access.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<String, JournalError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| JournalError::unauthorized("missing bearer token"))?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| JournalError::unauthorized("malformed authorization header"))?;
        self.codec.verify(token)
    }
}

/// The identity resolved for the current request.
#[derive(Debug, Clone)]
pub struct AuthedUser(pub String);

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = state.gate.authorize(request.headers())?;
    request.extensions_mut().insert(AuthedUser(user_id));
    Ok(next.run(request).await)
}
