//! HTTP request handlers for the journal API.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::error::JournalError;
use crate::domain::password;
use crate::domain::stats::Statistics;
use crate::domain::trade::{Trade, TradeDraft};
use crate::domain::user::{normalize_email, User, UserProfile};

use super::auth::AuthedUser;
use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub balance: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub access_token: String,
    pub token_type: &'static str,
}

/// Deserialize a request body that already parsed as JSON, reporting
/// missing or mistyped fields as a 400 rather than axum's default 422.
fn parse_body<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::bad_request(e.to_string()))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(value): Json<Value>,
) -> Result<Json<AuthResponse>, ApiError> {
    let body: RegisterBody = parse_body(value)?;
    let user = User::register(&body.email, &body.password, &body.full_name, body.balance)?;
    // Duplicate emails surface from the store's unique constraint, which
    // also closes the race between two concurrent registrations.
    state.store.insert_user(&user)?;
    let access_token = state.gate.issue(&user.id)?;
    tracing::info!(user_id = %user.id, "registered new user");
    Ok(Json(AuthResponse {
        user: user.profile(),
        access_token,
        token_type: "bearer",
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(value): Json<Value>,
) -> Result<Json<AuthResponse>, ApiError> {
    let body: LoginBody = parse_body(value)?;
    let email = normalize_email(&body.email);

    let user = match state.store.find_user_by_email(&email)? {
        Some(user) if password::verify_password(&user.password_hash, &body.password) => user,
        Some(_) => return Err(JournalError::InvalidCredentials.into()),
        None => {
            password::equalize_timing(&body.password);
            return Err(JournalError::InvalidCredentials.into());
        }
    };

    let access_token = state.gate.issue(&user.id)?;
    Ok(Json(AuthResponse {
        user: user.profile(),
        access_token,
        token_type: "bearer",
    }))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<UserProfile>, ApiError> {
    match state.store.find_user_by_id(&user_id)? {
        Some(user) => Ok(Json(user.profile())),
        None => Err(ApiError::unauthorized("unknown user")),
    }
}

pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<Vec<Trade>>, ApiError> {
    Ok(Json(state.store.list_trades(&user_id)?))
}

pub async fn get_trade(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(id): Path<String>,
) -> Result<Json<Trade>, ApiError> {
    Ok(Json(state.store.get_trade(&user_id, &id)?))
}

pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Json(value): Json<Value>,
) -> Result<Json<Trade>, ApiError> {
    let draft: TradeDraft = parse_body(value)?;
    let draft = draft.validate()?;
    let trade = state.store.insert_trade(&user_id, &draft)?;
    tracing::info!(user_id = %user_id, trade_id = %trade.id, "recorded trade");
    Ok(Json(trade))
}

pub async fn update_trade(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(id): Path<String>,
    Json(value): Json<Value>,
) -> Result<Json<Trade>, ApiError> {
    let draft: TradeDraft = parse_body(value)?;
    let draft = draft.validate()?;
    Ok(Json(state.store.update_trade(&user_id, &id, &draft)?))
}

pub async fn delete_trade(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_trade(&user_id, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<Statistics>, ApiError> {
    let trades = state.store.list_trades(&user_id)?;
    Ok(Json(Statistics::compute(&trades)))
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(_user_id)): Extension<AuthedUser>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        let url = state.blobs.store(&bytes, &mime)?;
        return Ok(Json(json!({ "url": url })));
    }
    Err(ApiError::bad_request("no file field in upload"))
}
