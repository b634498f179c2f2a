//! User identity records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::error::JournalError;
use crate::domain::{fresh_id, password};

/// A registered user. Only the password hash is mutable in principle;
/// users are never deleted.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub starting_balance: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a [`User`] for API responses. Never carries the
/// password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Validate registration input and build a new user record with a
    /// fresh id and a salted argon2 password hash.
    pub fn register(
        email: &str,
        password: &str,
        full_name: &str,
        starting_balance: Decimal,
    ) -> Result<Self, JournalError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        if password.is_empty() {
            return Err(JournalError::validation("password", "must not be empty"));
        }
        Ok(User {
            id: fresh_id(),
            email,
            password_hash: password::hash_password(password)?,
            full_name: full_name.to_string(),
            starting_balance,
            created_at: Utc::now(),
        })
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            balance: self.starting_balance,
            created_at: self.created_at,
        }
    }
}

/// Emails are compared case-insensitively; they are lowercased on intake.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), JournalError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(JournalError::validation("email", "missing @"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.ends_with('.') {
        return Err(JournalError::validation("email", "malformed address"));
    }
    Ok(())
}
