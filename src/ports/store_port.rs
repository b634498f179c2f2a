//! Persistence port for users and trades.
//!
//! Every trade operation is scoped by the owner's user id. A lookup for
//! an id owned by someone else fails with `NotFound`, identically to a
//! nonexistent id, so that callers cannot probe for other users' data.

use crate::domain::error::JournalError;
use crate::domain::trade::{Trade, TradeDraft};
use crate::domain::user::User;

pub trait StorePort {
    /// Insert a new user. Fails with `DuplicateEmail` if the email is
    /// already registered (case-insensitive).
    fn insert_user(&self, user: &User) -> Result<(), JournalError>;

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, JournalError>;

    fn find_user_by_id(&self, id: &str) -> Result<Option<User>, JournalError>;

    /// Persist a validated draft as a new trade owned by `owner`,
    /// assigning a fresh id and timestamps. Returns the stored record.
    fn insert_trade(&self, owner: &str, draft: &TradeDraft) -> Result<Trade, JournalError>;

    fn get_trade(&self, owner: &str, id: &str) -> Result<Trade, JournalError>;

    /// Replace all mutable fields of an owned trade with the draft.
    /// `id`, owner and `created_at` are untouched; `updated_at` is
    /// refreshed.
    fn update_trade(
        &self,
        owner: &str,
        id: &str,
        draft: &TradeDraft,
    ) -> Result<Trade, JournalError>;

    fn delete_trade(&self, owner: &str, id: &str) -> Result<(), JournalError>;

    /// All trades owned by `owner`, ordered by date descending, then by
    /// creation order descending for same-date ties.
    fn list_trades(&self, owner: &str) -> Result<Vec<Trade>, JournalError>;
}
