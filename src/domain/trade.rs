//! Trade records and input validation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::error::JournalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeType {
    Long,
    Short,
}

/// A stored trade record. `id`, `user_id` and `created_at` are assigned
/// by the store and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub pair: String,
    pub trade_type: TradeType,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub quantity: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub risk_amount: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub notes: Option<String>,
    pub chart_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User-supplied trade fields, used by both create and update.
///
/// Update is full replacement: optional fields absent from the draft end
/// up absent on the record, not at their prior value.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeDraft {
    pub date: NaiveDate,
    pub pair: String,
    pub trade_type: TradeType,
    pub entry_price: Decimal,
    #[serde(default)]
    pub exit_price: Option<Decimal>,
    pub quantity: Decimal,
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
    #[serde(default)]
    pub take_profit: Option<Decimal>,
    #[serde(default)]
    pub risk_amount: Option<Decimal>,
    #[serde(default)]
    pub pnl: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub chart_image_url: Option<String>,
}

impl TradeDraft {
    /// Validate field constraints and normalize the pair to upper-case.
    ///
    /// Validation happens before any mutation is committed; a failed
    /// draft never reaches the store.
    pub fn validate(mut self) -> Result<Self, JournalError> {
        self.pair = self.pair.trim().to_uppercase();
        if self.pair.is_empty() {
            return Err(JournalError::validation("pair", "must not be empty"));
        }
        if self.entry_price <= Decimal::ZERO {
            return Err(JournalError::validation(
                "entry_price",
                "must be greater than zero",
            ));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(JournalError::validation(
                "quantity",
                "must be greater than zero",
            ));
        }
        Ok(self)
    }
}
