//! SQLite persistence adapter.
//!
//! Decimals are stored as TEXT to keep their exact representation; dates
//! as `YYYY-MM-DD`; timestamps as RFC 3339. The `seq` rowid gives the
//! stable creation-order tiebreak for same-date trades.

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::error::JournalError;
use crate::domain::fresh_id;
use crate::domain::trade::{Trade, TradeDraft, TradeType};
use crate::domain::user::User;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StorePort;

pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        let db_path =
            config
                .get_string("database", "path")
                .ok_or_else(|| JournalError::ConfigMissing {
                    section: "database".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("database", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, JournalError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), JournalError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                full_name TEXT NOT NULL,
                starting_balance TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS trades (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                owner TEXT NOT NULL REFERENCES users(id),
                date TEXT NOT NULL,
                pair TEXT NOT NULL,
                trade_type TEXT NOT NULL,
                entry_price TEXT NOT NULL,
                exit_price TEXT,
                quantity TEXT NOT NULL,
                stop_loss TEXT,
                take_profit TEXT,
                risk_amount TEXT,
                pnl TEXT,
                notes TEXT,
                chart_image_url TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_trades_owner_date ON trades(owner, date);",
        )
        .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, JournalError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })
    }
}

const TRADE_COLUMNS: &str = "id, owner, date, pair, trade_type, entry_price, exit_price, \
     quantity, stop_loss, take_profit, risk_amount, pnl, notes, chart_image_url, \
     created_at, updated_at";

fn query_err(e: rusqlite::Error) -> JournalError {
    JournalError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn column_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

fn decimal_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).map_err(|e| column_err(idx, e))
}

fn optional_decimal_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| Decimal::from_str(&t).map_err(|e| column_err(idx, e)))
        .transpose()
}

fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| column_err(idx, e))
}

fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| column_err(idx, e))
}

fn trade_type_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<TradeType> {
    let text: String = row.get(idx)?;
    match text.as_str() {
        "Long" => Ok(TradeType::Long),
        "Short" => Ok(TradeType::Short),
        other => Err(column_err(
            idx,
            std::io::Error::other(format!("unknown trade type `{other}`")),
        )),
    }
}

fn map_row_to_trade(row: &rusqlite::Row) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: date_column(row, 2)?,
        pair: row.get(3)?,
        trade_type: trade_type_column(row, 4)?,
        entry_price: decimal_column(row, 5)?,
        exit_price: optional_decimal_column(row, 6)?,
        quantity: decimal_column(row, 7)?,
        stop_loss: optional_decimal_column(row, 8)?,
        take_profit: optional_decimal_column(row, 9)?,
        risk_amount: optional_decimal_column(row, 10)?,
        pnl: optional_decimal_column(row, 11)?,
        notes: row.get(12)?,
        chart_image_url: row.get(13)?,
        created_at: timestamp_column(row, 14)?,
        updated_at: timestamp_column(row, 15)?,
    })
}

fn map_row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        full_name: row.get(3)?,
        starting_balance: decimal_column(row, 4)?,
        created_at: timestamp_column(row, 5)?,
    })
}

fn trade_type_text(t: TradeType) -> &'static str {
    match t {
        TradeType::Long => "Long",
        TradeType::Short => "Short",
    }
}

impl StorePort for SqliteStore {
    fn insert_user(&self, user: &User) -> Result<(), JournalError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (id, email, password_hash, full_name, starting_balance, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.email,
                user.password_hash,
                user.full_name,
                user.starting_balance.to_string(),
                user.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                JournalError::DuplicateEmail
            } else {
                query_err(e)
            }
        })?;
        Ok(())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, JournalError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, email, password_hash, full_name, starting_balance, created_at
                 FROM users WHERE email = ?1",
            )
            .map_err(query_err)?;
        let mut rows = stmt
            .query_map(params![email], map_row_to_user)
            .map_err(query_err)?;
        rows.next().transpose().map_err(query_err)
    }

    fn find_user_by_id(&self, id: &str) -> Result<Option<User>, JournalError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, email, password_hash, full_name, starting_balance, created_at
                 FROM users WHERE id = ?1",
            )
            .map_err(query_err)?;
        let mut rows = stmt
            .query_map(params![id], map_row_to_user)
            .map_err(query_err)?;
        rows.next().transpose().map_err(query_err)
    }

    fn insert_trade(&self, owner: &str, draft: &TradeDraft) -> Result<Trade, JournalError> {
        let conn = self.conn()?;
        let id = fresh_id();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO trades (
                id, owner, date, pair, trade_type, entry_price, exit_price, quantity,
                stop_loss, take_profit, risk_amount, pnl, notes, chart_image_url,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                id,
                owner,
                draft.date.format("%Y-%m-%d").to_string(),
                draft.pair,
                trade_type_text(draft.trade_type),
                draft.entry_price.to_string(),
                draft.exit_price.map(|d| d.to_string()),
                draft.quantity.to_string(),
                draft.stop_loss.map(|d| d.to_string()),
                draft.take_profit.map(|d| d.to_string()),
                draft.risk_amount.map(|d| d.to_string()),
                draft.pnl.map(|d| d.to_string()),
                draft.notes,
                draft.chart_image_url,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(query_err)?;

        drop(conn);
        self.get_trade(owner, &id)
    }

    fn get_trade(&self, owner: &str, id: &str) -> Result<Trade, JournalError> {
        let conn = self.conn()?;
        let query = format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ?1 AND owner = ?2");
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let mut rows = stmt
            .query_map(params![id, owner], map_row_to_trade)
            .map_err(query_err)?;
        match rows.next().transpose().map_err(query_err)? {
            Some(trade) => Ok(trade),
            None => Err(JournalError::NotFound),
        }
    }

    fn update_trade(
        &self,
        owner: &str,
        id: &str,
        draft: &TradeDraft,
    ) -> Result<Trade, JournalError> {
        let conn = self.conn()?;
        let now = Utc::now();

        // Full replacement of mutable fields; absent optionals become NULL.
        let changed = conn
            .execute(
                "UPDATE trades SET
                    date = ?1, pair = ?2, trade_type = ?3, entry_price = ?4,
                    exit_price = ?5, quantity = ?6, stop_loss = ?7, take_profit = ?8,
                    risk_amount = ?9, pnl = ?10, notes = ?11, chart_image_url = ?12,
                    updated_at = ?13
                 WHERE id = ?14 AND owner = ?15",
                params![
                    draft.date.format("%Y-%m-%d").to_string(),
                    draft.pair,
                    trade_type_text(draft.trade_type),
                    draft.entry_price.to_string(),
                    draft.exit_price.map(|d| d.to_string()),
                    draft.quantity.to_string(),
                    draft.stop_loss.map(|d| d.to_string()),
                    draft.take_profit.map(|d| d.to_string()),
                    draft.risk_amount.map(|d| d.to_string()),
                    draft.pnl.map(|d| d.to_string()),
                    draft.notes,
                    draft.chart_image_url,
                    now.to_rfc3339(),
                    id,
                    owner,
                ],
            )
            .map_err(query_err)?;

        if changed == 0 {
            return Err(JournalError::NotFound);
        }

        drop(conn);
        self.get_trade(owner, id)
    }

    fn delete_trade(&self, owner: &str, id: &str) -> Result<(), JournalError> {
        let conn = self.conn()?;
        let deleted = conn
            .execute(
                "DELETE FROM trades WHERE id = ?1 AND owner = ?2",
                params![id, owner],
            )
            .map_err(query_err)?;
        if deleted == 0 {
            return Err(JournalError::NotFound);
        }
        Ok(())
    }

    fn list_trades(&self, owner: &str) -> Result<Vec<Trade>, JournalError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {TRADE_COLUMNS} FROM trades WHERE owner = ?1 ORDER BY date DESC, seq DESC"
        );
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map(params![owner], map_row_to_trade)
            .map_err(query_err)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(query_err)?);
        }
        Ok(trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize_schema().unwrap();
        store
    }

    fn make_user(email: &str) -> User {
        User::register(email, "pw", "Test Trader", Decimal::from(10_000)).unwrap()
    }

    fn draft(date: &str, pair: &str) -> TradeDraft {
        TradeDraft {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            pair: pair.to_string(),
            trade_type: TradeType::Long,
            entry_price: Decimal::from_str("1.2345").unwrap(),
            exit_price: None,
            quantity: Decimal::from(100),
            stop_loss: None,
            take_profit: None,
            risk_amount: None,
            pnl: None,
            notes: None,
            chart_image_url: None,
        }
    }

    #[test]
    fn from_config_missing_path() {
        struct EmptyConfig;
        impl ConfigPort for EmptyConfig {
            fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
                None
            }
            fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
                default
            }
        }
        match SqliteStore::from_config(&EmptyConfig) {
            Err(JournalError::ConfigMissing { section, key }) => {
                assert_eq!(section, "database");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn user_roundtrip_and_duplicate_email() {
        let store = store();
        let user = make_user("a@b.com");
        store.insert_user(&user).unwrap();

        let found = store.find_user_by_email("a@b.com").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.starting_balance, Decimal::from(10_000));

        let dup = make_user("a@b.com");
        assert!(matches!(
            store.insert_user(&dup),
            Err(JournalError::DuplicateEmail)
        ));
    }

    #[test]
    fn find_user_by_id_missing_returns_none() {
        let store = store();
        assert!(store.find_user_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn trade_create_then_get_roundtrip() {
        let store = store();
        let user = make_user("a@b.com");
        store.insert_user(&user).unwrap();

        let mut d = draft("2024-03-01", "EUR/USD");
        d.pnl = Some(Decimal::from_str("12.50").unwrap());
        let created = store.insert_trade(&user.id, &d).unwrap();

        assert_eq!(created.user_id, user.id);
        assert_eq!(created.pair, "EUR/USD");
        assert_eq!(created.pnl, Some(Decimal::from_str("12.50").unwrap()));
        assert_eq!(created.entry_price, Decimal::from_str("1.2345").unwrap());

        let fetched = store.get_trade(&user.id, &created.id).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn get_trade_wrong_owner_is_not_found() {
        let store = store();
        let alice = make_user("alice@b.com");
        let bob = make_user("bob@b.com");
        store.insert_user(&alice).unwrap();
        store.insert_user(&bob).unwrap();

        let trade = store
            .insert_trade(&alice.id, &draft("2024-03-01", "EUR/USD"))
            .unwrap();

        assert!(matches!(
            store.get_trade(&bob.id, &trade.id),
            Err(JournalError::NotFound)
        ));
    }

    #[test]
    fn update_replaces_all_mutable_fields() {
        let store = store();
        let user = make_user("a@b.com");
        store.insert_user(&user).unwrap();

        let mut d = draft("2024-03-01", "EUR/USD");
        d.notes = Some("entry note".into());
        d.stop_loss = Some(Decimal::from_str("1.20").unwrap());
        let created = store.insert_trade(&user.id, &d).unwrap();

        // Replacement draft omits notes and stop_loss entirely.
        let replacement = draft("2024-03-02", "GBP/USD");
        let updated = store
            .update_trade(&user.id, &created.id, &replacement)
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.user_id, user.id);
        assert_eq!(updated.pair, "GBP/USD");
        assert_eq!(updated.notes, None);
        assert_eq!(updated.stop_loss, None);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn update_unknown_or_foreign_trade_is_not_found() {
        let store = store();
        let alice = make_user("alice@b.com");
        let bob = make_user("bob@b.com");
        store.insert_user(&alice).unwrap();
        store.insert_user(&bob).unwrap();

        let trade = store
            .insert_trade(&alice.id, &draft("2024-03-01", "EUR/USD"))
            .unwrap();

        assert!(matches!(
            store.update_trade(&bob.id, &trade.id, &draft("2024-03-02", "X/Y")),
            Err(JournalError::NotFound)
        ));
        assert!(matches!(
            store.update_trade(&alice.id, "missing", &draft("2024-03-02", "X/Y")),
            Err(JournalError::NotFound)
        ));
    }

    #[test]
    fn delete_is_permanent() {
        let store = store();
        let user = make_user("a@b.com");
        store.insert_user(&user).unwrap();

        let trade = store
            .insert_trade(&user.id, &draft("2024-03-01", "EUR/USD"))
            .unwrap();

        store.delete_trade(&user.id, &trade.id).unwrap();
        assert!(matches!(
            store.get_trade(&user.id, &trade.id),
            Err(JournalError::NotFound)
        ));
        assert!(matches!(
            store.delete_trade(&user.id, &trade.id),
            Err(JournalError::NotFound)
        ));
    }

    #[test]
    fn list_orders_by_date_then_creation_descending() {
        let store = store();
        let user = make_user("a@b.com");
        store.insert_user(&user).unwrap();

        let older = store
            .insert_trade(&user.id, &draft("2024-02-01", "A/B"))
            .unwrap();
        let same_day_first = store
            .insert_trade(&user.id, &draft("2024-03-01", "C/D"))
            .unwrap();
        let same_day_second = store
            .insert_trade(&user.id, &draft("2024-03-01", "E/F"))
            .unwrap();

        let listed = store.list_trades(&user.id).unwrap();
        let ids: Vec<&str> = listed.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                same_day_second.id.as_str(),
                same_day_first.id.as_str(),
                older.id.as_str()
            ]
        );
    }

    #[test]
    fn list_is_scoped_to_owner() {
        let store = store();
        let alice = make_user("alice@b.com");
        let bob = make_user("bob@b.com");
        store.insert_user(&alice).unwrap();
        store.insert_user(&bob).unwrap();

        store
            .insert_trade(&alice.id, &draft("2024-03-01", "A/B"))
            .unwrap();

        assert_eq!(store.list_trades(&bob.id).unwrap().len(), 0);
        assert_eq!(store.list_trades(&alice.id).unwrap().len(), 1);
    }
}
