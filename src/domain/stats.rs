//! Derived performance statistics.
//!
//! Statistics are a pure function of a trade snapshot, recomputed fresh
//! on every request. Nothing here is cached or persisted; per-user trade
//! volume is small enough that staleness is not worth trading for.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::trade::Trade;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_trades: usize,
    pub total_pnl: Decimal,
    pub win_rate: Decimal,
    pub winning_trades: usize,
    pub losing_trades: usize,
}

impl Statistics {
    /// Compute aggregate statistics over a trade snapshot.
    ///
    /// Trades without a recorded pnl contribute nothing to the total and
    /// count toward neither winners nor losers; the win rate denominator
    /// is decided trades only, and 0 when no trade is decided.
    pub fn compute(trades: &[Trade]) -> Self {
        let mut total_pnl = Decimal::ZERO;
        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;

        for trade in trades {
            if let Some(pnl) = trade.pnl {
                total_pnl += pnl;
                if pnl > Decimal::ZERO {
                    winning_trades += 1;
                } else if pnl < Decimal::ZERO {
                    losing_trades += 1;
                }
            }
        }

        let decided = winning_trades + losing_trades;
        let win_rate = if decided > 0 {
            (Decimal::from(winning_trades) * Decimal::ONE_HUNDRED / Decimal::from(decided))
                .round_dp(2)
        } else {
            Decimal::ZERO
        };

        Statistics {
            total_trades: trades.len(),
            total_pnl,
            win_rate,
            winning_trades,
            losing_trades,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::TradeType;
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;
    use std::str::FromStr;

    fn trade_with_pnl(pnl: Option<&str>) -> Trade {
        Trade {
            id: crate::domain::fresh_id(),
            user_id: "u1".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            pair: "EUR/USD".into(),
            trade_type: TradeType::Long,
            entry_price: Decimal::ONE,
            exit_price: None,
            quantity: Decimal::ONE,
            stop_loss: None,
            take_profit: None,
            risk_amount: None,
            pnl: pnl.map(|p| Decimal::from_str(p).unwrap()),
            notes: None,
            chart_image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_set_yields_zeros() {
        let stats = Statistics::compute(&[]);
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.total_pnl, Decimal::ZERO);
        assert_eq!(stats.win_rate, Decimal::ZERO);
        assert_eq!(stats.winning_trades, 0);
        assert_eq!(stats.losing_trades, 0);
    }

    #[test]
    fn mixed_pnl_example() {
        // pnl = [+100, -50, 0, absent]
        let trades = vec![
            trade_with_pnl(Some("100")),
            trade_with_pnl(Some("-50")),
            trade_with_pnl(Some("0")),
            trade_with_pnl(None),
        ];
        let stats = Statistics::compute(&trades);
        assert_eq!(stats.total_trades, 4);
        assert_eq!(stats.total_pnl, Decimal::from(50));
        assert_eq!(stats.winning_trades, 1);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.win_rate, Decimal::from(50));
    }

    #[test]
    fn absent_pnl_is_not_a_zero_valued_trade() {
        let trades = vec![trade_with_pnl(None), trade_with_pnl(None)];
        let stats = Statistics::compute(&trades);
        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.winning_trades, 0);
        assert_eq!(stats.losing_trades, 0);
        assert_eq!(stats.win_rate, Decimal::ZERO);
    }

    #[test]
    fn all_winners_is_one_hundred_percent() {
        let trades = vec![trade_with_pnl(Some("1.25")), trade_with_pnl(Some("3"))];
        let stats = Statistics::compute(&trades);
        assert_eq!(stats.win_rate, Decimal::from(100));
        assert_eq!(stats.total_pnl, Decimal::from_str("4.25").unwrap());
    }

    #[test]
    fn decimal_sum_has_no_float_drift() {
        // 0.1 summed ten times is exactly 1 in decimal arithmetic.
        let trades: Vec<Trade> = (0..10).map(|_| trade_with_pnl(Some("0.1"))).collect();
        let stats = Statistics::compute(&trades);
        assert_eq!(stats.total_pnl, Decimal::ONE);
    }

    proptest! {
        #[test]
        fn compute_is_pure_and_bounded(pnls in proptest::collection::vec(
            proptest::option::of(-1_000_000i64..1_000_000i64), 0..50)
        ) {
            let trades: Vec<Trade> = pnls
                .iter()
                .map(|p| trade_with_pnl(p.map(|v| v.to_string()).as_deref()))
                .collect();
            let first = Statistics::compute(&trades);
            let second = Statistics::compute(&trades);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.total_trades, trades.len());
            prop_assert!(first.win_rate >= Decimal::ZERO);
            prop_assert!(first.win_rate <= Decimal::ONE_HUNDRED);
            prop_assert!(first.winning_trades + first.losing_trades <= first.total_trades);
        }
    }
}
