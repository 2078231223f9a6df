use crate::value_objects::position::Position;
use crate::value_objects::side::Side;
use crate::value_objects::snapshot::{Holding, Snapshot};
use crate::value_objects::tick::Tick;
use crate::value_objects::transaction::Transaction;
use crate::value_objects::value_point::ValuePoint;
use std::collections::BTreeMap;

pub const INITIAL_CASH: f64 = 1_000_000.00;

/// Value history is bounded; once the cap is exceeded the second-oldest
/// entry is evicted so the reset seed at index 0 survives as a baseline.
const VALUE_HISTORY_CAP: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub enum TradeError {
    InvalidQuantity,
    PriceUnavailable { ticker: String },
    InsufficientFunds { required: f64, available: f64 },
    InsufficientShares { requested: u64, held: u64 },
}

impl std::fmt::Display for TradeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeError::InvalidQuantity => write!(f, "quantity must be positive"),
            TradeError::PriceUnavailable { ticker } => {
                write!(f, "market price not available for {ticker}")
            }
            TradeError::InsufficientFunds {
                required,
                available,
            } => write!(
                f,
                "not enough cash: required {required:.2}, available {available:.2}"
            ),
            TradeError::InsufficientShares { requested, held } => {
                write!(f, "not enough shares: requested {requested}, held {held}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeReceipt {
    pub ticker: String,
    pub side: Side,
    pub quantity: u64,
    pub price: f64,
    pub total_value: f64,
}

/// Single-user paper-trading ledger: cash, positions with average-cost
/// accounting, a last-known-price snapshot, and append-only transaction
/// and value histories. All mutation is expected to run serialized; the
/// owning task guards the ledger with a single lock.
#[derive(Debug)]
pub struct Ledger {
    cash: f64,
    positions: BTreeMap<String, Position>,
    last_prices: BTreeMap<String, f64>,
    transactions: Vec<Transaction>,
    value_history: Vec<ValuePoint>,
}

impl Ledger {
    pub fn new(now: i64) -> Self {
        let mut ledger = Self {
            cash: 0.0,
            positions: BTreeMap::new(),
            last_prices: BTreeMap::new(),
            transactions: Vec::new(),
            value_history: Vec::new(),
        };
        ledger.reset(now);
        ledger
    }

    /// Reinitializes cash, clears positions, prices and transactions, and
    /// reseeds the value history with one entry at `now`. Outstanding alert
    /// rules are not this ledger's concern; clearing them (or not) is the
    /// orchestrator's configuration choice.
    pub fn reset(&mut self, now: i64) {
        self.cash = INITIAL_CASH;
        self.positions.clear();
        self.last_prices.clear();
        self.transactions.clear();
        self.value_history = vec![ValuePoint {
            timestamp: now,
            value: self.cash,
        }];
    }

    /// Overwrites the last-known price for each tick, last writer wins.
    pub fn update_prices(&mut self, ticks: &[Tick]) {
        for tick in ticks {
            self.last_prices.insert(tick.ticker.clone(), tick.price);
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn last_price(&self, ticker: &str) -> Option<f64> {
        self.last_prices.get(ticker).copied()
    }

    pub fn last_prices(&self) -> &BTreeMap<String, f64> {
        &self.last_prices
    }

    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker)
    }

    /// Tickers currently held, in sorted order.
    pub fn held_tickers(&self) -> Vec<String> {
        self.positions.keys().cloned().collect()
    }

    pub fn buy(&mut self, ticker: &str, quantity: u64, now: i64) -> Result<TradeReceipt, TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity);
        }
        let price = self
            .last_prices
            .get(ticker)
            .copied()
            .ok_or_else(|| TradeError::PriceUnavailable {
                ticker: ticker.to_string(),
            })?;
        let cost = price * quantity as f64;
        if self.cash < cost {
            return Err(TradeError::InsufficientFunds {
                required: cost,
                available: self.cash,
            });
        }

        self.cash -= cost;
        let position = self
            .positions
            .entry(ticker.to_string())
            .or_insert(Position {
                shares: 0,
                avg_price: price,
            });
        let old_cost = position.avg_price * position.shares as f64;
        position.shares += quantity;
        position.avg_price = (old_cost + cost) / position.shares as f64;

        let receipt = TradeReceipt {
            ticker: ticker.to_string(),
            side: Side::Buy,
            quantity,
            price,
            total_value: cost,
        };
        self.record_transaction(&receipt, now);
        Ok(receipt)
    }

    pub fn sell(
        &mut self,
        ticker: &str,
        quantity: u64,
        now: i64,
    ) -> Result<TradeReceipt, TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity);
        }
        let price = self
            .last_prices
            .get(ticker)
            .copied()
            .ok_or_else(|| TradeError::PriceUnavailable {
                ticker: ticker.to_string(),
            })?;
        let held = self.positions.get(ticker).map(|p| p.shares).unwrap_or(0);
        if held < quantity {
            return Err(TradeError::InsufficientShares {
                requested: quantity,
                held,
            });
        }

        let proceeds = price * quantity as f64;
        self.cash += proceeds;
        if let Some(position) = self.positions.get_mut(ticker) {
            position.shares -= quantity;
            if position.shares == 0 {
                self.positions.remove(ticker);
            }
        }

        let receipt = TradeReceipt {
            ticker: ticker.to_string(),
            side: Side::Sell,
            quantity,
            price,
            total_value: proceeds,
        };
        self.record_transaction(&receipt, now);
        Ok(receipt)
    }

    /// Computes the enriched snapshot. A timestamped call also appends one
    /// `{timestamp, total_value}` sample to the value history under the
    /// bounded-eviction rule; without a timestamp this is a pure read.
    pub fn get_state(&mut self, timestamp: Option<i64>) -> Snapshot {
        let mut holdings = BTreeMap::new();
        let mut portfolio_value = 0.0;
        for (ticker, position) in &self.positions {
            let market_price = self
                .last_prices
                .get(ticker)
                .copied()
                .unwrap_or(position.avg_price);
            portfolio_value += position.shares as f64 * market_price;
            holdings.insert(
                ticker.clone(),
                Holding {
                    shares: position.shares,
                    avg_price: position.avg_price,
                    market_price,
                },
            );
        }
        let total_value = self.cash + portfolio_value;

        if let Some(timestamp) = timestamp {
            self.value_history.push(ValuePoint {
                timestamp,
                value: total_value,
            });
            if self.value_history.len() > VALUE_HISTORY_CAP {
                self.value_history.remove(1);
            }
        }

        Snapshot {
            cash: self.cash,
            holdings,
            portfolio_value,
            total_value,
        }
    }

    /// Transactions ordered by recency (newest first).
    pub fn transactions(&self) -> Vec<Transaction> {
        let mut view = self.transactions.clone();
        view.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        view
    }

    pub fn value_history(&self) -> &[ValuePoint] {
        &self.value_history
    }

    fn record_transaction(&mut self, receipt: &TradeReceipt, now: i64) {
        self.transactions.push(Transaction {
            timestamp: now,
            ticker: receipt.ticker.clone(),
            side: receipt.side,
            quantity: receipt.quantity,
            price: receipt.price,
            total_value: receipt.total_value,
        });
    }
}
