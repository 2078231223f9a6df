use serde::Serialize;
use std::collections::BTreeMap;
use tradesim_domain::entities::ledger::{Ledger, INITIAL_CASH};
use tradesim_domain::value_objects::snapshot::Holding;
use tradesim_domain::value_objects::value_point::ValuePoint;

/// End-of-session performance roll-up derived from the ledger snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub cash: f64,
    pub total_invested_capital: f64,
    pub current_market_value: f64,
    pub total_value: f64,
    pub total_pnl: f64,
    /// Mark-to-market move versus the previous session closes; holdings with
    /// no recorded previous close contribute nothing.
    pub pnl_today: f64,
    pub holdings: BTreeMap<String, Holding>,
    pub value_history: Vec<ValuePoint>,
}

pub fn performance_summary(
    ledger: &mut Ledger,
    previous_closes: &BTreeMap<String, f64>,
) -> PerformanceSummary {
    let snapshot = ledger.get_state(None);

    let mut total_invested_capital = 0.0;
    let mut pnl_today = 0.0;
    for (ticker, holding) in &snapshot.holdings {
        total_invested_capital += holding.shares as f64 * holding.avg_price;
        if let Some(close) = previous_closes.get(ticker) {
            pnl_today += (holding.market_price - close) * holding.shares as f64;
        }
    }

    PerformanceSummary {
        cash: snapshot.cash,
        total_invested_capital,
        current_market_value: snapshot.portfolio_value,
        total_value: snapshot.total_value,
        total_pnl: snapshot.total_value - INITIAL_CASH,
        pnl_today,
        holdings: snapshot.holdings,
        value_history: ledger.value_history().to_vec(),
    }
}
