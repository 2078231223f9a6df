use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holding {
    pub shares: u64,
    pub avg_price: f64,
    pub market_price: f64,
}

/// Point-in-time computed view of the ledger: cash, holdings enriched with
/// live prices, and aggregate values. The canonical read model for every
/// other component and every external consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub cash: f64,
    pub holdings: BTreeMap<String, Holding>,
    pub portfolio_value: f64,
    pub total_value: f64,
}
