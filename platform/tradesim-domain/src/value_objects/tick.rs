use serde::Serialize;

/// One simulated price observation for one instrument at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub ticker: String,
    pub timestamp: i64,
    pub price: f64,
    pub high: f64,
    pub low: f64,
    pub change: f64,
    pub change_percent: f64,
    pub bid: f64,
    pub ask: f64,
}
