use crate::value_objects::side::Side;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub timestamp: i64,
    pub ticker: String,
    pub side: Side,
    pub quantity: u64,
    pub price: f64,
    pub total_value: f64,
}
