use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuePoint {
    pub timestamp: i64,
    pub value: f64,
}
