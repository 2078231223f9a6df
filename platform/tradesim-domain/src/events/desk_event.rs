use crate::value_objects::snapshot::Snapshot;
use crate::value_objects::tick::Tick;
use serde::Serialize;

/// Everything published to subscribers travels as one of these.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    MarketData { ticks: Vec<Tick>, portfolio: Snapshot },
    Alert { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_serializes_with_a_type_tag() {
        let event = DeskEvent::Alert {
            message: "hello".to_string(),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "alert");
        assert_eq!(json["message"], "hello");
    }

    #[test]
    fn market_data_carries_ticks_and_portfolio() {
        let event = DeskEvent::MarketData {
            ticks: vec![],
            portfolio: Snapshot {
                cash: 1.0,
                holdings: Default::default(),
                portfolio_value: 0.0,
                total_value: 1.0,
            },
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "market_data");
        assert!(json["ticks"].as_array().expect("array").is_empty());
        assert_eq!(json["portfolio"]["total_value"], 1.0);
    }
}
