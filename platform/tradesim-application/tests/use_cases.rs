use std::collections::BTreeMap;
use tradesim_application::reporting::performance_summary;
use tradesim_application::simulation::{market_step, price_alert_step};
use tradesim_domain::entities::ledger::Ledger;
use tradesim_domain::services::alerts::{AutoTrade, Condition, PriceRule, RuleBook};
use tradesim_domain::services::tick_replay::TickReplay;
use tradesim_domain::value_objects::bar::Bar;
use tradesim_domain::value_objects::side::Side;

fn bar(ticker: &str, ts: i64, close: f64) -> Bar {
    Bar {
        ticker: ticker.to_string(),
        timestamp: ts,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1.0,
    }
}

#[test]
fn full_session_replays_trades_and_reports() {
    let mut bars = BTreeMap::new();
    bars.insert(
        "AAPL".to_string(),
        vec![
            bar("AAPL", 1, 100.0),
            bar("AAPL", 2, 120.0),
            bar("AAPL", 3, 130.0),
        ],
    );
    bars.insert(
        "MSFT".to_string(),
        vec![bar("MSFT", 1, 300.0), bar("MSFT", 2, 310.0)],
    );
    let mut previous_closes = BTreeMap::new();
    previous_closes.insert("AAPL".to_string(), 110.0);

    let mut replay = TickReplay::new(bars, &previous_closes);
    let mut ledger = Ledger::new(0);
    let mut book = RuleBook::new();
    book.add(PriceRule {
        ticker: "AAPL".to_string(),
        target_price: 115.0,
        condition: Condition::Above,
        auto_trade: Some(AutoTrade {
            side: Side::Buy,
            quantity: 10,
        }),
    })
    .expect("add rule");

    let mut now = 0i64;
    let mut alerts = Vec::new();
    while !replay.all_exhausted() {
        now += 1;
        let round = market_step(&mut replay, &mut ledger, now);
        assert!(!round.ticks.is_empty());
        alerts.extend(price_alert_step(&mut book, &mut ledger, false, now));
    }

    // The rule fires on the second round when AAPL crosses 120.
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].starts_with("**Auto-Trade Executed**: BUY 10 of AAPL"));
    assert!(book.is_empty());

    let position = ledger.position("AAPL").expect("position");
    assert_eq!(position.shares, 10);
    assert!((position.avg_price - 120.0).abs() < 1e-9);

    // Three market rounds append three value samples after the seed.
    assert_eq!(ledger.value_history().len(), 4);

    let summary = performance_summary(&mut ledger, &previous_closes);
    assert!((summary.total_invested_capital - 1_200.0).abs() < 1e-9);
    assert!((summary.current_market_value - 1_300.0).abs() < 1e-9);
    assert!((summary.total_pnl - 100.0).abs() < 1e-9);
    assert!((summary.pnl_today - 200.0).abs() < 1e-9);
}

#[test]
fn alert_pass_with_no_rules_is_a_no_op() {
    let mut ledger = Ledger::new(0);
    let mut book = RuleBook::new();
    let notes = price_alert_step(&mut book, &mut ledger, true, 1);
    assert!(notes.is_empty());
}
