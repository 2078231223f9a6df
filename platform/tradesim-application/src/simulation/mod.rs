use tradesim_domain::entities::ledger::Ledger;
use tradesim_domain::repositories::summarizer::Summarizer;
use tradesim_domain::services::alerts::{NewsDesk, RuleBook, SelectedHeadline};
use tradesim_domain::services::tick_replay::TickReplay;
use tradesim_domain::value_objects::side::Side;
use tradesim_domain::value_objects::snapshot::Snapshot;
use tradesim_domain::value_objects::tick::Tick;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct MarketRound {
    pub ticks: Vec<Tick>,
    pub snapshot: Snapshot,
}

/// One heartbeat of the market loop: replay a round of ticks, mark the
/// ledger to the new prices, and take a timestamped portfolio snapshot.
/// An empty round (archive exhausted) still produces a snapshot so
/// subscribers keep receiving the portfolio state.
pub fn market_step(replay: &mut TickReplay, ledger: &mut Ledger, now: i64) -> MarketRound {
    let ticks = replay.next_round();
    ledger.update_prices(&ticks);
    let snapshot = ledger.get_state(Some(now));

    metrics::counter!("sim_ticks_replayed_total").increment(ticks.len() as u64);
    metrics::gauge!("sim_portfolio_total_value").set(snapshot.total_value);

    MarketRound { ticks, snapshot }
}

/// One pass of the price-alert loop. Every triggered rule is consumed here:
/// its optional auto-trade is attempted against the ledger and a
/// human-readable notification is produced whether the trade filled or not.
pub fn price_alert_step(
    book: &mut RuleBook,
    ledger: &mut Ledger,
    strict: bool,
    now: i64,
) -> Vec<String> {
    let triggered = book.take_triggered(ledger.last_prices(), strict);
    let mut notifications = Vec::with_capacity(triggered.len());

    for (rule, price) in triggered {
        metrics::counter!("sim_price_alerts_total").increment(1);
        if let Some(auto) = rule.auto_trade {
            let outcome = match auto.side {
                Side::Buy => ledger.buy(&rule.ticker, auto.quantity, now),
                Side::Sell => ledger.sell(&rule.ticker, auto.quantity, now),
            };
            match outcome {
                Ok(receipt) => {
                    info!(
                        ticker = %receipt.ticker,
                        side = %receipt.side,
                        quantity = receipt.quantity,
                        price = receipt.price,
                        "auto-trade filled"
                    );
                    notifications.push(format!(
                        "**Auto-Trade Executed**: {} {} of {} at approx. ${:.2}.",
                        auto.side, auto.quantity, rule.ticker, price
                    ));
                }
                Err(err) => {
                    warn!(ticker = %rule.ticker, error = %err, "auto-trade rejected");
                    notifications.push(format!(
                        "**Auto-Trade Rejected**: {} {} of {} ({}).",
                        auto.side, auto.quantity, rule.ticker, err
                    ));
                }
            }
        } else {
            notifications.push(format!(
                "**Price Alert**: {} has crossed ${:.2}. Current price: ${:.2}.",
                rule.ticker, rule.target_price, price
            ));
        }
    }

    notifications
}

/// Picks at most one unseen headline per pass, if the cooldown allows and
/// one of the held tickers has unseen coverage. The selected headline is
/// consumed either way; when no held ticker symbol appears in it, the pass
/// emits nothing and the next pass moves on to the next headline. The
/// alert is attributed to the matched ticker, which may differ from the
/// headline's source.
pub fn select_news_headline(
    desk: &mut NewsDesk,
    held_tickers: &[String],
    now: i64,
) -> Option<SelectedHeadline> {
    if !desk.cooldown_elapsed(now) {
        return None;
    }
    let headline = desk.select_headline(held_tickers)?;
    let matched = NewsDesk::match_held_ticker(&headline.title, held_tickers)?;
    Some(SelectedHeadline {
        ticker: matched,
        title: headline.title,
    })
}

/// Renders the selected headline into alert copy via the summarizer. A
/// summarizer failure degrades to the raw headline rather than dropping
/// the alert.
pub fn render_news_alert(summarizer: &dyn Summarizer, headline: &SelectedHeadline) -> String {
    let prompt = format!(
        "The user holds {} stock. In one actionable sentence, explain the likely impact of this headline: \"{}\"",
        headline.ticker, headline.title
    );
    let body = match summarizer.summarize(&prompt) {
        Ok(summary) => summary,
        Err(err) => {
            warn!(ticker = %headline.ticker, error = %err, "summarizer unavailable");
            format!("News for {}: {}", headline.ticker, headline.title)
        }
    };
    format!("**Intelligent News Alert**: {body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tradesim_domain::repositories::summarizer::SummarizeError;
    use tradesim_domain::services::alerts::{AutoTrade, Condition, PriceRule};
    use tradesim_domain::value_objects::bar::Bar;
    use tradesim_domain::value_objects::news::NewsItem;

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

    fn tick(ticker: &str, price: f64) -> Tick {
        Tick {
            ticker: ticker.to_string(),
            timestamp: 0,
            price,
            high: price,
            low: price,
            change: 0.0,
            change_percent: 0.0,
            bid: price,
            ask: price,
        }
    }

    #[test]
    fn market_step_marks_the_ledger_and_snapshots() {
        let mut bars = BTreeMap::new();
        bars.insert("AAPL".to_string(), vec![bar("AAPL", 1, 200.0)]);
        let mut replay = TickReplay::new(bars, &BTreeMap::new());
        let mut ledger = Ledger::new(0);

        let round = market_step(&mut replay, &mut ledger, 10);
        assert_eq!(round.ticks.len(), 1);
        assert_eq!(ledger.last_price("AAPL"), Some(200.0));
        assert!((round.snapshot.total_value - 1_000_000.0).abs() < 1e-9);
        assert_eq!(ledger.value_history().len(), 2);
    }

    #[test]
    fn market_step_on_an_exhausted_archive_still_snapshots() {
        let mut replay = TickReplay::new(BTreeMap::new(), &BTreeMap::new());
        let mut ledger = Ledger::new(0);

        let round = market_step(&mut replay, &mut ledger, 10);
        assert!(round.ticks.is_empty());
        assert_eq!(ledger.value_history().len(), 2);
    }

    #[test]
    fn plain_rule_produces_a_price_alert_message() {
        let mut book = RuleBook::new();
        book.add(PriceRule {
            ticker: "AAPL".to_string(),
            target_price: 150.0,
            condition: Condition::Above,
            auto_trade: None,
        })
        .expect("add");

        let mut ledger = Ledger::new(0);
        ledger.update_prices(&[tick("AAPL", 151.5)]);

        let notes = price_alert_step(&mut book, &mut ledger, false, 1);
        assert_eq!(
            notes,
            vec!["**Price Alert**: AAPL has crossed $150.00. Current price: $151.50.".to_string()]
        );
        assert!(book.is_empty());
    }

    #[test]
    fn auto_trade_executes_against_the_ledger() {
        let mut book = RuleBook::new();
        book.add(PriceRule {
            ticker: "AAPL".to_string(),
            target_price: 150.0,
            condition: Condition::Above,
            auto_trade: Some(AutoTrade {
                side: Side::Buy,
                quantity: 10,
            }),
        })
        .expect("add");

        let mut ledger = Ledger::new(0);
        ledger.update_prices(&[tick("AAPL", 160.0)]);

        let notes = price_alert_step(&mut book, &mut ledger, false, 1);
        assert_eq!(
            notes,
            vec!["**Auto-Trade Executed**: BUY 10 of AAPL at approx. $160.00.".to_string()]
        );
        assert_eq!(ledger.position("AAPL").expect("position").shares, 10);
    }

    #[test]
    fn rejected_auto_trade_still_consumes_the_rule() {
        let mut book = RuleBook::new();
        book.add(PriceRule {
            ticker: "AAPL".to_string(),
            target_price: 150.0,
            condition: Condition::Above,
            auto_trade: Some(AutoTrade {
                side: Side::Sell,
                quantity: 5,
            }),
        })
        .expect("add");

        let mut ledger = Ledger::new(0);
        ledger.update_prices(&[tick("AAPL", 160.0)]);

        let notes = price_alert_step(&mut book, &mut ledger, false, 1);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].starts_with("**Auto-Trade Rejected**: SELL 5 of AAPL"));
        assert!(book.is_empty());
        assert!(ledger.position("AAPL").is_none());
    }

    struct FixedSummarizer(Result<String, SummarizeError>);

    impl Summarizer for FixedSummarizer {
        fn summarize(&self, _prompt: &str) -> Result<String, SummarizeError> {
            self.0.clone()
        }
    }

    fn headline() -> SelectedHeadline {
        SelectedHeadline {
            ticker: "AAPL".to_string(),
            title: "Apple ships record volumes".to_string(),
        }
    }

    #[test]
    fn news_alert_wraps_the_summary() {
        let summarizer = FixedSummarizer(Ok("Bullish for Apple.".to_string()));
        let message = render_news_alert(&summarizer, &headline());
        assert_eq!(message, "**Intelligent News Alert**: Bullish for Apple.");
    }

    #[test]
    fn news_alert_degrades_to_the_headline_on_failure() {
        let summarizer = FixedSummarizer(Err(SummarizeError::Timeout("5s".to_string())));
        let message = render_news_alert(&summarizer, &headline());
        assert_eq!(
            message,
            "**Intelligent News Alert**: News for AAPL: Apple ships record volumes"
        );
    }

    #[test]
    fn cooldown_suppresses_headline_selection() {
        let mut news = BTreeMap::new();
        news.insert(
            "AAPL".to_string(),
            vec![NewsItem {
                title: "AAPL beats expectations".to_string(),
                time_published: "20260823T090000".to_string(),
            }],
        );
        let mut desk = NewsDesk::new(news, 300);
        let held = vec!["AAPL".to_string()];

        desk.mark_emitted(100);
        assert!(select_news_headline(&mut desk, &held, 200).is_none());
        assert!(select_news_headline(&mut desk, &held, 500).is_some());
    }

    #[test]
    fn a_near_miss_pass_consumes_one_headline_and_emits_nothing() {
        let mut news = BTreeMap::new();
        news.insert(
            "AAPL".to_string(),
            vec![
                NewsItem {
                    title: "Markets open mixed".to_string(),
                    time_published: "20260823T090000".to_string(),
                },
                NewsItem {
                    title: "AAPL announces buyback".to_string(),
                    time_published: "20260823T100000".to_string(),
                },
            ],
        );
        let mut desk = NewsDesk::new(news, 300);
        let held = vec!["AAPL".to_string()];

        // First pass draws the irrelevant headline and stays silent.
        assert!(select_news_headline(&mut desk, &held, 0).is_none());
        let headline = select_news_headline(&mut desk, &held, 0).expect("relevant headline");
        assert_eq!(headline.title, "AAPL announces buyback");
        assert!(select_news_headline(&mut desk, &held, 0).is_none());
    }

    #[test]
    fn alerts_are_attributed_to_the_matched_held_ticker() {
        let mut news = BTreeMap::new();
        news.insert(
            "MSFT".to_string(),
            vec![NewsItem {
                title: "AAPL supplier signs deal".to_string(),
                time_published: "20260823T110000".to_string(),
            }],
        );
        let mut desk = NewsDesk::new(news, 300);
        let held = vec!["AAPL".to_string(), "MSFT".to_string()];

        let headline = select_news_headline(&mut desk, &held, 0).expect("matched headline");
        assert_eq!(headline.ticker, "AAPL");
    }
}
