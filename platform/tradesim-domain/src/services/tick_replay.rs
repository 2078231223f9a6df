use crate::value_objects::bar::Bar;
use crate::value_objects::tick::Tick;
use rand::Rng;
use std::collections::BTreeMap;

/// Synthetic half-spread bounds, as a fraction of the tick price.
const MIN_HALF_SPREAD_PCT: f64 = 0.001;
const MAX_HALF_SPREAD_PCT: f64 = 0.005;

#[derive(Debug)]
struct ReplayCursor {
    bars: Vec<Bar>,
    index: usize,
    /// Reference price for change and change_percent. Preloaded with the
    /// previous session close when available, otherwise latched to the
    /// first replayed price.
    anchor: Option<f64>,
}

/// Replays archived bars one tick per ticker per round, in file order.
/// Each ticker advances independently; an exhausted ticker simply stops
/// producing while the others continue.
#[derive(Debug)]
pub struct TickReplay {
    cursors: BTreeMap<String, ReplayCursor>,
}

impl TickReplay {
    pub fn new(
        bars_by_ticker: BTreeMap<String, Vec<Bar>>,
        previous_closes: &BTreeMap<String, f64>,
    ) -> Self {
        let cursors = bars_by_ticker
            .into_iter()
            .map(|(ticker, bars)| {
                let anchor = previous_closes.get(&ticker).copied();
                (
                    ticker,
                    ReplayCursor {
                        bars,
                        index: 0,
                        anchor,
                    },
                )
            })
            .collect();
        Self { cursors }
    }

    pub fn tickers(&self) -> Vec<String> {
        self.cursors.keys().cloned().collect()
    }

    pub fn is_exhausted(&self, ticker: &str) -> bool {
        self.cursors
            .get(ticker)
            .map(|c| c.index >= c.bars.len())
            .unwrap_or(true)
    }

    pub fn all_exhausted(&self) -> bool {
        self.cursors
            .values()
            .all(|c| c.index >= c.bars.len())
    }

    /// Advances one ticker by one bar. Returns `None` once its bars run out.
    pub fn next_tick(&mut self, ticker: &str) -> Option<Tick> {
        let cursor = self.cursors.get_mut(ticker)?;
        let bar = cursor.bars.get(cursor.index)?.clone();
        cursor.index += 1;

        let price = bar.close;
        let anchor = *cursor.anchor.get_or_insert(price);
        let change = price - anchor;
        let change_percent = if anchor != 0.0 {
            change / anchor * 100.0
        } else {
            0.0
        };

        let half_spread =
            price * rand::thread_rng().gen_range(MIN_HALF_SPREAD_PCT..=MAX_HALF_SPREAD_PCT);

        Some(Tick {
            ticker: ticker.to_string(),
            timestamp: bar.timestamp,
            price,
            high: bar.high,
            low: bar.low,
            change,
            change_percent,
            bid: price - half_spread,
            ask: price + half_spread,
        })
    }

    /// One round of the simulation: at most one tick per ticker, exhausted
    /// tickers silently skipped.
    pub fn next_round(&mut self) -> Vec<Tick> {
        let tickers = self.tickers();
        tickers
            .iter()
            .filter_map(|ticker| self.next_tick(ticker))
            .collect()
    }
}
