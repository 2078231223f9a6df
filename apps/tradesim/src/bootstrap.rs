use crate::broadcast::Broadcaster;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tradesim_application::config::Config;
use tradesim_domain::entities::ledger::Ledger;
use tradesim_domain::repositories::market_archive::{ArchiveBundle, MarketArchive};
use tradesim_domain::repositories::summarizer::Summarizer;
use tradesim_domain::services::alerts::{NewsDesk, RuleBook};
use tradesim_domain::services::tick_replay::TickReplay;
use tradesim_infrastructure::market_archive::FilesystemMarketArchive;
use tradesim_infrastructure::summarizer::HttpSummarizer;
use tracing::{info, warn};

const DEFAULT_SUMMARIZER_TIMEOUT_MS: u64 = 5_000;

/// Everything the running simulation shares between its loops. Each piece of
/// mutable state sits behind its own lock; locks are taken briefly and never
/// held across an await.
pub struct Desk {
    pub ledger: Mutex<Ledger>,
    pub replay: Mutex<TickReplay>,
    pub rule_book: Mutex<RuleBook>,
    pub news_desk: Mutex<NewsDesk>,
    pub summarizer: Arc<dyn Summarizer + Send + Sync>,
    pub broadcaster: Broadcaster,
    pub previous_closes: BTreeMap<String, f64>,
    pub strict_compare: bool,
    pub clear_rules_on_reset: bool,
}

impl Desk {
    pub fn from_bundle(
        bundle: ArchiveBundle,
        summarizer: Arc<dyn Summarizer + Send + Sync>,
        config: &Config,
        now: i64,
    ) -> Self {
        let replay = TickReplay::new(bundle.bars_by_ticker, &bundle.previous_closes);
        Self {
            ledger: Mutex::new(Ledger::new(now)),
            replay: Mutex::new(replay),
            rule_book: Mutex::new(RuleBook::new()),
            news_desk: Mutex::new(NewsDesk::new(
                bundle.news_by_ticker,
                config.news_cooldown_secs(),
            )),
            summarizer,
            broadcaster: Broadcaster::new(),
            previous_closes: bundle.previous_closes,
            strict_compare: config.strict_compare(),
            clear_rules_on_reset: config.clear_rules_on_reset(),
        }
    }

    /// Fresh session on the same archive: ledger back to its initial state,
    /// standing rules kept or cleared per configuration.
    pub fn reset(&self, now: i64) {
        self.ledger.lock().reset(now);
        if self.clear_rules_on_reset {
            self.rule_book.lock().clear();
        }
        info!(clear_rules = self.clear_rules_on_reset, "session reset");
    }
}

pub fn build_desk(config: &Config, now: i64) -> Result<Arc<Desk>, String> {
    let archive = FilesystemMarketArchive::new(&config.run.data_dir);
    let bundle = archive.load(&config.run.tickers)?;
    if bundle.bars_by_ticker.is_empty() {
        return Err(format!(
            "no replayable bars found under {} for {:?}",
            config.run.data_dir, config.run.tickers
        ));
    }

    let summarizer: Arc<dyn Summarizer + Send + Sync> = Arc::new(HttpSummarizer::new(
        config.summarizer.url.clone(),
        config.summarizer.model.clone(),
        config
            .summarizer
            .timeout_ms
            .unwrap_or(DEFAULT_SUMMARIZER_TIMEOUT_MS),
    )?);

    let desk = Desk::from_bundle(bundle, summarizer, config, now);
    install_rules(&desk, config);

    info!(
        tickers = desk.replay.lock().tickers().len(),
        rules = desk.rule_book.lock().len(),
        "desk ready"
    );
    Ok(Arc::new(desk))
}

fn install_rules(desk: &Desk, config: &Config) {
    let Some(rules) = &config.rules else {
        return;
    };
    let mut book = desk.rule_book.lock();
    for entry in rules {
        match entry.to_rule() {
            Ok(rule) => {
                if let Err(err) = book.add(rule) {
                    warn!(error = %err, "skipping configured rule");
                }
            }
            Err(err) => warn!(error = %err, "skipping malformed rule"),
        }
    }
}

/// Loads the archive and reports what a run would see, without starting any
/// loops.
pub fn validate(config: &Config) -> Result<serde_json::Value, String> {
    let archive = FilesystemMarketArchive::new(&config.run.data_dir);
    let bundle = archive.load(&config.run.tickers)?;

    let tickers: Vec<serde_json::Value> = config
        .run
        .tickers
        .iter()
        .map(|ticker| {
            serde_json::json!({
                "ticker": ticker,
                "bars": bundle.bars_by_ticker.get(ticker).map(Vec::len).unwrap_or(0),
                "news": bundle.news_by_ticker.get(ticker).map(Vec::len).unwrap_or(0),
                "previous_close": bundle.previous_closes.get(ticker),
            })
        })
        .collect();

    Ok(serde_json::json!({
        "data_dir": config.run.data_dir,
        "tickers": tickers,
        "rules": config.rules.as_ref().map(Vec::len).unwrap_or(0),
    }))
}
