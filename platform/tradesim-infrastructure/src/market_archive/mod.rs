use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tradesim_domain::repositories::market_archive::{ArchiveBundle, MarketArchive};
use tradesim_domain::value_objects::bar::Bar;
use tradesim_domain::value_objects::news::NewsItem;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Archive rooted at a data directory holding three files per ticker:
/// `{T}_historical.csv` (prior sessions, source of the previous close),
/// `{T}_live.csv` (the bars replayed as ticks) and `{T}_news.json`
/// (headline list). A ticker with no live file is skipped with a warning;
/// historical and news files are optional per ticker.
pub struct FilesystemMarketArchive {
    root: PathBuf,
}

impl FilesystemMarketArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn load_bars(&self, path: &Path, ticker: &str) -> Result<Vec<Bar>, String> {
        let file = File::open(path)
            .map_err(|err| format!("failed to open bar CSV {}: {}", path.display(), err))?;
        let mut reader = csv::Reader::from_reader(file);

        let mut bars = Vec::new();
        for result in reader.deserialize::<BarRecord>() {
            let record = result.map_err(|err| format!("failed to parse CSV row: {}", err))?;
            if !record.close.is_finite() || record.close <= 0.0 {
                warn!(ticker, timestamp = %record.timestamp, "skipping bar with invalid close");
                continue;
            }
            bars.push(Bar {
                ticker: ticker.to_string(),
                timestamp: parse_timestamp(&record.timestamp)?,
                open: record.open,
                high: record.high,
                low: record.low,
                close: record.close,
                volume: record.volume,
            });
        }
        Ok(bars)
    }

    fn load_news(&self, path: &Path) -> Result<Vec<NewsItem>, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read news JSON {}: {}", path.display(), err))?;
        serde_json::from_str(&contents)
            .map_err(|err| format!("failed to parse news JSON {}: {}", path.display(), err))
    }
}

impl MarketArchive for FilesystemMarketArchive {
    fn load(&self, tickers: &[String]) -> Result<ArchiveBundle, String> {
        let mut bundle = ArchiveBundle::default();

        for ticker in tickers {
            let live_path = self.root.join(format!("{ticker}_live.csv"));
            if !live_path.exists() {
                warn!(ticker, path = %live_path.display(), "no live bars, skipping ticker");
                continue;
            }
            let bars = self.load_bars(&live_path, ticker)?;
            metrics::counter!("archive_bars_loaded_total").increment(bars.len() as u64);
            bundle.bars_by_ticker.insert(ticker.clone(), bars);

            let historical_path = self.root.join(format!("{ticker}_historical.csv"));
            if historical_path.exists() {
                let historical = self.load_bars(&historical_path, ticker)?;
                // Previous close is the second-to-last session; the last row
                // is the session being replayed.
                if historical.len() >= 2 {
                    bundle
                        .previous_closes
                        .insert(ticker.clone(), historical[historical.len() - 2].close);
                }
            }

            let news_path = self.root.join(format!("{ticker}_news.json"));
            if news_path.exists() {
                let news = self.load_news(&news_path)?;
                bundle.news_by_ticker.insert(ticker.clone(), news);
            }
        }

        Ok(bundle)
    }
}

fn parse_timestamp(value: &str) -> Result<i64, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%z") {
        return Ok(dt.timestamp());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        let dt: DateTime<Utc> = Utc.from_utc_datetime(&naive);
        return Ok(dt.timestamp());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            let dt: DateTime<Utc> = Utc.from_utc_datetime(&naive);
            return Ok(dt.timestamp());
        }
    }

    Err(format!("unsupported timestamp format: {}", value))
}
