use crate::value_objects::bar::Bar;
use crate::value_objects::news::NewsItem;
use std::collections::BTreeMap;

/// Everything a simulation session needs from the archive, loaded up front.
#[derive(Debug, Default)]
pub struct ArchiveBundle {
    pub bars_by_ticker: BTreeMap<String, Vec<Bar>>,
    pub previous_closes: BTreeMap<String, f64>,
    pub news_by_ticker: BTreeMap<String, Vec<NewsItem>>,
}

/// Port for the archived market data backing a replay session.
pub trait MarketArchive {
    fn load(&self, tickers: &[String]) -> Result<ArchiveBundle, String>;
}
