use crate::value_objects::news::NewsItem;
use crate::value_objects::side::Side;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Above,
    Below,
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Above => write!(f, "above"),
            Condition::Below => write!(f, "below"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoTrade {
    pub side: Side,
    pub quantity: u64,
}

/// One-shot price threshold rule. Identity is `(ticker, condition,
/// target_price)`; the attached auto-trade does not participate in
/// deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRule {
    pub ticker: String,
    pub target_price: f64,
    pub condition: Condition,
    pub auto_trade: Option<AutoTrade>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertError {
    DuplicateRule {
        ticker: String,
        condition: Condition,
        target_price: f64,
    },
}

impl std::fmt::Display for AlertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertError::DuplicateRule {
                ticker,
                condition,
                target_price,
            } => write!(
                f,
                "rule already registered: {ticker} {condition} {target_price:.2}"
            ),
        }
    }
}

fn condition_met(condition: Condition, price: f64, target: f64, strict: bool) -> bool {
    match (condition, strict) {
        (Condition::Above, true) => price > target,
        (Condition::Above, false) => price >= target,
        (Condition::Below, true) => price < target,
        (Condition::Below, false) => price <= target,
    }
}

/// Active price rules. Triggered rules are removed in the same pass that
/// reports them, so each rule fires at most once.
#[derive(Debug, Default)]
pub struct RuleBook {
    rules: Vec<PriceRule>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: PriceRule) -> Result<(), AlertError> {
        let duplicate = self.rules.iter().any(|r| {
            r.ticker == rule.ticker
                && r.condition == rule.condition
                && r.target_price == rule.target_price
        });
        if duplicate {
            return Err(AlertError::DuplicateRule {
                ticker: rule.ticker,
                condition: rule.condition,
                target_price: rule.target_price,
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Evaluates every rule against the latest prices and removes the ones
    /// that fired, returning each with the price that tripped it. Rules for
    /// tickers with no known price stay active.
    pub fn take_triggered(
        &mut self,
        prices: &BTreeMap<String, f64>,
        strict: bool,
    ) -> Vec<(PriceRule, f64)> {
        let mut triggered = Vec::new();
        self.rules.retain(|rule| {
            let Some(price) = prices.get(&rule.ticker).copied() else {
                return true;
            };
            if condition_met(rule.condition, price, rule.target_price, strict) {
                triggered.push((rule.clone(), price));
                false
            } else {
                true
            }
        });
        triggered
    }

    pub fn rules(&self) -> &[PriceRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedHeadline {
    pub ticker: String,
    pub title: String,
}

/// Headline selection for the news alert loop: at most one unseen headline
/// per pass across the held tickers, throttled by a cooldown that only
/// resets when an alert is actually emitted.
#[derive(Debug)]
pub struct NewsDesk {
    news_by_ticker: BTreeMap<String, Vec<NewsItem>>,
    processed_titles: HashSet<String>,
    last_alert_at: Option<i64>,
    cooldown_secs: i64,
}

impl NewsDesk {
    pub fn new(news_by_ticker: BTreeMap<String, Vec<NewsItem>>, cooldown_secs: i64) -> Self {
        Self {
            news_by_ticker,
            processed_titles: HashSet::new(),
            last_alert_at: None,
            cooldown_secs,
        }
    }

    pub fn cooldown_elapsed(&self, now: i64) -> bool {
        match self.last_alert_at {
            None => true,
            Some(last) => now - last >= self.cooldown_secs,
        }
    }

    /// Picks the first headline not seen before, walking the held tickers in
    /// the given order. The headline is marked processed immediately, whether
    /// or not an alert is ultimately produced from it.
    pub fn select_headline(&mut self, held_tickers: &[String]) -> Option<SelectedHeadline> {
        for ticker in held_tickers {
            let Some(items) = self.news_by_ticker.get(ticker) else {
                continue;
            };
            for item in items {
                if self.processed_titles.contains(&item.title) {
                    continue;
                }
                let title = item.title.clone();
                self.processed_titles.insert(title.clone());
                return Some(SelectedHeadline {
                    ticker: ticker.clone(),
                    title,
                });
            }
        }
        None
    }

    /// First held ticker whose symbol appears in the title,
    /// case-insensitively. The match decides which holding an alert is
    /// attributed to, not which file the headline came from.
    pub fn match_held_ticker(title: &str, held_tickers: &[String]) -> Option<String> {
        let lowered = title.to_lowercase();
        held_tickers
            .iter()
            .find(|ticker| lowered.contains(&ticker.to_lowercase()))
            .cloned()
    }

    pub fn mark_emitted(&mut self, now: i64) {
        self.last_alert_at = Some(now);
    }
}
