use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tradesim_domain::services::alerts::{AutoTrade, Condition, PriceRule};
use tradesim_domain::value_objects::side::Side;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub run: RunConfig,
    pub engine: Option<EngineConfig>,
    pub summarizer: SummarizerConfig,
    pub rules: Option<Vec<RuleConfig>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub tickers: Vec<String>,
    pub data_dir: String,
    pub tick_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub alert_interval_secs: Option<u64>,
    pub news_interval_secs: Option<u64>,
    pub news_cooldown_secs: Option<i64>,
    pub strict_compare: Option<bool>,
    pub clear_rules_on_reset: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SummarizerConfig {
    pub url: String,
    pub model: String,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub ticker: String,
    pub target_price: f64,
    pub condition: Condition,
    pub side: Option<Side>,
    pub quantity: Option<u64>,
}

impl Config {
    pub fn tick_interval_secs(&self) -> u64 {
        self.run.tick_interval_secs.unwrap_or(1)
    }

    pub fn alert_interval_secs(&self) -> u64 {
        self.engine
            .as_ref()
            .and_then(|e| e.alert_interval_secs)
            .unwrap_or(5)
    }

    pub fn news_interval_secs(&self) -> u64 {
        self.engine
            .as_ref()
            .and_then(|e| e.news_interval_secs)
            .unwrap_or(15)
    }

    pub fn news_cooldown_secs(&self) -> i64 {
        self.engine
            .as_ref()
            .and_then(|e| e.news_cooldown_secs)
            .unwrap_or(300)
    }

    pub fn strict_compare(&self) -> bool {
        self.engine
            .as_ref()
            .and_then(|e| e.strict_compare)
            .unwrap_or(false)
    }

    pub fn clear_rules_on_reset(&self) -> bool {
        self.engine
            .as_ref()
            .and_then(|e| e.clear_rules_on_reset)
            .unwrap_or(false)
    }
}

impl RuleConfig {
    /// An auto-trade attaches only when both a side and a quantity are
    /// configured; a half-specified pair is rejected rather than guessed at.
    pub fn to_rule(&self) -> Result<PriceRule, String> {
        let auto_trade = match (self.side, self.quantity) {
            (Some(side), Some(quantity)) => Some(AutoTrade { side, quantity }),
            (None, None) => None,
            _ => {
                return Err(format!(
                    "rule for {} must set both side and quantity or neither",
                    self.ticker
                ))
            }
        };
        Ok(PriceRule {
            ticker: self.ticker.clone(),
            target_price: self.target_price,
            condition: self.condition,
            auto_trade,
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let (config, _source) = load_config_with_source(path)?;
    Ok(config)
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    Ok((config, contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn unique_tmp_path(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir().join(format!("tradesim-config-{tag}-{nanos}.toml"))
    }

    const SAMPLE: &str = r#"
[run]
tickers = ["AAPL", "MSFT"]
data_dir = "data"

[engine]
strict_compare = true

[summarizer]
url = "http://localhost:11434/api/generate"
model = "llama3"

[[rules]]
ticker = "AAPL"
target_price = 150.0
condition = "above"
side = "SELL"
quantity = 5
"#;

    #[test]
    fn parses_a_full_config_with_defaults() {
        let path = unique_tmp_path("full");
        std::fs::write(&path, SAMPLE).expect("write");
        let (config, source) = load_config_with_source(&path).expect("load");
        std::fs::remove_file(&path).ok();

        assert_eq!(config.run.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(config.tick_interval_secs(), 1);
        assert_eq!(config.alert_interval_secs(), 5);
        assert_eq!(config.news_interval_secs(), 15);
        assert_eq!(config.news_cooldown_secs(), 300);
        assert!(config.strict_compare());
        assert!(!config.clear_rules_on_reset());
        assert!(source.contains("[summarizer]"));

        let rules = config.rules.expect("rules");
        let rule = rules[0].to_rule().expect("rule");
        let auto = rule.auto_trade.expect("auto trade");
        assert_eq!(auto.side, Side::Sell);
        assert_eq!(auto.quantity, 5);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let path = unique_tmp_path("unknown");
        std::fs::write(&path, "[run]\ntickers = []\ndata_dir = \"d\"\nbogus = 1\n[summarizer]\nurl = \"u\"\nmodel = \"m\"\n")
            .expect("write");
        let err = load_config(&path).expect_err("parse failure");
        std::fs::remove_file(&path).ok();
        assert!(err.contains("failed to parse TOML"));
    }

    #[test]
    fn half_specified_auto_trade_is_rejected() {
        let rule = RuleConfig {
            ticker: "AAPL".to_string(),
            target_price: 100.0,
            condition: Condition::Below,
            side: Some(Side::Buy),
            quantity: None,
        };
        assert!(rule.to_rule().is_err());
    }
}
