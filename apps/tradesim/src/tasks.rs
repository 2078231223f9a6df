use crate::bootstrap::Desk;
use crate::broadcast::{ALERTS_CHANNEL, MARKET_DATA_CHANNEL};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tradesim_application::simulation::{
    market_step, price_alert_step, render_news_alert, select_news_headline,
};
use tradesim_domain::events::desk_event::DeskEvent;
use tracing::{debug, warn};

/// Market heartbeat: one replay round per interval, published as a
/// `market_data` event. Keeps publishing portfolio snapshots after the
/// archive runs dry so late subscribers still see state.
pub fn spawn_market_loop(desk: Arc<Desk>, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            let now = chrono::Utc::now().timestamp();
            let round = {
                let mut replay = desk.replay.lock();
                let mut ledger = desk.ledger.lock();
                market_step(&mut replay, &mut ledger, now)
            };
            if round.ticks.is_empty() {
                debug!("archive exhausted, publishing snapshot only");
            }
            desk.broadcaster.publish(
                MARKET_DATA_CHANNEL,
                &DeskEvent::MarketData {
                    ticks: round.ticks,
                    portfolio: round.snapshot,
                },
            );
        }
    })
}

/// Price-alert pass: evaluates standing rules against the latest prices and
/// publishes one alert event per notification.
pub fn spawn_price_alert_loop(desk: Arc<Desk>, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            let now = chrono::Utc::now().timestamp();
            let notifications = {
                let mut book = desk.rule_book.lock();
                let mut ledger = desk.ledger.lock();
                price_alert_step(&mut book, &mut ledger, desk.strict_compare, now)
            };
            for message in notifications {
                desk.broadcaster
                    .publish(ALERTS_CHANNEL, &DeskEvent::Alert { message });
            }
        }
    })
}

/// News pass: selects at most one relevant unseen headline per interval,
/// renders it off the runtime (the summarizer client blocks), and only then
/// arms the cooldown.
pub fn spawn_news_loop(desk: Arc<Desk>, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            let now = chrono::Utc::now().timestamp();
            let selection = {
                let held = desk.ledger.lock().held_tickers();
                let mut news = desk.news_desk.lock();
                select_news_headline(&mut news, &held, now)
            };
            let Some(headline) = selection else {
                continue;
            };

            let summarizer = desk.summarizer.clone();
            let rendered =
                tokio::task::spawn_blocking(move || render_news_alert(summarizer.as_ref(), &headline))
                    .await;
            match rendered {
                Ok(message) => {
                    desk.news_desk
                        .lock()
                        .mark_emitted(chrono::Utc::now().timestamp());
                    desk.broadcaster
                        .publish(ALERTS_CHANNEL, &DeskEvent::Alert { message });
                }
                Err(err) => warn!(error = %err, "news render task failed"),
            }
        }
    })
}
