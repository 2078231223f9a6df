use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use tradesim::bootstrap::{build_desk, validate, Desk};
use tradesim::broadcast::ALERTS_CHANNEL;
use tradesim::tasks::{spawn_market_loop, spawn_news_loop, spawn_price_alert_loop};
use tradesim_application::config::{load_config, Config};
use tradesim_application::reporting::performance_summary;
use tradesim_domain::events::desk_event::DeskEvent;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tradesim")]
#[command(about = "Trading-desk simulator: market replay, paper ledger, alerts.", version)]
struct Cli {
    /// Config file path (TOML). If omitted, uses env TRADESIM_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,

    /// What to do: run the simulation loops or validate the archive.
    #[arg(long, value_enum, default_value = "run")]
    mode: Mode,

    /// Stop after this many seconds (run mode only). Runs until Ctrl-C if
    /// omitted.
    #[arg(long)]
    duration_secs: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Mode {
    Run,
    Validate,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = init_tracing() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = init_metrics() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config_path = cli
        .config
        .or_else(|| {
            std::env::var("TRADESIM_CONFIG")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        })
        .ok_or_else(|| "--config or env TRADESIM_CONFIG is required".to_string())?;
    let config = load_config(&config_path)?;

    match cli.mode {
        Mode::Validate => {
            let report = validate(&config)?;
            let rendered = serde_json::to_string_pretty(&report)
                .map_err(|err| format!("failed to render validation report: {err}"))?;
            println!("{rendered}");
            Ok(())
        }
        Mode::Run => {
            let runtime = tokio::runtime::Runtime::new()
                .map_err(|err| format!("failed to start runtime: {err}"))?;
            runtime.block_on(run_session(&config, cli.duration_secs))
        }
    }
}

async fn run_session(config: &Config, duration_secs: Option<u64>) -> Result<(), String> {
    let desk = build_desk(config, chrono::Utc::now().timestamp())?;

    let mut alert_log = desk.broadcaster.subscribe(ALERTS_CHANNEL);
    let logger = tokio::spawn(async move {
        while let Some(event) = alert_log.rx.recv().await {
            if let DeskEvent::Alert { message } = event {
                info!(%message, "alert");
            }
        }
    });

    let loops = [
        spawn_market_loop(desk.clone(), config.tick_interval_secs()),
        spawn_price_alert_loop(desk.clone(), config.alert_interval_secs()),
        spawn_news_loop(desk.clone(), config.news_interval_secs()),
    ];
    info!(
        tick_interval_secs = config.tick_interval_secs(),
        alert_interval_secs = config.alert_interval_secs(),
        news_interval_secs = config.news_interval_secs(),
        "simulation loops running"
    );

    match duration_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_secs(secs)) => {}
                result = tokio::signal::ctrl_c() => {
                    result.map_err(|err| format!("failed to listen for ctrl-c: {err}"))?;
                }
            }
        }
        None => {
            tokio::signal::ctrl_c()
                .await
                .map_err(|err| format!("failed to listen for ctrl-c: {err}"))?;
        }
    }

    for handle in loops {
        handle.abort();
    }
    logger.abort();

    report_session(&desk)?;
    Ok(())
}

fn report_session(desk: &Desk) -> Result<(), String> {
    let summary = {
        let mut ledger = desk.ledger.lock();
        performance_summary(&mut ledger, &desk.previous_closes)
    };
    let rendered = serde_json::to_string_pretty(&summary)
        .map_err(|err| format!("failed to render performance summary: {err}"))?;
    info!(total_pnl = summary.total_pnl, "session complete");
    println!("{rendered}");
    Ok(())
}

fn init_tracing() -> Result<(), String> {
    let filter = std::env::var("TRADESIM_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    Ok(())
}

#[cfg(feature = "prometheus")]
fn init_metrics() -> Result<Option<SocketAddr>, String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(raw) = std::env::var("TRADESIM_METRICS_ADDR").ok() else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let addr: SocketAddr = raw
        .parse()
        .map_err(|err| format!("invalid TRADESIM_METRICS_ADDR (expected host:port): {err}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to install prometheus exporter: {err}"))?;

    tracing::info!(metrics_addr = %addr, "prometheus metrics exporter enabled");
    Ok(Some(addr))
}

#[cfg(not(feature = "prometheus"))]
fn init_metrics() -> Result<Option<SocketAddr>, String> {
    Ok(None)
}
