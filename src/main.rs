//! Dealer process bootstrap: loads configuration, resolves the wallet and
//! strategy implementations by selector, wires up the control loop, and
//! drives it on a fixed interval alongside the health/metrics surface.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use dealer_backend::config::DealerConfig;
use dealer_backend::ledger::SqliteTransferLedger;
use dealer_backend::paper::{PaperStrategy, PaperWallet};
use dealer_backend::strategy::HedgingStrategy;
use dealer_backend::wallet::WalletClient;
use dealer_backend::{telemetry, ControlLoop, DealerError};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(about = "Reconciliation and hedging control loop")]
struct Cli {
    /// Overrides DEALER_TICK_INTERVAL_SECS.
    #[arg(long)]
    tick_interval_secs: Option<u64>,

    /// Overrides DEALER_LEDGER_DB_PATH.
    #[arg(long)]
    ledger_db_path: Option<String>,
}

fn resolve_wallet(selector: &str) -> Result<Arc<dyn WalletClient>, DealerError> {
    match selector {
        "paper" => Ok(Arc::new(PaperWallet::new(0.0))),
        other => Err(DealerError::Configuration(format!(
            "unrecognized wallet selector: {other}"
        ))),
    }
}

fn resolve_strategy(selector: &str) -> Result<Arc<dyn HedgingStrategy>, DealerError> {
    match selector {
        "paper" => Ok(Arc::new(PaperStrategy::new(50_000.0))),
        other => Err(DealerError::Configuration(format!(
            "unrecognized strategy selector: {other}"
        ))),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dealer_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = DealerConfig::from_env().context("failed to load dealer configuration")?;
    if let Some(v) = cli.tick_interval_secs {
        config.tick_interval_secs = v;
    }
    if let Some(v) = cli.ledger_db_path {
        config.ledger_db_path = v;
    }

    info!(
        wallet = %config.wallet_selector,
        strategy = %config.strategy_selector,
        tick_interval_secs = config.tick_interval_secs,
        "dealer starting"
    );

    let wallet = resolve_wallet(&config.wallet_selector)?;
    let strategy = resolve_strategy(&config.strategy_selector)?;
    let ledger = Arc::new(
        SqliteTransferLedger::open(&config.ledger_db_path).context("failed to open transfer ledger")?,
    );

    let control_loop = Arc::new(ControlLoop::new(
        wallet,
        strategy,
        ledger,
        config.minimum_positive_liability_usd,
    ));

    let prometheus = telemetry::install_recorder().context("failed to install metrics recorder")?;
    let metrics_addr = config.metrics_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = dealer_backend::server::serve(&metrics_addr, prometheus).await {
            error!(error = %e, "query surface exited");
        }
    });

    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(config.tick_interval_secs));
    loop {
        ticker.tick().await;
        let start = Instant::now();
        match control_loop.tick().await {
            Ok(outcome) => {
                telemetry::record_tick_success(start.elapsed());
                if outcome.position_skipped {
                    telemetry::record_position_skipped();
                }
                if outcome.leverage_skipped {
                    telemetry::record_leverage_skipped();
                }
            }
            Err(e) => {
                telemetry::record_tick_failure(start.elapsed(), e.to_string().as_str());
                error!(error = %e, "tick failed");
            }
        }
    }
}
