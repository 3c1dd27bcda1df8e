//! kalshi-alpha: scan Kalshi for markets worth researching.
//!
//! Entry point. Loads configuration, initialises structured logging, wires
//! the venue client, reasoning service and scorer into one orchestrator,
//! and runs a single scan (or the setup checks).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};

use kalshi_alpha::config::AppConfig;
use kalshi_alpha::diagnostics;
use kalshi_alpha::engine::{FixedDelay, Researcher, ScanOrchestrator, ScanSettings};
use kalshi_alpha::llm::anthropic::AnthropicClient;
use kalshi_alpha::platforms::auth::KalshiCredentials;
use kalshi_alpha::platforms::kalshi::KalshiClient;
use kalshi_alpha::strategy::AlphaScorer;
use kalshi_alpha::types::ScanStatus;

const BANNER: &str = r#"
 _  __     _     _     _    _    _       _
| |/ /__ _| |___| |__ (_)  / \  | |_ __ | |__   __ _
| ' // _` | / __| '_ \| | / _ \ | | '_ \| '_ \ / _` |
| . \ (_| | \__ \ | | | |/ ___ \| | |_) | | | | (_| |
|_|\_\__,_|_|___/_| |_|_/_/   \_\_| .__/|_| |_|\__,_|
                                  |_|
  Scan, score and research Kalshi markets
"#;

/// Kalshi alpha scanner
#[derive(Parser)]
#[command(name = "kalshi-alpha", version, about = "Scan, score and research Kalshi markets")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one scan and print the report (default).
    Scan(ScanArgs),
    /// Verify credentials and connectivity, then exit.
    Check,
}

#[derive(clap::Args, Default)]
struct ScanArgs {
    /// Override the number of markets to research.
    #[arg(long)]
    top_n: Option<usize>,

    /// Override the minimum alpha score.
    #[arg(long)]
    min_score: Option<u32>,

    /// Override the pause between research calls, in seconds.
    #[arg(long)]
    delay_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    let mut cfg = AppConfig::load_or_default(&cli.config)?;

    match cli.command.unwrap_or(Command::Scan(ScanArgs::default())) {
        Command::Check => {
            let results = diagnostics::run_checks(&cfg).await;
            println!("{}", diagnostics::render(&results));
            if !diagnostics::all_passed(&results) {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Scan(args) => {
            if let Some(n) = args.top_n {
                cfg.scan.top_n = n.max(1);
            }
            if let Some(s) = args.min_score {
                cfg.scan.min_alpha_score = s;
            }
            if let Some(d) = args.delay_secs {
                cfg.scan.research_delay_secs = d;
            }
            run_scan(&cfg).await
        }
    }
}

async fn run_scan(cfg: &AppConfig) -> Result<()> {
    println!("{BANNER}");
    info!(
        model = %cfg.llm.model,
        policy = ?cfg.scoring.policy,
        min_alpha_score = cfg.scan.min_alpha_score,
        top_n = cfg.scan.top_n,
        delay_secs = cfg.scan.research_delay_secs,
        "kalshi-alpha starting up"
    );

    // -- Initialise components -------------------------------------------

    let credentials = KalshiCredentials::from_env(&cfg.kalshi)?;
    info!(auth = credentials.kind(), "Kalshi credentials resolved");
    let venue = KalshiClient::new(&cfg.kalshi, credentials)?;

    let llm_key = AppConfig::resolve_secret(&cfg.llm.api_key_env)?;
    let llm = Arc::new(AnthropicClient::new(llm_key, &cfg.llm)?);

    let orchestrator = ScanOrchestrator::new(
        Box::new(venue),
        Researcher::new(Box::new(Arc::clone(&llm))),
        AlphaScorer::from_config(&cfg.scoring),
        Box::new(FixedDelay::from_secs(cfg.scan.research_delay_secs)),
        ScanSettings::from(&cfg.scan),
    );

    // -- Run -------------------------------------------------------------

    let outcome = orchestrator.run().await;

    info!(
        elapsed_secs = (chrono::Utc::now() - outcome.started_at).num_seconds(),
        calls = llm.total_calls(),
        cost = format!("${:.4}", llm.cumulative_cost()),
        "Research spend"
    );

    match &outcome.status {
        ScanStatus::Completed => {
            if let Some(report) = &outcome.report {
                println!("\n{report}");
            }
        }
        ScanStatus::AcquisitionFailed(reason) => {
            error!(reason = %reason, "Scan aborted before research");
        }
        other => info!(status = %other, "Nothing to research"),
    }

    println!(
        "\nScan complete! Found {} actionable plays.",
        outcome.opportunities.len()
    );
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kalshi_alpha=info"));

    let json_logging = std::env::var("KALSHI_ALPHA_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
