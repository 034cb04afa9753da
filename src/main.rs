use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stock_dashboard::controller::DashboardController;
use stock_dashboard::models::{Config, Symbol};
use stock_dashboard::ui::app::run_app_async;
use stock_dashboard::ui::components::lines_to_text;
use stock_dashboard::ui::notification::Severity;
use stock_dashboard::ui::watchlist::WatchlistPanel;

/// Terminal dashboard for the stock analysis service
#[derive(Parser, Debug)]
#[command(name = "stock-dashboard")]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the analysis service (overrides STOCK_DASHBOARD_API_BASE)
    #[arg(long)]
    api_base: Option<String>,

    /// Directory where downloaded PDF reports are saved
    #[arg(long)]
    download_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive dashboard (default)
    Tui,
    /// Analyze one symbol and print the result
    Analyze { symbol: String },
    /// Print the watchlist with current prices
    Watchlist,
    /// Print a symbol's report as text
    Report { symbol: String },
}

fn init_tracing(config: &Config, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("stock_dashboard=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // stderr would draw over the terminal UI
        None if interactive => builder.with_writer(std::io::sink).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(api_base) = &args.api_base {
        config.api_base = Config::parse_api_base(api_base)?;
    }
    if let Some(dir) = args.download_dir {
        config.download_dir = dir;
    }

    let command = args.command.unwrap_or(Command::Tui);
    init_tracing(&config, matches!(command, Command::Tui))?;
    info!("Starting stock dashboard against {}", config.api_base);

    let result = match command {
        Command::Tui => run_app_async(&config).await,
        Command::Analyze { symbol } => analyze(&config, &symbol).await,
        Command::Watchlist => watchlist(&config).await,
        Command::Report { symbol } => report(&config, &symbol).await,
    };

    if let Err(e) = &result {
        error!("Dashboard failed: {:#}", e);
    }
    result
}

/// Error out with the last notification when it reports a failure
fn check_failed(controller: &DashboardController) -> Result<()> {
    match controller.notification() {
        Some(n) if matches!(n.severity, Severity::Error | Severity::Warning) => Err(anyhow!(n.message.clone())),
        _ => Ok(()),
    }
}

async fn analyze(config: &Config, raw: &str) -> Result<()> {
    let mut controller = DashboardController::from_config(config)?;
    controller.analyze(raw);
    controller.settle().await;
    check_failed(&controller)?;

    if let Some(view) = &controller.analysis.view {
        println!("{}", lines_to_text(&view.summary_lines()));
    }
    Ok(())
}

async fn watchlist(config: &Config) -> Result<()> {
    let mut controller = DashboardController::from_config(config)?;
    controller.open_watchlist();
    controller.settle().await;

    if controller.watchlist.cards.is_empty() {
        println!("Watchlist is empty");
    }
    for card in &controller.watchlist.cards {
        println!("{}", lines_to_text(&[WatchlistPanel::card_line(card)]));
    }
    Ok(())
}

async fn report(config: &Config, raw: &str) -> Result<()> {
    let symbol = Symbol::parse(raw)?;
    let mut controller = DashboardController::from_config(config)?;
    controller.render_report_inline(symbol.as_str());
    controller.settle().await;
    check_failed(&controller)?;

    println!("{}", controller.reports.lines.join("\n"));
    Ok(())
}
