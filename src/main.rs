//! sushi-scout entry point.
//!
//! `menu` shows what the engine synthesizes for one restaurant; `rank` runs a
//! discovery batch (or pre-synthesized candidates) through the ranker and can
//! quote an order for the winner. JSON goes to stdout, logs to stderr.

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use common::{dollars, Error, PriceTier, RestaurantRecord, ScoutConfig};
use menu_engine::{quote_order, Scout, ScoutReport};
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::load_config;

#[derive(Parser)]
#[command(name = "sushi-scout")]
#[command(about = "Find the cheapest delivered tuna roll across nearby restaurants")]
struct Cli {
    /// TOML config file (defaults to $SCOUT_CONFIG, then ./scout.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print calibration, menu, and delivery info for one restaurant.
    Menu(MenuArgs),
    /// Rank a batch of restaurants read from a JSON file.
    Rank(RankArgs),
}

#[derive(Args)]
struct MenuArgs {
    /// Restaurant identity; the seed for everything synthesized.
    #[arg(long)]
    id: String,

    #[arg(long, default_value = "")]
    name: String,

    /// Ordinal price tier, 1 (inexpensive) to 4 (very expensive).
    #[arg(long, conflicts_with_all = ["range_low", "range_high"])]
    tier: Option<i64>,

    /// Per-person price range, major currency units.
    #[arg(long, requires = "range_high")]
    range_low: Option<f64>,

    #[arg(long, requires = "range_low")]
    range_high: Option<f64>,

    #[arg(long)]
    currency: Option<String>,

    /// Mark the restaurant as known not to deliver.
    #[arg(long)]
    no_delivery: bool,
}

#[derive(Args)]
struct RankArgs {
    /// JSON array of discovery records (or `{"restaurants": [...]}`).
    #[arg(long)]
    input: PathBuf,

    /// Input already holds candidates with menus and delivery info.
    #[arg(long)]
    candidates: bool,

    /// Quote a simulated order of the cheapest offer to this address.
    #[arg(long)]
    order_address: Option<String>,

    #[arg(long, default_value = "")]
    instructions: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sushi_scout=info,menu_engine=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Ranking config: category={} include_delivery={} unavailable={:?} batch={:?}",
        cfg.ranking.category,
        cfg.ranking.include_delivery,
        cfg.ranking.unavailable_policy,
        cfg.ranking.batch_policy
    );

    let result = match cli.command {
        Commands::Menu(args) => run_menu(cfg, args),
        Commands::Rank(args) => run_rank(cfg, args),
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_menu(cfg: ScoutConfig, args: MenuArgs) -> Result<String, Error> {
    let price_level = match args.tier {
        Some(level) => Some(PriceTier::from_level(level).ok_or_else(|| {
            Error::validation(format!("tier must be 1..=4 (got {})", level))
        })?),
        None => None,
    };
    let record = RestaurantRecord {
        id: args.id,
        name: args.name,
        price_level,
        price_range_low: args.range_low,
        price_range_high: args.range_high,
        currency: args.currency,
        delivery: args.no_delivery.then_some(false),
        ..Default::default()
    };

    let synth = Scout::new(cfg).synthesize(&record)?;
    if !synth.calibration.calibrated {
        warn!("{} has no price signal; using the fallback tier", record.id);
    }
    let output = json!({
        "calibration": synth.calibration,
        "menu": synth.candidate.menu,
        "delivery_info": synth.candidate.delivery_info,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

fn run_rank(cfg: ScoutConfig, args: RankArgs) -> Result<String, Error> {
    let payload = read_input(&args.input)?;
    let scout = Scout::new(cfg);
    let report = if args.candidates {
        scout.rank_candidates(&payload)?
    } else {
        scout.scout_cheapest(&payload)?
    };
    log_report(&report);

    let order = match (&args.order_address, &report.cheapest) {
        (Some(address), Some(best)) => Some(quote_order(
            best,
            address,
            &args.instructions,
            Utc::now(),
            &scout.config().order,
        )?),
        (Some(_), None) => {
            warn!("No offer to order");
            None
        }
        (None, _) => None,
    };

    let output = json!({ "report": report, "order": order });
    Ok(serde_json::to_string_pretty(&output)?)
}

fn read_input(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(Error::from)
}

fn log_report(report: &ScoutReport) {
    match &report.cheapest {
        Some(best) => info!(
            "Cheapest: {} at {} for ${:.2} (item ${:.2} + delivery ${:.2})",
            best.item.name,
            best.restaurant_name,
            dollars(best.total_cost_cents),
            dollars(best.item_price_cents),
            dollars(best.delivery_fee_cents)
        ),
        None => info!(
            "No matching offers across {} restaurants",
            report.restaurants_checked
        ),
    }
    if !report.rejected.is_empty() {
        warn!("{} entries rejected", report.rejected.len());
    }
}
