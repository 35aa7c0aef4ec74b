#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Clean Ninja terminal client.
//!
//! ```text
//! clean_ninja [--network ic] [--offline]
//! clean_ninja stats
//! clean_ninja list [--district west] [--status reported]
//! ```
//!
//! Running with no subcommand enters interactive mode. Connection details
//! come from `DFX_NETWORK`, `CANISTER_ID_BACKEND`,
//! `CANISTER_ID_INTERNET_IDENTITY`, `CLEAN_NINJA_HOST` and
//! `CLEAN_NINJA_IDENTITY_PATH`.

use chrono::Utc;
use clap::{Parser, Subcommand};
use clean_ninja_api::config::ClientConfig;
use clean_ninja_app::{connect, interactive, render};
use clean_ninja_report_models::{DistrictFilter, FilterSelection, StatusFilter};

#[derive(Parser)]
#[command(
    name = "clean_ninja",
    about = "Report and verify abandoned waste in Jakarta"
)]
struct Cli {
    /// Network to use (`local` or `ic`); overrides `DFX_NETWORK`
    #[arg(long)]
    network: Option<String>,

    /// Use an in-memory backend with demo reports
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print report statistics
    Stats,
    /// List reports
    List {
        /// District (`central`, `west`, `south`, `east`, `north`) or `all`
        #[arg(long, default_value = "all")]
        district: DistrictFilter,
        /// Status (`reported`, `cleaned`) or `all`
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = clean_ninja_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(id) = cli.network.as_deref() {
        config = config
            .with_network(id)
            .ok_or_else(|| format!("Unknown network '{id}' (expected 'local' or 'ic')"))?;
    }

    let controller = connect(&config, cli.offline).await;

    let Some(command) = cli.command else {
        return interactive::run(&controller, &multi).await;
    };

    match command {
        Commands::Stats => {
            controller.load().await;
            println!("{}", render::stats_panel(&controller.statistics()));
        }
        Commands::List { district, status } => {
            controller
                .apply_filters(FilterSelection::new(district, status))
                .await;

            let reports = controller.reports();
            if reports.is_empty() {
                println!("No reports found.");
                return Ok(());
            }

            let now = Utc::now();
            for report in &reports {
                println!("{:<12} {}", report.id, render::report_line(report, now));
            }
            println!("\n{} report(s)", reports.len());
        }
    }

    Ok(())
}
