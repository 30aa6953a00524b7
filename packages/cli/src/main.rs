#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line tools for the flood exposure dashboard.
//!
//! ```text
//! flood_map_cli totals
//! flood_map_cli bounds
//! flood_map_cli stats --city "CAMDEN CITY" --scenario 2050 --hide SCHOOL
//! flood_map_cli export --city "JERSEY CITY" --output out/
//! flood_map_cli serve
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flood_map_asset_models::ScenarioYear;
use flood_map_config::AppConfig;
use flood_map_dashboard::{Dashboard, Refresh};

#[derive(Parser)]
#[command(
    name = "flood_map_cli",
    about = "Inspect NJ municipal flood exposure data"
)]
struct Cli {
    /// TOML config file, defaults to `$FLOOD_MAP_CONFIG`
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Selection flags shared by `stats` and `export`.
#[derive(clap::Args)]
struct SelectionArgs {
    /// Municipality key, e.g. "NEWARK CITY"
    #[arg(long)]
    city: Option<String>,
    /// Toggle a scenario floodplain ("2025" or "2050"); repeatable
    #[arg(long = "scenario")]
    scenarios: Vec<String>,
    /// Hide an asset type by its tag, e.g. SCHOOL; repeatable
    #[arg(long = "hide")]
    hidden: Vec<String>,
    /// Switch to the Blue Acres overlay
    #[arg(long)]
    overlay: bool,
}

impl SelectionArgs {
    fn apply(&self, dashboard: &Dashboard) {
        if let Some(city) = &self.city
            && !dashboard.select_municipality(city)
        {
            log::warn!(
                "Unknown municipality {city:?}, keeping {}",
                dashboard.selection().municipality()
            );
        }
        for year in &self.scenarios {
            if !dashboard.toggle_scenario(year) {
                log::warn!("Unknown scenario {year:?}");
            }
        }
        for tag in &self.hidden {
            if !dashboard.toggle_asset_type(tag) {
                log::warn!("Unknown asset type {tag:?}");
            }
        }
        if self.overlay {
            dashboard.toggle_overlay();
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print baseline asset totals from the findings spreadsheet
    Totals {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the viewport bounds of every municipality
    Bounds {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print exposure statistics for a municipality
    Stats {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the exposed assets of a municipality to CSV
    Export {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Output directory
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
    /// Start the API server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var_os("FLOOD_MAP_CONFIG").map(PathBuf::from));
    let config = AppConfig::load(config_path.as_deref())?;

    match cli.command {
        Commands::Totals { json } => {
            let table = flood_map_totals::load_file_or_empty(&config.data.totals_path());
            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
                return Ok(());
            }
            for (municipality, totals) in table.iter() {
                println!("{}", municipality.display_name());
                for (asset, count) in totals {
                    println!("  {:<28} {count:>6}", asset.label());
                }
            }
        }
        Commands::Bounds { json } => {
            let Some(index) = flood_map_geography::load_file_or_unavailable(
                &config.data.boundary_path(),
            ) else {
                return Err("Boundaries unavailable".into());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&index)?);
                return Ok(());
            }
            println!(
                "{:<18} {:>11} {:>10} {:>11} {:>10}",
                "MUNICIPALITY", "WEST", "SOUTH", "EAST", "NORTH"
            );
            for (municipality, bbox) in index.iter() {
                println!(
                    "{:<18} {:>11.6} {:>10.6} {:>11.6} {:>10.6}",
                    municipality.display_name(),
                    bbox.west,
                    bbox.south,
                    bbox.east,
                    bbox.north
                );
            }
        }
        Commands::Stats { selection, json } => {
            let state = flood_map_server::open_dashboard(&config).await;
            selection.apply(&state.dashboard);

            let Refresh::Applied(report) = state.dashboard.refresh_statistics().await else {
                return Err("Selection changed while computing statistics".into());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(report.as_ref())?);
                return Ok(());
            }

            println!("{}", report.display_name);
            if !report.finding.is_empty() {
                println!("{}", report.finding);
            }
            if let Some(blue_acres) = &report.blue_acres {
                println!("{blue_acres}");
            }
            println!();
            for card in &report.legend {
                let [current, projected] = &card.bars;
                println!(
                    "{} {:<28} {:>4}/{:<4} ({:>5.1}%)  {:>4}/{:<4} ({:>5.1}%){}",
                    card.emoji,
                    card.label,
                    current.count,
                    current.total,
                    current.percent,
                    projected.count,
                    projected.total,
                    projected.percent,
                    if card.visible { "" } else { "  [hidden]" },
                );
            }
            println!(
                "\nActive scenario: {}",
                report.selection.active_year().as_str()
            );
            for year in ScenarioYear::all() {
                println!(
                    "  {year}: {} exposed ({:.1}%)",
                    report.statistics.overall_count(*year),
                    report.statistics.overall_percent(*year)
                );
            }
        }
        Commands::Export { selection, output } => {
            let state = flood_map_server::open_dashboard(&config).await;
            selection.apply(&state.dashboard);

            let export = state.dashboard.export_csv().await?;
            std::fs::create_dir_all(&output)?;
            let path = output.join(&export.filename);
            std::fs::write(&path, export.contents)?;
            println!("Wrote {} rows to {}", export.row_count, path.display());
        }
        Commands::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(flood_map_server::run_server(config))
            })
            .await??;
        }
    }

    Ok(())
}
