use anyhow::Result;
use clap::{Parser, Subcommand};
use gn_census_pipeline::{clean, config::AppConfig, geometry, grid, linkage};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the raw census export into the canonical per-division CSV
    Clean {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Link canonical records to boundary features and report mismatches
    Link {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Restrict the linkage to one DS division by name
        #[arg(long, value_name = "NAME")]
        ds_division: Option<String>,
    },
    /// Sanity-check feature centroids against the geographic envelope
    VerifyPositions {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Clean { config } => {
            let app_config = AppConfig::load_from_file(config)?;
            run_clean(&app_config)?;
        }
        Commands::Link {
            config,
            ds_division,
        } => {
            let app_config = AppConfig::load_from_file(config)?;
            run_link(&app_config, ds_division.as_deref())?;
        }
        Commands::VerifyPositions { config } => {
            let app_config = AppConfig::load_from_file(config)?;
            run_verify_positions(&app_config)?;
        }
    }

    Ok(())
}

fn run_clean(config: &AppConfig) -> Result<()> {
    println!("Reading census export {:?}...", config.input.census_table);
    let grid = grid::load_grid(&config.input.census_table, &config.input.sheet)?;
    let (records, report) = clean::clean_table(&grid)?;
    println!(
        "Retained {} division records from {} data rows",
        records.len(),
        report.rows_scanned
    );

    if report.parse_failures > 0 {
        println!(
            "Warning: {} numeric cells could not be parsed and were treated as zero.",
            report.parse_failures
        );
    }
    if !report.sex_mismatches.is_empty() {
        println!(
            "Warning: {} rows have mismatching Sex sums.",
            report.sex_mismatches.len()
        );
    }
    if !report.age_mismatches.is_empty() {
        println!(
            "Warning: {} rows have mismatching Age sums.",
            report.age_mismatches.len()
        );
    }

    println!("\nSample Data:");
    for record in records.iter().take(5) {
        println!(
            "  {} | {} | {} | pop {}",
            record.gn_code, record.district_name, record.gn_name, record.total_population
        );
    }

    println!("\nSaving to {:?}...", config.output.cleaned_csv);
    clean::write_cleaned_csv(&config.output.cleaned_csv, &records)?;
    println!("Done.");
    Ok(())
}

fn run_link(config: &AppConfig, ds_division: Option<&str>) -> Result<()> {
    // A missing map is not a crash: the canonical CSV stands on its own.
    if !config.input.geometry.exists() {
        println!(
            "Geometry file {:?} not found; linkage unavailable.",
            config.input.geometry
        );
        return Ok(());
    }

    let records = clean::read_cleaned_csv(&config.output.cleaned_csv)?;
    println!("Loaded {} canonical records", records.len());
    let features = geometry::load_features(&config.input.geometry)?;

    let report = linkage::link_records(&records, &features, ds_division);
    println!(
        "Matched {}/{} division keys ({} unmatched)",
        report.matched,
        report.total,
        report.unmatched.len()
    );
    linkage::write_mismatch_report(&config.output.mismatch_report, &report)?;
    println!(
        "Mismatch report saved to {:?}",
        config.output.mismatch_report
    );
    Ok(())
}

fn run_verify_positions(config: &AppConfig) -> Result<()> {
    let features = geometry::load_features(&config.input.geometry)?;
    println!("Total features to check: {}\n", features.len());

    let bounds = config.bounds.unwrap_or(geometry::ISLAND_BOUNDS);
    println!("Checking ALL features...");
    let report = geometry::verify_positions(&features, &bounds);

    println!("In bounds: {} ({:.2}%)", report.in_bounds, report.in_bounds_percent());
    println!("Out of bounds: {}", report.out_of_bounds);
    println!("No valid geometry: {}", report.no_geometry);

    geometry::write_position_report(&config.output.position_report, &report)?;
    println!(
        "Detailed report saved to {:?}",
        config.output.position_report
    );
    Ok(())
}
