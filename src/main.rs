use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

mod archive;
mod circular;
mod client;
mod conl_ser;
mod correlate;
mod error;
mod pipeline;
mod report;
mod sectors;
mod tesscut;
mod types;
mod utils;

use pipeline::{run_table, TableOptions};
use sectors::SectorCalendar;
use types::Position;

pub const ARCHIVE_URL: &str = "https://gcn.gsfc.nasa.gov/gcn/gcn3_archive.html";
/// Circular links in the archive are relative to this
pub const GCN_BASE_URL: &str = "https://gcn.gsfc.nasa.gov/";
pub const TESSCUT_SECTOR_URL: &str = "https://mast.stsci.edu/tesscut/api/v0.1/sector";
pub const DEFAULT_OUTPUT: &str = "GRB_Table.html";

#[derive(Parser)]
#[command(name = "grb-tess")]
#[command(about = "Correlate Swift GRB circulars with TESS observation sectors")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full GRB / TESS sector table
    Table {
        /// Output HTML file
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
        /// Also write the table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Also write the records as CONL
        #[arg(long)]
        conl: Option<PathBuf>,
        /// Only process the first N Swift circulars
        #[arg(short, long)]
        limit: Option<usize>,
        /// Search radius for the sector lookup
        #[arg(long, default_value = tesscut::DEFAULT_RADIUS)]
        radius: String,
        /// Sector calendar file (CONL); built-in year 1 calendar otherwise
        #[arg(long)]
        sectors: Option<PathBuf>,
        /// Circular archive index page
        #[arg(long, default_value = ARCHIVE_URL)]
        archive_url: String,
        /// Quiet mode - suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },
    /// List Swift detection circulars from the archive
    Circulars {
        /// Only list the first N circulars
        #[arg(short, long)]
        limit: Option<usize>,
        /// Circular archive index page
        #[arg(long, default_value = ARCHIVE_URL)]
        archive_url: String,
    },
    /// Look up TESS sectors for a single position
    Lookup {
        /// Right ascension in degrees
        #[arg(long, allow_hyphen_values = true)]
        ra: String,
        /// Declination in degrees
        #[arg(long, allow_hyphen_values = true)]
        dec: String,
        /// Search radius for the sector lookup
        #[arg(long, default_value = tesscut::DEFAULT_RADIUS)]
        radius: String,
        /// Burst date (YYYY-MM-DD) to compare against sector windows
        #[arg(long)]
        date: Option<String>,
        /// Sector calendar file (CONL)
        #[arg(long)]
        sectors: Option<PathBuf>,
    },
    /// Print the sector calendar in use
    Sectors {
        /// Sector calendar file (CONL)
        #[arg(long)]
        sectors: Option<PathBuf>,
    },
}

/// Activate a logger writing to stdout. `RUST_LOG` still applies on top of
/// the verbosity flag.
fn setup_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Warn),
        1 => builder.filter_level(log::LevelFilter::Debug),
        _ => builder.filter_level(log::LevelFilter::Trace),
    };
    builder.init();
}

fn load_calendar(path: Option<&Path>) -> Result<SectorCalendar> {
    match path {
        Some(p) => {
            let calendar = SectorCalendar::load_from_path(p)?;
            info!("Loaded {} sectors from {}", calendar.len(), p.display());
            Ok(calendar)
        }
        None => Ok(SectorCalendar::builtin()),
    }
}

fn run_circulars(limit: Option<usize>, archive_url: &str) -> Result<()> {
    let client = client::Client::new()?;
    let html = archive::fetch_archive(&client, archive_url)?;
    let mut circulars = archive::parse_archive(&html, GCN_BASE_URL)?;
    if let Some(limit) = limit {
        circulars.truncate(limit);
    }

    for circular in &circulars {
        println!(
            "{} {:<14} {}",
            utils::osc8_link(&circular.url, &circular.serial.to_string()),
            circular.grb_id,
            circular.description
        );
    }
    println!("\n{} Swift detection circulars", circulars.len());
    Ok(())
}

fn run_lookup(
    ra: &str,
    dec: &str,
    radius: &str,
    date: Option<&str>,
    calendar: &SectorCalendar,
) -> Result<()> {
    let position = Position::parse(ra, dec)?;
    let burst_date = date
        .map(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", d))
        })
        .transpose()?;

    if let Some(date) = burst_date {
        let active = calendar.sectors_on_date(date);
        if active.is_empty() {
            println!("No known sector was observing on {}", date);
        } else {
            let list: Vec<String> = active.iter().map(|s| s.to_string()).collect();
            println!("Sectors observing on {}: {}", date, list.join(", "));
        }
    }

    let client = client::Client::new()?;
    let hits = tesscut::lookup_sectors(&client, TESSCUT_SECTOR_URL, &position, radius)?;
    if hits.is_empty() {
        println!("No TESS sectors cover RA {} Dec {}", ra, dec);
        return Ok(());
    }

    for m in correlate::correlate(burst_date, hits, calendar) {
        print!(
            "Sector {} ({}) camera {} ccd {}",
            m.hit.sector, m.hit.sector_name, m.hit.camera, m.hit.ccd
        );
        match m.window {
            Some(w) => println!(
                "  {} to {}  start {}  end {}{}",
                w.start,
                w.end,
                report::format_offset(m.start_offset),
                report::format_offset(m.end_offset),
                if m.contains_burst() { "  [in window]" } else { "" }
            ),
            None => println!("  window {}", report::NOT_AVAILABLE),
        }
    }
    Ok(())
}

fn run_sectors(calendar: &SectorCalendar) -> Result<()> {
    if calendar.is_empty() {
        println!("Sector calendar is empty");
        return Ok(());
    }
    for (sector, window) in calendar.iter() {
        let days = (window.end - window.start).num_days() + 1;
        println!("Sector {:>3}: {} to {} ({} days)", sector, window.start, window.end, days);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Table {
            output,
            csv,
            conl,
            limit,
            radius,
            sectors,
            archive_url,
            quiet,
        } => {
            let calendar = load_calendar(sectors.as_deref())?;
            let options = TableOptions {
                archive_url,
                output,
                csv,
                conl,
                limit,
                radius,
                quiet,
            };
            run_table(&options, &calendar)
        }
        Commands::Circulars { limit, archive_url } => run_circulars(limit, &archive_url),
        Commands::Lookup {
            ra,
            dec,
            radius,
            date,
            sectors,
        } => {
            let calendar = load_calendar(sectors.as_deref())?;
            run_lookup(&ra, &dec, &radius, date.as_deref(), &calendar)
        }
        Commands::Sectors { sectors } => run_sectors(&load_calendar(sectors.as_deref())?),
    }
}
