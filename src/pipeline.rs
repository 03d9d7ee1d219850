use anyhow::{bail, Result};
use log::{info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::archive::{fetch_archive, parse_archive};
use crate::circular::{fetch_circular, parse_circular};
use crate::client::Client;
use crate::conl_ser::ToConl;
use crate::correlate::correlate;
use crate::report::{write_csv, write_html};
use crate::sectors::SectorCalendar;
use crate::tesscut::lookup_sectors;
use crate::types::{GrbRecord, Position, SectorHit, SwiftCircular};
use crate::utils::{osc8_link, osc8_path_link};
use crate::{GCN_BASE_URL, TESSCUT_SECTOR_URL};

/// Settings for a full table run
#[derive(Debug, Clone)]
pub struct TableOptions {
    pub archive_url: String,
    pub output: PathBuf,
    pub csv: Option<PathBuf>,
    pub conl: Option<PathBuf>,
    pub limit: Option<usize>,
    pub radius: String,
    pub quiet: bool,
}

/// Scrape, look up, correlate, and write the table
pub fn run_table(options: &TableOptions, calendar: &SectorCalendar) -> Result<()> {
    let client = Client::new()?;
    let mut stdout = io::stdout();

    if !options.quiet {
        println!("Fetching circular archive...");
    }
    let html = fetch_archive(&client, &options.archive_url)?;
    let circulars = select_circulars(
        parse_archive(&html, GCN_BASE_URL)?,
        options.limit,
        &options.archive_url,
    )?;

    let total = circulars.len();
    if !options.quiet {
        println!("Processing {} circulars...\n", total);
    }

    let mut records = Vec::with_capacity(total);
    for (i, circular) in circulars.into_iter().enumerate() {
        if !options.quiet {
            print!(
                "[{:02}/{:02}] {} {}",
                i + 1,
                total,
                osc8_link(&circular.url, &circular.serial.to_string()),
                circular.grb_id
            );
            stdout.flush()?;
        }

        let text = fetch_circular(&client, &circular.url)?;
        let lookup = |position: &Position| {
            lookup_sectors(&client, TESSCUT_SECTOR_URL, position, &options.radius)
        };
        match build_record(circular, &text, lookup, calendar)? {
            Some(record) => {
                if !options.quiet {
                    let in_window = record.matches.iter().filter(|m| m.contains_burst()).count();
                    println!(" sectors: {} (in window: {})", record.matches.len(), in_window);
                }
                records.push(record);
            }
            None => {
                if !options.quiet {
                    println!(" skipped");
                }
            }
        }
    }

    write_outputs(&records, options)?;

    if !options.quiet {
        println!(
            "\nDone! Wrote {} rows to {}",
            records.len(),
            osc8_path_link(&options.output)
        );
    }
    Ok(())
}

/// Apply `--limit` to the parsed archive entries.
///
/// An archive with no Swift detections is an error; a limit of zero is not.
fn select_circulars(
    mut circulars: Vec<SwiftCircular>,
    limit: Option<usize>,
    archive_url: &str,
) -> Result<Vec<SwiftCircular>> {
    if circulars.is_empty() {
        bail!("No Swift detection circulars found at {}", archive_url);
    }
    info!("Found {} Swift detection circulars", circulars.len());

    if let Some(limit) = limit {
        circulars.truncate(limit);
    }
    Ok(circulars)
}

/// Turn one fetched circular into a table row.
///
/// Returns `Ok(None)` when the id or date can't be extracted. A circular
/// without RA/Dec keeps its row with no sector matches and `lookup` is not
/// called.
fn build_record(
    circular: SwiftCircular,
    text: &str,
    lookup: impl FnOnce(&Position) -> Result<Vec<SectorHit>>,
    calendar: &SectorCalendar,
) -> Result<Option<GrbRecord>> {
    let detail = match parse_circular(text) {
        Ok(d) => d,
        Err(e) => {
            warn!("Skipping circular {}: {}", circular.serial, e);
            return Ok(None);
        }
    };

    let hits = match &detail.position {
        Some(position) => lookup(position)?,
        None => {
            warn!("Circular {} has no RA, Dec; sector lookup skipped", circular.serial);
            Vec::new()
        }
    };
    let matches = correlate(detail.obs_date, hits, calendar);

    Ok(Some(GrbRecord {
        circular,
        detail,
        matches,
    }))
}

fn write_outputs(records: &[GrbRecord], options: &TableOptions) -> Result<()> {
    write_html(records, &options.output)?;
    info!("Wrote HTML table to {}", options.output.display());

    if let Some(path) = &options.csv {
        write_csv(records, path)?;
        info!("Wrote CSV table to {}", path.display());
    }
    if let Some(path) = &options.conl {
        fs::write(path, records.to_conl())?;
        info!("Wrote CONL records to {}", path.display());
    }
    Ok(())
}
