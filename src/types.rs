//! Burst, circular, and sector types shared across the pipeline

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

/// A Swift detection entry from the circular archive listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwiftCircular {
    /// Circular serial number (e.g. 26789)
    pub serial: u32,
    /// Burst identifier without the trailing colon (e.g. "GRB 200101A")
    pub grb_id: String,
    /// Observation description, from "Swift" to end of line
    pub description: String,
    /// Absolute link to the circular text
    pub url: String,
}

/// Sky position in decimal degrees.
///
/// The original text of each coordinate is kept so the sector lookup sends
/// exactly what the circular published.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub ra: f64,
    pub dec: f64,
    pub ra_text: String,
    pub dec_text: String,
}

impl Position {
    /// Parse decimal-degree text, requiring RA in 0..=360 and Dec in -90..=90.
    /// A leading '+' is dropped from the kept text.
    pub fn parse(ra: &str, dec: &str) -> Result<Self> {
        let ra_text = ra.trim().trim_start_matches('+');
        let dec_text = dec.trim().trim_start_matches('+');
        let ra: f64 = ra_text
            .parse()
            .with_context(|| format!("Invalid RA: '{}'", ra_text))?;
        let dec: f64 = dec_text
            .parse()
            .with_context(|| format!("Invalid Dec: '{}'", dec_text))?;
        if !(0.0..=360.0).contains(&ra) {
            bail!("RA {} out of range 0..360", ra);
        }
        if !(-90.0..=90.0).contains(&dec) {
            bail!("Dec {} out of range -90..90", dec);
        }
        Ok(Self {
            ra,
            dec,
            ra_text: ra_text.to_string(),
            dec_text: dec_text.to_string(),
        })
    }
}

/// Fields extracted from the body of a single circular
#[derive(Debug, Clone, PartialEq)]
pub struct CircularDetail {
    pub grb_id: String,
    /// Raw "DATE:" header text up to and including "GMT"
    pub date_text: String,
    /// Calendar date of the circular, used as the burst date
    pub obs_date: Option<NaiveDate>,
    /// The "RA, Dec ..." line fragment
    pub coords_text: Option<String>,
    pub position: Option<Position>,
}

/// One sector result from the TESScut sector service.
///
/// The service returns every field as a string, with sectors zero-padded
/// ("0001").
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectorHit {
    pub sector: String,
    #[serde(rename = "sectorName")]
    pub sector_name: String,
    pub camera: String,
    pub ccd: String,
}

impl SectorHit {
    /// Numeric sector, or None if the service sent something unexpected
    pub fn sector_number(&self) -> Option<u32> {
        self.sector.trim().parse().ok()
    }
}

/// Observation window of one sector, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A candidate sector paired with its window and the burst's offsets from it
#[derive(Debug, Clone, PartialEq)]
pub struct SectorMatch {
    pub hit: SectorHit,
    pub window: Option<SectorWindow>,
    /// Burst date minus sector start, in days
    pub start_offset: Option<i64>,
    /// Burst date minus sector end, in days
    pub end_offset: Option<i64>,
}

impl SectorMatch {
    /// Whether the burst date falls inside the sector's observation window
    pub fn contains_burst(&self) -> bool {
        match (self.start_offset, self.end_offset) {
            (Some(start), Some(end)) => start >= 0 && end <= 0,
            _ => false,
        }
    }
}

/// One row of the final table
#[derive(Debug, Clone, PartialEq)]
pub struct GrbRecord {
    pub circular: SwiftCircular,
    pub detail: CircularDetail,
    pub matches: Vec<SectorMatch>,
}
