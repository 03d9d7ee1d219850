//! Field extraction from the body of a single GCN circular

use anyhow::{Context, Result};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::client::Client;
use crate::error::ExtractError;
use crate::types::{CircularDetail, Position};

lazy_static! {
    /// Burst identifier such as "GRB 200101A:"
    pub(crate) static ref ID_RE: Regex = Regex::new(r"\D\D\D \d{6}\D:").unwrap();
    static ref DATE_RE: Regex = Regex::new(r"\d\d.*GMT").unwrap();
    static ref COORDS_RE: Regex = Regex::new(r"RA, Dec.*\d\d\d").unwrap();
    static ref DEGREES_RE: Regex = Regex::new(r"[-+]?\d{1,3}\.\d{3,}").unwrap();
}

/// Fetch the raw text of a circular
pub fn fetch_circular(client: &Client, url: &str) -> Result<String> {
    client
        .fetch_text(url)
        .with_context(|| format!("Failed to fetch circular: {}", url))
}

/// Pull the burst id, date, and position out of a circular body.
///
/// The date is the circular's GMT header date. A body without a position
/// still parses; its sector lookup is skipped.
pub fn parse_circular(text: &str) -> Result<CircularDetail, ExtractError> {
    let grb_id = ID_RE
        .find(text)
        .map(|m| m.as_str().trim_end_matches(':').to_string())
        .ok_or(ExtractError::MissingId)?;

    let date_text = DATE_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ExtractError::MissingDate(grb_id.clone()))?;
    let obs_date = parse_gmt_date(&date_text);

    let coords_text = COORDS_RE.find(text).map(|m| m.as_str().to_string());
    let position = coords_text.as_deref().and_then(parse_position);

    Ok(CircularDetail {
        grb_id,
        date_text,
        obs_date,
        coords_text,
        position,
    })
}

/// Parse the leading "yy/mm/dd" of a circular date line
pub fn parse_gmt_date(date_text: &str) -> Option<NaiveDate> {
    let head = date_text.get(..8)?;
    NaiveDate::parse_from_str(head, "%y/%m/%d").ok()
}

/// First decimal number is RA, second is Dec; out-of-range values give none
fn parse_position(coords_text: &str) -> Option<Position> {
    let mut numbers = DEGREES_RE.find_iter(coords_text).map(|m| m.as_str());
    let ra = numbers.next()?;
    let dec = numbers.next()?;
    Position::parse(ra, dec).ok()
}
