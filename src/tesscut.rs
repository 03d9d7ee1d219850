//! MAST TESScut sector lookup

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

use crate::client::Client;
use crate::types::{Position, SectorHit};

pub const DEFAULT_RADIUS: &str = "1m";

#[derive(Debug, Deserialize)]
struct SectorResponse {
    results: Vec<SectorHit>,
}

/// All sectors whose footprint covers the position within `radius`.
///
/// An empty list means no sector imaged that part of the sky.
pub fn lookup_sectors(
    client: &Client,
    url: &str,
    position: &Position,
    radius: &str,
) -> Result<Vec<SectorHit>> {
    debug!("Sector lookup at RA {:.4} Dec {:.4} radius {}", position.ra, position.dec, radius);
    let query = [
        ("ra", position.ra_text.as_str()),
        ("dec", position.dec_text.as_str()),
        ("radius", radius),
    ];
    let response: SectorResponse = client.fetch_json(url, &query).with_context(|| {
        format!(
            "Sector lookup failed for RA {} Dec {}",
            position.ra_text, position.dec_text
        )
    })?;
    Ok(response.results)
}
