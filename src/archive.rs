//! GCN circular archive listing

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::circular::ID_RE;
use crate::client::Client;
use crate::types::SwiftCircular;

lazy_static! {
    static ref SWIFT_RE: Regex = Regex::new(r"Swift detection").unwrap();
    static ref DESC_RE: Regex = Regex::new(r"Swift.*").unwrap();
    static ref SERIAL_RE: Regex = Regex::new(r"\d{5}").unwrap();
    static ref LINK_RE: Regex = Regex::new(r"gcn3.*gcn3").unwrap();
}

/// Fetch the archive index page
pub fn fetch_archive(client: &Client, url: &str) -> Result<String> {
    client
        .fetch_text(url)
        .with_context(|| format!("Failed to fetch circular archive: {}", url))
}

/// Extract all Swift detection circulars from the archive index.
///
/// Only the first `<ul>` on the page holds circulars. Entries are returned in
/// page order.
pub fn parse_archive(html: &str, base_url: &str) -> Result<Vec<SwiftCircular>> {
    let base = Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
    let document = Html::parse_document(html);

    let ul_selector = Selector::parse("ul").unwrap();
    let li_selector = Selector::parse("li").unwrap();

    let Some(list) = document.select(&ul_selector).next() else {
        debug!("Archive page has no <ul>");
        return Ok(Vec::new());
    };

    let circulars = list
        .select(&li_selector)
        .filter_map(|li| parse_entry(li, &base))
        .collect();

    Ok(circulars)
}

fn parse_entry(li: ElementRef, base: &Url) -> Option<SwiftCircular> {
    let text = collapse_whitespace(&li.text().collect::<Vec<_>>().join(" "));
    if !SWIFT_RE.is_match(&text) {
        return None;
    }

    let grb_id = match ID_RE.find(&text) {
        Some(m) => m.as_str().trim_end_matches(':').to_string(),
        None => {
            trace!("Skipping entry without GRB id: {}", text);
            return None;
        }
    };

    let href = entry_link(li)?;
    let url = base.join(&href).ok()?.to_string();

    // The link names the circular; the text may carry other numbers first
    let serial = SERIAL_RE
        .find(&href)
        .or_else(|| SERIAL_RE.find(&text))
        .and_then(|m| m.as_str().parse().ok())?;

    let description = DESC_RE
        .find(&text)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    Some(SwiftCircular {
        serial,
        grb_id,
        description,
        url,
    })
}

/// First anchor href that looks like a circular path (gcn3/NNNNN.gcn3)
fn entry_link(li: ElementRef) -> Option<String> {
    let a_selector = Selector::parse("a[href]").unwrap();
    li.select(&a_selector)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| LINK_RE.find(href).map(|m| m.as_str().to_string()))
}

/// Collapse runs of whitespace (including newlines) into single spaces
fn collapse_whitespace(text: &str) -> String {
    let mut cleaned = String::new();
    let mut prev_was_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !prev_was_space && !cleaned.is_empty() {
                cleaned.push(' ');
                prev_was_space = true;
            }
        } else {
            cleaned.push(c);
            prev_was_space = false;
        }
    }
    cleaned.trim_end().to_string()
}
