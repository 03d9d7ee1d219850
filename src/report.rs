use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::types::{GrbRecord, SectorMatch};

pub const NOT_AVAILABLE: &str = "N/A";

const COLUMNS: &[&str] = &[
    "ID",
    "RA, Dec",
    "Swift Date",
    "Circular",
    "Sector",
    "Sector Name",
    "Camera",
    "CCD",
    "Offset from sector start",
    "Offset from sector end",
    "In window",
];

/// Format a day offset the way it reads in the table ("+5 days", "-21 days")
pub fn format_offset(days: Option<i64>) -> String {
    match days {
        Some(1) => "+1 day".to_string(),
        Some(-1) => "-1 day".to_string(),
        Some(d) if d > 0 => format!("+{} days", d),
        Some(d) => format!("{} days", d),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// One cell listing every candidate sector, or N/A when there are none
fn join_matches(matches: &[SectorMatch], sep: &str, f: impl Fn(&SectorMatch) -> String) -> String {
    if matches.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        matches.iter().map(f).collect::<Vec<_>>().join(sep)
    }
}

fn in_window_label(m: &SectorMatch) -> String {
    if m.window.is_none() {
        NOT_AVAILABLE.to_string()
    } else if m.contains_burst() {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// Plain-text cell values for one record, candidates joined by `sep`
fn row_cells(record: &GrbRecord, sep: &str) -> Vec<String> {
    let detail = &record.detail;
    let matches = &record.matches;

    vec![
        detail.grb_id.clone(),
        detail
            .coords_text
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        detail.date_text.clone(),
        record.circular.url.clone(),
        join_matches(matches, sep, |m| m.hit.sector.clone()),
        join_matches(matches, sep, |m| m.hit.sector_name.clone()),
        join_matches(matches, sep, |m| m.hit.camera.clone()),
        join_matches(matches, sep, |m| m.hit.ccd.clone()),
        join_matches(matches, sep, |m| format_offset(m.start_offset)),
        join_matches(matches, sep, |m| format_offset(m.end_offset)),
        join_matches(matches, sep, in_window_label),
    ]
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn css_styles() -> &'static str {
    r#"
        body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 24px; color: #222; }
        table { border-collapse: collapse; font-size: 14px; }
        th, td { border: 1px solid #ccc; padding: 4px 8px; vertical-align: top; text-align: left; }
        th { background: #f2f2f2; }
        tr:nth-child(even) td { background: #fafafa; }
        td.in-window { color: #0a7a28; font-weight: 600; }
        p.summary { color: #666; }
    "#
}

/// Render the full HTML page
pub fn render_html(records: &[GrbRecord]) -> String {
    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>GRB / TESS Sector Table</title>
    <style>{}</style>
</head>
<body>
<h1>Swift GRB Circulars and TESS Sectors</h1>
"#,
        css_styles()
    );

    let in_window = records
        .iter()
        .filter(|r| r.matches.iter().any(|m| m.contains_burst()))
        .count();
    html.push_str(&format!(
        "<p class=\"summary\">{} bursts, {} observed during a candidate sector</p>\n",
        records.len(),
        in_window
    ));

    html.push_str("<table>\n<thead>\n<tr><th></th>");
    for column in COLUMNS {
        html.push_str(&format!("<th>{}</th>", html_escape(column)));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for (index, record) in records.iter().enumerate() {
        let cells = row_cells(record, "\n");
        html.push_str(&format!("<tr><th>{}</th>", index));
        for (column, cell) in cells.iter().enumerate() {
            let escaped = html_escape(cell).replace('\n', "<br>");
            match column {
                // Circular column links to the source text
                3 => html.push_str(&format!(
                    "<td><a href=\"{}\">{}</a></td>",
                    html_escape(&record.circular.url),
                    record.circular.serial
                )),
                10 if record.matches.iter().any(|m| m.contains_burst()) => {
                    html.push_str(&format!("<td class=\"in-window\">{}</td>", escaped))
                }
                _ => html.push_str(&format!("<td>{}</td>", escaped)),
            }
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

pub fn write_html(records: &[GrbRecord], path: &Path) -> Result<()> {
    fs::write(path, render_html(records))
        .with_context(|| format!("Failed to write HTML table: {}", path.display()))
}

/// Write the table as CSV, candidate sectors separated by spaces
pub fn write_csv(records: &[GrbRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    writer.write_record(COLUMNS)?;
    for record in records {
        writer.write_record(row_cells(record, " "))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CircularDetail, SectorHit, SectorWindow, SwiftCircular};
    use chrono::NaiveDate;

    fn record(matches: Vec<SectorMatch>) -> GrbRecord {
        GrbRecord {
            circular: SwiftCircular {
                serial: 23456,
                grb_id: "GRB 181120A".to_string(),
                description: "Swift detection of a burst".to_string(),
                url: "https://gcn.gsfc.nasa.gov/gcn3/23456.gcn3".to_string(),
            },
            detail: CircularDetail {
                grb_id: "GRB 181120A".to_string(),
                date_text: "18/11/20 10:00:00 GMT".to_string(),
                obs_date: NaiveDate::from_ymd_opt(2018, 11, 20),
                coords_text: Some("RA, Dec 163.746, 51.967".to_string()),
                position: None,
            },
            matches,
        }
    }

    fn sector_match(sector: &str, start: i64, end: i64) -> SectorMatch {
        SectorMatch {
            hit: SectorHit {
                sector: sector.to_string(),
                sector_name: format!("tess-s{}-2-1", sector),
                camera: "2".to_string(),
                ccd: "1".to_string(),
            },
            window: Some(SectorWindow {
                start: NaiveDate::from_ymd_opt(2018, 11, 15).unwrap(),
                end: NaiveDate::from_ymd_opt(2018, 12, 11).unwrap(),
            }),
            start_offset: Some(start),
            end_offset: Some(end),
        }
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(Some(5)), "+5 days");
        assert_eq!(format_offset(Some(-21)), "-21 days");
        assert_eq!(format_offset(Some(0)), "0 days");
        assert_eq!(format_offset(Some(1)), "+1 day");
        assert_eq!(format_offset(None), "N/A");
    }

    #[test]
    fn test_row_without_sectors() {
        let cells = row_cells(&record(Vec::new()), " ");
        assert_eq!(cells.len(), COLUMNS.len());
        assert_eq!(cells[0], "GRB 181120A");
        assert!(cells[4..].iter().all(|c| c == "N/A"));
    }

    #[test]
    fn test_row_with_two_sectors() {
        let r = record(vec![sector_match("0005", 5, -21), sector_match("0012", -180, -205)]);
        let cells = row_cells(&r, " ");
        assert_eq!(cells[4], "0005 0012");
        assert_eq!(cells[8], "+5 days -180 days");
        assert_eq!(cells[10], "yes no");
    }

    #[test]
    fn test_render_html() {
        let r = record(vec![sector_match("0005", 5, -21)]);
        let html = render_html(&[r]);
        assert!(html.contains("<th>Swift Date</th>"));
        assert!(html.contains(
            "<th>Offset from sector start</th><th>Offset from sector end</th><th>In window</th></tr>"
        ));
        assert!(html.contains(
            "<a href=\"https://gcn.gsfc.nasa.gov/gcn3/23456.gcn3\">23456</a>"
        ));
        assert!(html.contains("<td>tess-s0005-2-1</td>"));
        assert!(html.contains("<td class=\"in-window\">yes</td>"));
        assert!(html.contains("1 bursts, 1 observed"));
    }

    #[test]
    fn test_render_html_escapes_text() {
        let mut r = record(Vec::new());
        r.detail.coords_text = Some("RA, Dec <b>1.000</b>".to_string());
        let html = render_html(&[r]);
        assert!(html.contains("RA, Dec &lt;b&gt;1.000&lt;/b&gt;"));
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grb.csv");
        let r = record(vec![sector_match("0005", 5, -21)]);
        write_csv(&[r], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ID,\"RA, Dec\",Swift Date,Circular,Sector,Sector Name,Camera,CCD,\
             Offset from sector start,Offset from sector end,In window"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("GRB 181120A,\"RA, Dec 163.746, 51.967\""));
        assert!(row.ends_with("+5 days,-21 days,yes"));
    }
}
