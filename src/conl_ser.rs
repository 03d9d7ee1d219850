//! CONL serialization for correlated burst records
//!
//! Each record becomes a section keyed by its circular serial, with the GRB
//! identifier as a field and candidate sectors listed underneath. Several
//! circulars can report the same burst, so the identifier is not a key.

use crate::report::format_offset;
use crate::types::GrbRecord;

/// Trait for types that can be serialized to CONL
pub trait ToConl {
    fn to_conl(&self) -> String;
}

/// Escape a string value if needed for CONL
fn escape_value(s: &str) -> String {
    // Values that need quoting: start/end with space, contain = or ;, or newlines
    if s.is_empty()
        || s.starts_with(' ')
        || s.ends_with(' ')
        || s.starts_with('"')
        || s.contains(';')
        || s.contains('=')
        || s.contains('\n')
        || s.contains('\r')
    {
        let escaped = s
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t");
        format!("\"{}\"", escaped)
    } else {
        s.to_string()
    }
}

impl ToConl for GrbRecord {
    fn to_conl(&self) -> String {
        let mut lines = Vec::new();

        lines.push(self.circular.serial.to_string());
        lines.push(format!("  grb_id = {}", escape_value(&self.detail.grb_id)));
        lines.push(format!("  url = {}", escape_value(&self.circular.url)));
        lines.push(format!("  date = {}", escape_value(&self.detail.date_text)));
        if let Some(date) = self.detail.obs_date {
            lines.push(format!("  burst_date = {}", date.format("%Y-%m-%d")));
        }
        if let Some(position) = &self.detail.position {
            lines.push(format!("  ra = {}", position.ra_text));
            lines.push(format!("  dec = {}", position.dec_text));
        }

        if !self.matches.is_empty() {
            lines.push("  sectors".to_string());
            for m in &self.matches {
                lines.push("    =".to_string());
                lines.push(format!("      sector = {}", escape_value(&m.hit.sector)));
                lines.push(format!("      name = {}", escape_value(&m.hit.sector_name)));
                lines.push(format!("      camera = {}", escape_value(&m.hit.camera)));
                lines.push(format!("      ccd = {}", escape_value(&m.hit.ccd)));
                if let Some(w) = m.window {
                    lines.push(format!("      start = {}", w.start.format("%Y-%m-%d")));
                    lines.push(format!("      end = {}", w.end.format("%Y-%m-%d")));
                    lines.push(format!("      start_offset = {}", format_offset(m.start_offset)));
                    lines.push(format!("      end_offset = {}", format_offset(m.end_offset)));
                    lines.push(format!("      in_window = {}", m.contains_burst()));
                }
            }
        }

        lines.join("\n") + "\n"
    }
}

impl ToConl for [GrbRecord] {
    fn to_conl(&self) -> String {
        self.iter().map(|r| r.to_conl()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CircularDetail, Position, SectorHit, SectorMatch, SectorWindow, SwiftCircular};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("GRB 200101A"), "GRB 200101A");
        assert_eq!(escape_value(" leading"), "\" leading\"");
        assert_eq!(escape_value("has;semicolon"), "\"has;semicolon\"");
        assert_eq!(escape_value("has=equals"), "\"has=equals\"");
        assert_eq!(escape_value(""), "\"\"");
    }

    #[test]
    fn test_record_to_conl() {
        let record = GrbRecord {
            circular: SwiftCircular {
                serial: 23001,
                grb_id: "GRB 180728A".to_string(),
                description: "Swift detection of a burst".to_string(),
                url: "https://gcn.gsfc.nasa.gov/gcn3/23001.gcn3".to_string(),
            },
            detail: CircularDetail {
                grb_id: "GRB 180728A".to_string(),
                date_text: "18/07/28 17:50:00 GMT".to_string(),
                obs_date: NaiveDate::from_ymd_opt(2018, 7, 28),
                coords_text: Some("RA, Dec 253.556, -54.046".to_string()),
                position: Some(Position {
                    ra: 253.556,
                    dec: -54.046,
                    ra_text: "253.556".to_string(),
                    dec_text: "-54.046".to_string(),
                }),
            },
            matches: vec![SectorMatch {
                hit: SectorHit {
                    sector: "0001".to_string(),
                    sector_name: "tess-s0001-4-3".to_string(),
                    camera: "4".to_string(),
                    ccd: "3".to_string(),
                },
                window: Some(SectorWindow {
                    start: NaiveDate::from_ymd_opt(2018, 7, 25).unwrap(),
                    end: NaiveDate::from_ymd_opt(2018, 8, 22).unwrap(),
                }),
                start_offset: Some(3),
                end_offset: Some(-25),
            }],
        };

        let conl = record.to_conl();
        let expected = "23001
  grb_id = GRB 180728A
  url = https://gcn.gsfc.nasa.gov/gcn3/23001.gcn3
  date = 18/07/28 17:50:00 GMT
  burst_date = 2018-07-28
  ra = 253.556
  dec = -54.046
  sectors
    =
      sector = 0001
      name = tess-s0001-4-3
      camera = 4
      ccd = 3
      start = 2018-07-25
      end = 2018-08-22
      start_offset = +3 days
      end_offset = -25 days
      in_window = true
";
        assert_eq!(conl, expected);

        let both = [record.clone(), record].to_conl();
        assert_eq!(both.matches("grb_id = GRB 180728A").count(), 2);
    }

    #[test]
    fn test_same_burst_in_two_circulars() {
        let record = |serial: u32| GrbRecord {
            circular: SwiftCircular {
                serial,
                grb_id: "GRB 190114C".to_string(),
                description: "Swift detection of a burst".to_string(),
                url: format!("https://gcn.gsfc.nasa.gov/gcn3/{}.gcn3", serial),
            },
            detail: CircularDetail {
                grb_id: "GRB 190114C".to_string(),
                date_text: "19/01/14 21:05:00 GMT".to_string(),
                obs_date: NaiveDate::from_ymd_opt(2019, 1, 14),
                coords_text: None,
                position: None,
            },
            matches: Vec::new(),
        };

        let conl = [record(23688), record(23691)].to_conl();
        let parsed: BTreeMap<String, BTreeMap<String, String>> =
            serde_conl::from_str(&conl).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["23688"]["grb_id"], "GRB 190114C");
        assert_eq!(parsed["23691"]["grb_id"], "GRB 190114C");
        assert_eq!(
            parsed["23691"]["url"],
            "https://gcn.gsfc.nasa.gov/gcn3/23691.gcn3"
        );
    }
}
