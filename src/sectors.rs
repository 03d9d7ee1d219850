//! TESS sector observation calendar and lookup functions

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::types::SectorWindow;

/// Year 1 sectors as (number, start, end)
const BUILTIN_SECTORS: &[(u32, &str, &str)] = &[
    (1, "2018-07-25", "2018-08-22"),
    (2, "2018-08-23", "2018-09-20"),
    (3, "2018-09-20", "2018-10-17"),
    (4, "2018-10-19", "2018-11-14"),
    (5, "2018-11-15", "2018-12-11"),
    (6, "2018-12-12", "2019-01-06"),
    (7, "2019-01-08", "2019-02-01"),
    (8, "2019-02-02", "2019-02-27"),
    (9, "2019-02-28", "2019-03-25"),
];

/// Sector entry as written in a calendar file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SectorEntry {
    start: String,
    end: String,
}

/// Observation windows keyed by sector number
#[derive(Debug, Clone, Default)]
pub struct SectorCalendar {
    windows: BTreeMap<u32, SectorWindow>,
}

impl SectorCalendar {
    /// The calendar compiled into the binary
    pub fn builtin() -> Self {
        let windows = BUILTIN_SECTORS
            .iter()
            .filter_map(|(sector, start, end)| {
                let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").ok()?;
                let end = NaiveDate::parse_from_str(end, "%Y-%m-%d").ok()?;
                Some((*sector, SectorWindow { start, end }))
            })
            .collect();
        Self { windows }
    }

    /// Load a calendar from a CONL file of the form
    ///
    /// ```text
    /// 1
    ///   start = 2018-07-25
    ///   end = 2018-08-22
    /// ```
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read sector file: {}", path.display()))?;
        Self::from_conl(&content)
            .with_context(|| format!("Failed to parse sector file: {}", path.display()))
    }

    fn from_conl(content: &str) -> Result<Self> {
        let entries: BTreeMap<String, SectorEntry> = serde_conl::from_str(content)?;

        let mut windows = BTreeMap::new();
        for (key, entry) in entries {
            let sector: u32 = key
                .trim()
                .parse()
                .with_context(|| format!("Invalid sector number: '{}'", key))?;
            let start = NaiveDate::parse_from_str(entry.start.trim(), "%Y-%m-%d")
                .with_context(|| format!("Invalid start date for sector {}", sector))?;
            let end = NaiveDate::parse_from_str(entry.end.trim(), "%Y-%m-%d")
                .with_context(|| format!("Invalid end date for sector {}", sector))?;
            if end < start {
                bail!("Sector {} ends ({}) before it starts ({})", sector, end, start);
            }
            windows.insert(sector, SectorWindow { start, end });
        }

        Ok(Self { windows })
    }

    /// Observation window for a sector, if known
    pub fn window(&self, sector: u32) -> Option<&SectorWindow> {
        self.windows.get(&sector)
    }

    /// Sectors whose window contains the given date
    pub fn sectors_on_date(&self, date: NaiveDate) -> Vec<u32> {
        self.windows
            .iter()
            .filter(|(_, w)| w.start <= date && date <= w.end)
            .map(|(sector, _)| *sector)
            .collect()
    }

    /// All windows, ordered by sector number
    pub fn iter(&self) -> impl Iterator<Item = (u32, &SectorWindow)> {
        self.windows.iter().map(|(sector, w)| (*sector, w))
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_builtin_calendar() {
        let calendar = SectorCalendar::builtin();
        assert_eq!(calendar.len(), 9);

        let first = calendar.window(1).unwrap();
        assert_eq!(first.start, date(2018, 7, 25));
        assert_eq!(first.end, date(2018, 8, 22));

        let ninth = calendar.window(9).unwrap();
        assert_eq!(ninth.end, date(2019, 3, 25));

        assert!(calendar.window(10).is_none());
        assert!(calendar.window(0).is_none());
    }

    #[test]
    fn test_sectors_on_date() {
        let calendar = SectorCalendar::builtin();
        // Sectors 2 and 3 share their boundary day
        assert_eq!(calendar.sectors_on_date(date(2018, 9, 20)), vec![2, 3]);
        // Gap between sectors 3 and 4
        assert!(calendar.sectors_on_date(date(2018, 10, 18)).is_empty());
        assert_eq!(calendar.sectors_on_date(date(2019, 1, 1)), vec![6]);
    }

    #[test]
    fn test_load_calendar_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "1\n  start = 2018-07-25\n  end = 2018-08-22\n14\n  start = 2019-07-18\n  end = 2019-08-15\n"
        )
        .unwrap();

        let calendar = SectorCalendar::load_from_path(file.path()).unwrap();
        assert_eq!(calendar.len(), 2);
        assert_eq!(calendar.window(14).unwrap().start, date(2019, 7, 18));
        let sectors: Vec<u32> = calendar.iter().map(|(s, _)| s).collect();
        assert_eq!(sectors, vec![1, 14]);
    }

    #[test]
    fn test_shipped_calendar_matches_builtin() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sectors.conl");
        let shipped = SectorCalendar::load_from_path(&path).unwrap();
        let builtin = SectorCalendar::builtin();
        assert_eq!(shipped.len(), builtin.len());
        for (sector, window) in builtin.iter() {
            assert_eq!(shipped.window(sector), Some(window));
        }
    }

    #[test]
    fn test_reject_reversed_window() {
        let err = SectorCalendar::from_conl("3\n  start = 2018-10-17\n  end = 2018-09-20\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(SectorCalendar::load_from_path(Path::new("does/not/exist.conl")).is_err());
    }
}
