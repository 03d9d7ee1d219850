use chrono::NaiveDate;

use crate::sectors::SectorCalendar;
use crate::types::{SectorHit, SectorMatch};

/// Pair every candidate sector with its window and the burst's day offsets.
///
/// Offsets are `burst - start` and `burst - end`, so a burst inside the
/// window has a non-negative start offset and a non-positive end offset.
pub fn correlate(
    burst_date: Option<NaiveDate>,
    hits: Vec<SectorHit>,
    calendar: &SectorCalendar,
) -> Vec<SectorMatch> {
    hits.into_iter()
        .map(|hit| {
            let window = hit.sector_number().and_then(|s| calendar.window(s)).copied();
            let (start_offset, end_offset) = match (burst_date, window) {
                (Some(date), Some(w)) => (
                    Some((date - w.start).num_days()),
                    Some((date - w.end).num_days()),
                ),
                _ => (None, None),
            };
            SectorMatch {
                hit,
                window,
                start_offset,
                end_offset,
            }
        })
        .collect()
}
