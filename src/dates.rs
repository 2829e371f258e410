/*!
 * Tolerant visit-date parsing and range filtering
 *
 * Visit dates arrive as free text from spreadsheets and show up in several
 * shapes, sometimes with a time component. Unparseable values are excluded
 * from date-scoped reports rather than failing the batch; callers distinguish
 * "no valid dates at all" from "valid dates but empty range".
 */

use chrono::{NaiveDate, NaiveDateTime};

use crate::data_types::{DateWindow, DatedVisit, VisitRecord};

/// Date-only shapes accepted by the tolerant parser
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

/// Datetime shapes; the time component is truncated away
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse a raw visit date, truncated to calendar-date granularity.
///
/// Returns `None` for anything unparseable; per-row date failures are a
/// diagnostic condition, never an error.
pub fn parse_visit_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }
    None
}

/// Pair each record with its parsed date, dropping those without one.
///
/// Returns the dated records plus the unparseable/absent count.
pub fn dated_visits(records: &[VisitRecord]) -> (Vec<DatedVisit<'_>>, usize) {
    let mut unparseable = 0;
    let dated = records
        .iter()
        .filter_map(|record| {
            match record.visit_date.as_deref().and_then(parse_visit_date) {
                Some(date) => Some(DatedVisit { record, date }),
                None => {
                    unparseable += 1;
                    None
                }
            }
        })
        .collect();
    (dated, unparseable)
}

/// Keep the visits whose date falls inside the inclusive window
pub fn filter_window<'a>(visits: Vec<DatedVisit<'a>>, window: &DateWindow) -> Vec<DatedVisit<'a>> {
    visits
        .into_iter()
        .filter(|v| window.contains(v.date))
        .collect()
}
