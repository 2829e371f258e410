/*!
 * Data type definitions for visit records and derived aggregates
 *
 * All values here are produced and consumed within a single pipeline run.
 * Records are immutable once built; every transformation produces a new
 * derived value rather than mutating in place.
 */

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One row of the primary visit dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    /// Composite "code - description" classification text, as uploaded
    pub raw_classification: Option<String>,
    /// Visit date as raw text, parsed later with a tolerant parser
    pub visit_date: Option<String>,
    pub professional: String,
    /// Structured text encoding `{"lat": .., "lng": ..}`
    pub georeference: Option<String>,
    pub neighborhood: String,
}

/// One row of the CIIU reference dataset
///
/// Codes need not be unique; when building the lookup map the first
/// occurrence per code wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CiiuReference {
    pub code: Option<u32>,
    pub category: String,
}

/// Classification text split into structured code and description
///
/// `valid` is true iff the raw text contained the `" - "` separator and the
/// code portion parsed as a decimal number; when false both fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedClassification {
    pub code: Option<u32>,
    pub description: Option<String>,
    pub valid: bool,
}

impl ParsedClassification {
    /// The invalid marker: no code, no description
    pub fn invalid() -> Self {
        Self { code: None, description: None, valid: false }
    }
}

/// Left-join result: one per input record, category absent on a join miss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedVisit {
    pub parsed: ParsedClassification,
    pub category: Option<String>,
}

/// Count of records per category, including the unmatched (`None`) bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Option<String>,
    pub count: usize,
}

/// One of the most frequent valid classification codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopCode {
    pub code: u32,
    pub count: usize,
    /// First non-absent description seen for this code
    pub description: Option<String>,
}

/// A visit record paired with its successfully parsed calendar date
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedVisit<'a> {
    pub record: &'a VisitRecord,
    pub date: NaiveDate,
}

/// Inclusive calendar-date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Both bounds are inclusive
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// The `[min, max]` window over the valid dates, or `None` when there
    /// are none at all (the no-analysis-possible condition)
    pub fn spanning(visits: &[DatedVisit<'_>]) -> Option<Self> {
        let start = visits.iter().map(|v| v.date).min()?;
        let end = visits.iter().map(|v| v.date).max()?;
        Some(Self { start, end })
    }
}

/// Format a date as a `YYYY-MM` month bucket key
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Dense professional-by-month count matrix
///
/// Months are the observed buckets in ascending order; rows are ordered by
/// row total descending, ties by first appearance in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VisitPivot {
    pub months: Vec<String>,
    pub rows: Vec<PivotRow>,
}

/// One professional's counts across the observed months
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotRow {
    pub professional: String,
    /// Parallel to `VisitPivot::months`; absent combinations are zero
    pub counts: Vec<usize>,
    pub total: usize,
}

impl VisitPivot {
    /// Sum over every cell of the matrix
    pub fn total_visits(&self) -> usize {
        self.rows.iter().map(|r| r.total).sum()
    }

    /// Look up a single cell by professional and month key
    pub fn count(&self, professional: &str, month: &str) -> usize {
        let col = match self.months.iter().position(|m| m == month) {
            Some(c) => c,
            None => return 0,
        };
        self.rows
            .iter()
            .find(|r| r.professional == professional)
            .map(|r| r.counts[col])
            .unwrap_or(0)
    }
}

/// A geolocated visit, ready for mapping
///
/// Latitude and longitude pass through unchanged; no bounds checking or
/// projection happens in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub neighborhood: String,
}

/// Per-run diagnostic counters and conditions for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Diagnostics {
    /// Rows whose classification text had no separator or a non-numeric code
    pub invalid_classification_rows: usize,
    /// Rows excluded from date-scoped reports
    pub unparseable_date_rows: usize,
    /// No record had a parseable date; date-scoped reports cannot be produced
    pub no_valid_dates: bool,
    /// Valid dates exist but the requested window matched nothing
    pub empty_date_range: bool,
    /// Rows excluded from the map point set
    pub invalid_coordinate_rows: usize,
    /// The filtered set produced no mappable point
    pub no_valid_coordinates: bool,
}
