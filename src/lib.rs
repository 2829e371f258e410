/*!
 * # Visitas — field visit aggregation over the CIIU classification
 *
 * A Rust library for normalizing field-professional visit records, joining
 * them against a CIIU industry-classification reference table, and building
 * the aggregate reports an operations analyst explores: category frequency,
 * top recurring codes, a professional-by-month pivot, and geolocated visit
 * points.
 *
 * ## Features
 *
 * - **Pure pipeline**: explicit immutable inputs in, explicit result bundle
 *   out; re-running with the same data is deterministic
 * - **Resilient rows**: malformed classification text, unparseable dates, and
 *   bad coordinates never abort a run; they become absent values plus
 *   diagnostic counters
 * - **Named-column ingestion**: CSV columns are resolved by header name, with
 *   a clear terminal error when a required column is missing
 * - **Parallel branches**: the classification and date/geo pipelines run on
 *   separate threads with the `parallel` feature
 * - **Multiple exports**: the whole bundle as JSON, or one CSV per table
 *
 * ## Quick Start
 *
 * ```no_run
 * use visitas::prelude::*;
 *
 * # fn main() -> Result<()> {
 * // Load the two uploaded datasets
 * let inputs = ReportInputs::load("data/visitas.csv", "data/ciiu.csv")?;
 *
 * // Run all reports over the full date span
 * let bundle = inputs.reports(ReportOptions::default());
 *
 * println!("{} categories, {} map points",
 *     bundle.category_counts.len(),
 *     bundle.geo_points.len());
 *
 * if bundle.diagnostics.invalid_classification_rows > 0 {
 *     eprintln!("{} rows had no usable CIIU code",
 *         bundle.diagnostics.invalid_classification_rows);
 * }
 * # Ok(())
 * # }
 * ```
 *
 * ## Filtering by date
 *
 * ```no_run
 * # use visitas::prelude::*;
 * # use chrono::NaiveDate;
 * # fn main() -> Result<()> {
 * # let inputs = ReportInputs::load("data/visitas.csv", "data/ciiu.csv")?;
 * let january = DateWindow::new(
 *     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
 *     NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
 * );
 * let bundle = inputs.reports(ReportOptions { window: Some(january), ..Default::default() });
 *
 * if bundle.diagnostics.no_valid_dates {
 *     eprintln!("no record carries a parseable visit date");
 * } else if bundle.diagnostics.empty_date_range {
 *     eprintln!("no visit falls inside the requested window");
 * }
 * # Ok(())
 * # }
 * ```
 *
 * ## In-memory use
 *
 * The pipeline itself never touches the filesystem: hand
 * [`pipeline::run_reports`] any `&[VisitRecord]` and `&[CiiuReference]`
 * produced elsewhere and it behaves identically.
 */

// Re-export error types from root
pub use error::{VisitasError, Result, ExportFormat};

// Public modules
pub mod analytics;
pub mod classify;
pub mod config;
pub mod data_types;
pub mod dates;
pub mod error;
pub mod export;
pub mod geo;
pub mod pipeline;
pub mod reader;
pub mod schema;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```
/// use visitas::prelude::*;
/// ```
pub mod prelude {
    pub use crate::data_types::*;
    pub use crate::error::{VisitasError, Result};
    pub use crate::pipeline::{ReportBundle, ReportInputs, ReportInputsBuilder, ReportOptions, run_reports};
    pub use crate::reader::VisitReader;
    pub use crate::schema::{CiiuSchema, VisitSchema};
    pub use crate::export::{ReportExporter, JsonExporter, CsvExporter};
    pub use crate::config::{ConfigBuilder, VisitasConfig};
    pub use crate::ExportFormat;
}

/// Pipeline constants
pub mod constants {
    /// Token separating code from description in the composite field.
    /// Only the first occurrence splits; descriptions may contain more.
    pub const CLASSIFICATION_SEPARATOR: &str = " - ";

    /// How many recurring codes the top-codes report keeps by default
    pub const DEFAULT_TOP_CODES: usize = 10;

    /// Month bucket key format used by the pivot
    pub const MONTH_KEY_FORMAT: &str = "YYYY-MM";
}

/// Common recipes and utility functions
pub mod cookbook {
    use crate::pipeline::ReportBundle;

    /// Share of total visits per category, as (category, fraction) pairs
    ///
    /// The absent category is labeled with `unmatched_label`.
    pub fn category_shares(bundle: &ReportBundle, unmatched_label: &str) -> Vec<(String, f64)> {
        let total: usize = bundle.category_counts.iter().map(|c| c.count).sum();
        if total == 0 {
            return Vec::new();
        }
        bundle
            .category_counts
            .iter()
            .map(|c| {
                let label = c.category.clone().unwrap_or_else(|| unmatched_label.to_string());
                (label, c.count as f64 / total as f64)
            })
            .collect()
    }

    /// The professional with the most visits in the filtered set, if any
    pub fn busiest_professional(bundle: &ReportBundle) -> Option<(&str, usize)> {
        bundle
            .professional_totals
            .first()
            .map(|(name, count)| (name.as_str(), *count))
    }
}

#[cfg(test)]
mod tests {
    use crate::classify::parse_classification;
    use crate::constants::CLASSIFICATION_SEPARATOR;

    #[test]
    fn test_separator_constant_matches_parser() {
        let text = format!("1010{}Agricultura", CLASSIFICATION_SEPARATOR);
        assert!(parse_classification(Some(&text)).valid);
    }

    #[test]
    fn test_hyphen_without_spaces_is_not_a_separator() {
        assert!(!parse_classification(Some("1010-Agricultura")).valid);
    }
}
