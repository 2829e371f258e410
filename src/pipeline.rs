/*!
 * Report pipeline orchestration
 *
 * A pipeline run takes the two immutable input datasets plus an optional
 * date window and returns an explicit result bundle. The classification
 * branch and the date/geo branch share the input records but are otherwise
 * independent, so with the `parallel` feature they run on separate threads.
 * Re-running with the same inputs is idempotent and deterministic.
 */

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analytics::{build_pivot, category_counts, professional_totals, top_codes};
use crate::classify::{classify_visits, reference_map};
use crate::constants::DEFAULT_TOP_CODES;
use crate::data_types::{
    CategoryCount, CiiuReference, DateWindow, Diagnostics, GeoPoint, TopCode, VisitPivot,
    VisitRecord,
};
use crate::dates::{dated_visits, filter_window};
use crate::geo::extract_points;
use crate::reader::VisitReader;
use crate::schema::{CiiuSchema, VisitSchema};
use crate::{Result, VisitasError};

/// Caller-tunable knobs for one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Inclusive date window; `None` means span all valid dates
    pub window: Option<DateWindow>,
    /// How many recurring codes to report
    pub top_codes: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { window: None, top_codes: DEFAULT_TOP_CODES }
    }
}

/// Everything one pipeline run produces for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBundle {
    pub category_counts: Vec<CategoryCount>,
    pub top_codes: Vec<TopCode>,
    pub pivot: VisitPivot,
    pub professional_totals: Vec<(String, usize)>,
    pub geo_points: Vec<GeoPoint>,
    /// The window actually applied, `None` when no record had a valid date
    pub window: Option<DateWindow>,
    pub diagnostics: Diagnostics,
}

/// Run the full pipeline over in-memory records.
///
/// Pure with respect to its arguments: nothing is mutated, the inputs can be
/// reused, and identical inputs yield identical bundles including ordering.
pub fn run_reports(
    records: &[VisitRecord],
    reference: &[CiiuReference],
    options: ReportOptions,
) -> ReportBundle {
    let reference = reference_map(reference);

    let classification_branch = || {
        let (classified, invalid_rows) = classify_visits(records, &reference);
        let counts = category_counts(&classified);
        let top = top_codes(&classified, options.top_codes);
        (counts, top, invalid_rows)
    };

    let date_branch = || {
        let (dated, unparseable_date_rows) = dated_visits(records);
        let no_valid_dates = dated.is_empty();
        let window = options.window.or_else(|| DateWindow::spanning(&dated));
        let filtered = match window {
            Some(w) => filter_window(dated, &w),
            None => Vec::new(),
        };
        let empty_date_range = !no_valid_dates && filtered.is_empty();

        let pivot = build_pivot(&filtered);
        let totals = professional_totals(&filtered);
        let (points, invalid_coordinate_rows) = extract_points(&filtered);
        let no_valid_coordinates = points.is_empty();

        (
            pivot,
            totals,
            points,
            window,
            Diagnostics {
                unparseable_date_rows,
                no_valid_dates,
                empty_date_range,
                invalid_coordinate_rows,
                no_valid_coordinates,
                ..Default::default()
            },
        )
    };

    #[cfg(feature = "parallel")]
    let ((category_counts, top_codes, invalid_classification_rows), date_outputs) =
        rayon::join(classification_branch, date_branch);

    #[cfg(not(feature = "parallel"))]
    let ((category_counts, top_codes, invalid_classification_rows), date_outputs) =
        (classification_branch(), date_branch());

    let (pivot, professional_totals, geo_points, window, mut diagnostics) = date_outputs;
    diagnostics.invalid_classification_rows = invalid_classification_rows;

    ReportBundle {
        category_counts,
        top_codes,
        pivot,
        professional_totals,
        geo_points,
        window,
        diagnostics,
    }
}

/// The two loaded input datasets, ready for any number of pipeline runs
#[derive(Debug, Clone, PartialEq)]
pub struct ReportInputs {
    pub visits: Vec<VisitRecord>,
    pub reference: Vec<CiiuReference>,
}

impl ReportInputs {
    /// Load both datasets with default schemas
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(visits: P, reference: Q) -> Result<Self> {
        ReportInputsBuilder::new().visits(visits).reference(reference).load()
    }

    /// Run the pipeline over the loaded inputs
    pub fn reports(&self, options: ReportOptions) -> ReportBundle {
        run_reports(&self.visits, &self.reference, options)
    }
}

/// Builder for loading a complete set of report inputs
///
/// # Example
/// ```no_run
/// # use visitas::pipeline::ReportInputsBuilder;
/// let inputs = ReportInputsBuilder::new()
///     .visits("data/visitas.csv")
///     .reference("data/ciiu.csv")
///     .load()?;
/// # Ok::<(), visitas::VisitasError>(())
/// ```
pub struct ReportInputsBuilder {
    visits_path: Option<PathBuf>,
    reference_path: Option<PathBuf>,
    visit_schema: VisitSchema,
    ciiu_schema: CiiuSchema,
    #[cfg(feature = "progress")]
    show_progress: bool,
}

impl Default for ReportInputsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportInputsBuilder {
    pub fn new() -> Self {
        Self {
            visits_path: None,
            reference_path: None,
            visit_schema: VisitSchema::default(),
            ciiu_schema: CiiuSchema::default(),
            #[cfg(feature = "progress")]
            show_progress: true,
        }
    }

    /// Set the path to the primary visit dataset
    pub fn visits<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.visits_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the path to the CIIU reference dataset
    pub fn reference<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.reference_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Override the visit dataset column names
    pub fn visit_schema(mut self, schema: VisitSchema) -> Self {
        self.visit_schema = schema;
        self
    }

    /// Override the reference dataset column names
    pub fn ciiu_schema(mut self, schema: CiiuSchema) -> Self {
        self.ciiu_schema = schema;
        self
    }

    #[cfg(feature = "progress")]
    /// Enable or disable the progress bar on the visit load
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Load both datasets, failing before any partial output on structural
    /// problems such as a missing required column
    pub fn load(self) -> Result<ReportInputs> {
        let visits_path = self.visits_path.ok_or_else(|| VisitasError::Custom {
            message: "visit dataset path not specified".to_string(),
            suggestion: Some("Use .visits() to specify the primary dataset file".to_string()),
        })?;
        let reference_path = self.reference_path.ok_or_else(|| VisitasError::Custom {
            message: "reference dataset path not specified".to_string(),
            suggestion: Some("Use .reference() to specify the CIIU reference file".to_string()),
        })?;

        let reader = VisitReader::new()
            .with_visit_schema(self.visit_schema)
            .with_ciiu_schema(self.ciiu_schema);
        #[cfg(feature = "progress")]
        let reader = reader.with_progress_bar(self.show_progress);

        let visits = reader.load_visits(&visits_path)?;
        let reference = reader.load_reference(&reference_path)?;
        Ok(ReportInputs { visits, reference })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(
        classification: Option<&str>,
        visit_date: Option<&str>,
        professional: &str,
        georeference: Option<&str>,
    ) -> VisitRecord {
        VisitRecord {
            raw_classification: classification.map(|s| s.to_string()),
            visit_date: visit_date.map(|s| s.to_string()),
            professional: professional.to_string(),
            georeference: georeference.map(|s| s.to_string()),
            neighborhood: "Centro".to_string(),
        }
    }

    fn reference() -> Vec<CiiuReference> {
        vec![
            CiiuReference { code: Some(1010), category: "Primary".to_string() },
            CiiuReference { code: Some(2020), category: "Secondary".to_string() },
        ]
    }

    #[test]
    fn test_end_to_end_category_counts_and_diagnostics() {
        let records = vec![
            record(Some("1010 - Agriculture"), Some("2024-01-05"), "Ana", None),
            record(Some("2020 - Mining"), Some("2024-01-06"), "Ana", None),
            record(Some("no-separator-text"), Some("2024-01-07"), "Luis", None),
        ];
        let bundle = run_reports(&records, &reference(), ReportOptions::default());

        let total: usize = bundle.category_counts.iter().map(|c| c.count).sum();
        assert_eq!(total, 3);
        let count_of = |cat: Option<&str>| {
            bundle
                .category_counts
                .iter()
                .find(|c| c.category.as_deref() == cat)
                .map(|c| c.count)
        };
        assert_eq!(count_of(Some("Primary")), Some(1));
        assert_eq!(count_of(Some("Secondary")), Some(1));
        assert_eq!(count_of(None), Some(1));
        assert_eq!(bundle.diagnostics.invalid_classification_rows, 1);
    }

    #[test]
    fn test_window_scopes_pivot_but_not_classification() {
        let records = vec![
            record(Some("1010 - Agriculture"), Some("2024-01-05"), "Ana", None),
            record(Some("2020 - Mining"), Some("2024-02-10"), "Ana", None),
        ];
        let january = DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        let options = ReportOptions { window: Some(january), ..Default::default() };
        let bundle = run_reports(&records, &reference(), options);

        assert_eq!(bundle.pivot.count("Ana", "2024-01"), 1);
        assert_eq!(bundle.pivot.total_visits(), 1);
        assert_eq!(bundle.professional_totals, vec![("Ana".to_string(), 1)]);
        // Classification aggregates cover the full input set
        let total: usize = bundle.category_counts.iter().map(|c| c.count).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_default_window_spans_valid_dates() {
        let records = vec![
            record(None, Some("2024-01-05"), "Ana", None),
            record(None, Some("2024-03-20"), "Luis", None),
        ];
        let bundle = run_reports(&records, &[], ReportOptions::default());
        let window = bundle.window.unwrap();
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        assert_eq!(bundle.pivot.total_visits(), 2);
    }

    #[test]
    fn test_no_valid_dates_flagged_without_failing_classification() {
        let records = vec![record(Some("1010 - Agriculture"), Some("pendiente"), "Ana", None)];
        let bundle = run_reports(&records, &reference(), ReportOptions::default());
        assert!(bundle.diagnostics.no_valid_dates);
        assert!(!bundle.diagnostics.empty_date_range);
        assert_eq!(bundle.window, None);
        assert!(bundle.pivot.rows.is_empty());
        // The classification pipeline is unaffected
        assert_eq!(bundle.category_counts.len(), 1);
    }

    #[test]
    fn test_empty_range_distinct_from_no_valid_dates() {
        let records = vec![record(None, Some("2024-03-15"), "Ana", None)];
        let april = DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
        );
        let options = ReportOptions { window: Some(april), ..Default::default() };
        let bundle = run_reports(&records, &[], options);
        assert!(!bundle.diagnostics.no_valid_dates);
        assert!(bundle.diagnostics.empty_date_range);
        assert!(bundle.pivot.rows.is_empty());
    }

    #[test]
    fn test_geo_points_and_coordinate_diagnostics() {
        let records = vec![
            record(None, Some("2024-01-05"), "Ana", Some(r#"{"lat": 4.6, "lng": -74.1}"#)),
            record(None, Some("2024-01-06"), "Ana", Some(r#"{"lat": 4.6}"#)),
        ];
        let bundle = run_reports(&records, &[], ReportOptions::default());
        assert_eq!(bundle.geo_points.len(), 1);
        assert_eq!(bundle.diagnostics.invalid_coordinate_rows, 1);
        assert!(!bundle.diagnostics.no_valid_coordinates);
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let records = vec![
            record(Some("1010 - Agriculture"), Some("2024-01-05"), "Ana", None),
            record(Some("no-separator"), Some("2024-02-10"), "Luis", None),
        ];
        let first = run_reports(&records, &reference(), ReportOptions::default());
        let second = run_reports(&records, &reference(), ReportOptions::default());
        assert_eq!(first, second);
    }
}
