/*!
 * End-to-end test for the visitas pipeline
 *
 * Writes the two CSV datasets to a temporary directory, loads them through
 * the reader, runs the full report pipeline, and checks the aggregate
 * invariants on the result bundle. Mirrors what the interactive upload flow
 * does, minus the presentation layer.
 */

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use visitas::prelude::*;

struct Fixture {
    _dir: TempDir,
    visits: PathBuf,
    reference: PathBuf,
}

fn write_fixture(visits_csv: &str, reference_csv: &str) -> Fixture {
    let dir = TempDir::new().expect("temp dir");
    let visits = dir.path().join("visitas.csv");
    let reference = dir.path().join("ciiu.csv");
    fs::write(&visits, visits_csv).expect("write visits");
    fs::write(&reference, reference_csv).expect("write reference");
    Fixture { _dir: dir, visits, reference }
}

const REFERENCE_CSV: &str = "\
CIIU 4,TIPO
1010,Primary
2020,Secondary
";

const VISITS_CSV: &str = "\
Códigos CIIU,Fecha Visita,Profesional,Georreferenciación,Barrio
1010 - Agriculture,2024-01-05,Ana,\"{\"\"lat\"\": 4.6, \"\"lng\"\": -74.1}\",Chapinero
2020 - Mining,2024-02-10,Ana,\"{\"\"lat\"\": 4.7}\",Suba
no-separator-text,2024-02-12,Luis,,Usaquén
1010 - Agriculture,sin fecha,Luis,\"{\"\"lat\"\": 4.5, \"\"lng\"\": -74.2}\",Bosa
";

fn load(fixture: &Fixture) -> ReportInputs {
    let builder = ReportInputsBuilder::new()
        .visits(&fixture.visits)
        .reference(&fixture.reference);
    #[cfg(feature = "progress")]
    let builder = builder.show_progress(false);
    builder.load().expect("load inputs")
}

#[test]
fn full_pipeline_over_csv_fixtures() {
    let fixture = write_fixture(VISITS_CSV, REFERENCE_CSV);
    let inputs = load(&fixture);
    assert_eq!(inputs.visits.len(), 4);
    assert_eq!(inputs.reference.len(), 2);

    let bundle = inputs.reports(ReportOptions::default());

    // Left join preserves every row: the category counts sum to the input size
    let total: usize = bundle.category_counts.iter().map(|c| c.count).sum();
    assert_eq!(total, 4);
    let count_of = |cat: Option<&str>| {
        bundle
            .category_counts
            .iter()
            .find(|c| c.category.as_deref() == cat)
            .map(|c| c.count)
    };
    assert_eq!(count_of(Some("Primary")), Some(2));
    assert_eq!(count_of(Some("Secondary")), Some(1));
    assert_eq!(count_of(None), Some(1));

    // Top codes exclude the invalid row
    assert_eq!(bundle.top_codes.len(), 2);
    assert_eq!(bundle.top_codes[0].code, 1010);
    assert_eq!(bundle.top_codes[0].count, 2);
    assert_eq!(bundle.top_codes[0].description.as_deref(), Some("Agriculture"));

    // Date-scoped reports only see the three dated rows
    assert_eq!(bundle.pivot.total_visits(), 3);
    assert_eq!(bundle.pivot.months, vec!["2024-01".to_string(), "2024-02".to_string()]);
    assert_eq!(bundle.pivot.count("Ana", "2024-01"), 1);
    assert_eq!(bundle.pivot.count("Ana", "2024-02"), 1);
    assert_eq!(bundle.pivot.count("Luis", "2024-02"), 1);

    // Only the row with complete coordinates maps; the dateless one is out of scope
    assert_eq!(bundle.geo_points.len(), 1);
    assert_eq!(bundle.geo_points[0].neighborhood, "Chapinero");

    assert_eq!(bundle.diagnostics.invalid_classification_rows, 1);
    assert_eq!(bundle.diagnostics.unparseable_date_rows, 1);
    assert_eq!(bundle.diagnostics.invalid_coordinate_rows, 2);
    assert!(!bundle.diagnostics.no_valid_dates);
    assert!(!bundle.diagnostics.no_valid_coordinates);
}

#[test]
fn january_window_scopes_the_pivot() {
    let fixture = write_fixture(VISITS_CSV, REFERENCE_CSV);
    let inputs = load(&fixture);

    let january = DateWindow::new(
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    );
    let bundle = inputs.reports(ReportOptions { window: Some(january), ..Default::default() });

    assert_eq!(bundle.pivot.total_visits(), 1);
    assert_eq!(bundle.pivot.count("Ana", "2024-01"), 1);
    assert_eq!(bundle.professional_totals, vec![("Ana".to_string(), 1)]);
    assert!(!bundle.diagnostics.empty_date_range);
}

#[test]
fn missing_required_column_is_terminal() {
    let fixture = write_fixture(
        "Fecha Visita,Profesional,Barrio\n2024-01-05,Ana,Centro\n",
        REFERENCE_CSV,
    );
    let builder = ReportInputsBuilder::new()
        .visits(&fixture.visits)
        .reference(&fixture.reference);
    #[cfg(feature = "progress")]
    let builder = builder.show_progress(false);
    let err = builder.load().expect_err("should fail on missing column");
    match err {
        VisitasError::MissingRequiredColumn { column, dataset, .. } => {
            assert_eq!(column, "Códigos CIIU");
            assert_eq!(dataset, "visit");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn bundle_exports_to_json_and_csv() {
    let fixture = write_fixture(VISITS_CSV, REFERENCE_CSV);
    let bundle = load(&fixture).reports(ReportOptions::default());

    let out = TempDir::new().expect("temp dir");
    let json_path = out.path().join("bundle.json");
    JsonExporter::new().export(&bundle, &json_path).expect("json export");
    let reloaded: ReportBundle =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).expect("parse exported json");
    assert_eq!(reloaded, bundle);

    let csv_dir = out.path().join("tables");
    CsvExporter::new().export(&bundle, &csv_dir).expect("csv export");
    let pivot_csv = fs::read_to_string(csv_dir.join("pivot.csv")).unwrap();
    assert!(pivot_csv.starts_with("professional,2024-01,2024-02,total"));
}

#[test]
fn empty_visit_dataset_yields_empty_bundle() {
    let fixture = write_fixture(
        "Códigos CIIU,Fecha Visita,Profesional,Georreferenciación,Barrio\n",
        REFERENCE_CSV,
    );
    let bundle = load(&fixture).reports(ReportOptions::default());
    assert!(bundle.category_counts.is_empty());
    assert!(bundle.top_codes.is_empty());
    assert!(bundle.pivot.rows.is_empty());
    assert!(bundle.geo_points.is_empty());
    assert!(bundle.diagnostics.no_valid_dates);
    assert_eq!(bundle.window, None);
}
