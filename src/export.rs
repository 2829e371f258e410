/*!
 * Export of report bundles
 *
 * JSON writes the whole bundle as one document; CSV writes one file per
 * report table into a directory, for direct spreadsheet consumption.
 */

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::pipeline::ReportBundle;
use crate::{ExportFormat, Result, VisitasError};

/// Trait for report bundle exporters
pub trait ReportExporter {
    /// Write the bundle to the given path
    fn export(&self, bundle: &ReportBundle, path: &Path) -> Result<()>;

    /// The export format this exporter produces
    fn format(&self) -> ExportFormat;
}

/// JSON exporter for report bundles
pub struct JsonExporter {
    /// Whether to pretty-print the JSON
    pub pretty_print: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self { pretty_print: true }
    }
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pretty printing
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Serialize a bundle to a JSON string
    pub fn to_string(&self, bundle: &ReportBundle) -> Result<String> {
        let json = if self.pretty_print {
            serde_json::to_string_pretty(bundle)?
        } else {
            serde_json::to_string(bundle)?
        };
        Ok(json)
    }
}

impl ReportExporter for JsonExporter {
    fn export(&self, bundle: &ReportBundle, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        if self.pretty_print {
            serde_json::to_writer_pretty(&mut writer, bundle)?;
        } else {
            serde_json::to_writer(&mut writer, bundle)?;
        }
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }
}

/// CSV exporter: one table per file inside the target directory
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        Self
    }

    fn write_categories(bundle: &ReportBundle, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["category", "count"])?;
        for row in &bundle.category_counts {
            writer.write_record([
                row.category.as_deref().unwrap_or("(sin categoría)"),
                &row.count.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_top_codes(bundle: &ReportBundle, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["code", "count", "description"])?;
        for row in &bundle.top_codes {
            writer.write_record([
                &row.code.to_string(),
                &row.count.to_string(),
                row.description.as_deref().unwrap_or(""),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_pivot(bundle: &ReportBundle, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["professional".to_string()];
        header.extend(bundle.pivot.months.iter().cloned());
        header.push("total".to_string());
        writer.write_record(&header)?;
        for row in &bundle.pivot.rows {
            let mut record = vec![row.professional.clone()];
            record.extend(row.counts.iter().map(|c| c.to_string()));
            record.push(row.total.to_string());
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_totals(bundle: &ReportBundle, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["professional", "visits"])?;
        for (professional, count) in &bundle.professional_totals {
            writer.write_record([professional.as_str(), &count.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_points(bundle: &ReportBundle, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["latitude", "longitude", "neighborhood"])?;
        for point in &bundle.geo_points {
            writer.write_record([
                &point.latitude.to_string(),
                &point.longitude.to_string(),
                point.neighborhood.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportExporter for CsvExporter {
    fn export(&self, bundle: &ReportBundle, path: &Path) -> Result<()> {
        if path.exists() && !path.is_dir() {
            return Err(VisitasError::Export {
                message: format!("'{}' exists and is not a directory", path.display()),
                format: ExportFormat::Csv,
            });
        }
        std::fs::create_dir_all(path)?;
        Self::write_categories(bundle, &path.join("category_counts.csv"))?;
        Self::write_top_codes(bundle, &path.join("top_codes.csv"))?;
        Self::write_pivot(bundle, &path.join("pivot.csv"))?;
        Self::write_totals(bundle, &path.join("professional_totals.csv"))?;
        Self::write_points(bundle, &path.join("geo_points.csv"))?;
        Ok(())
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::{CategoryCount, Diagnostics, TopCode, VisitPivot};

    fn bundle() -> ReportBundle {
        ReportBundle {
            category_counts: vec![
                CategoryCount { category: Some("Primary".to_string()), count: 2 },
                CategoryCount { category: None, count: 1 },
            ],
            top_codes: vec![TopCode {
                code: 1010,
                count: 2,
                description: Some("Agriculture".to_string()),
            }],
            pivot: VisitPivot::default(),
            professional_totals: vec![("Ana".to_string(), 2)],
            geo_points: Vec::new(),
            window: None,
            diagnostics: Diagnostics::default(),
        }
    }

    #[test]
    fn test_json_round_trips() {
        let exporter = JsonExporter::new().with_pretty_print(false);
        let json = exporter.to_string(&bundle()).unwrap();
        let parsed: ReportBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bundle());
    }

    #[test]
    fn test_csv_export_writes_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("reports");
        CsvExporter::new().export(&bundle(), &target).unwrap();
        for name in [
            "category_counts.csv",
            "top_codes.csv",
            "pivot.csv",
            "professional_totals.csv",
            "geo_points.csv",
        ] {
            assert!(target.join(name).exists(), "missing {name}");
        }
        let categories = std::fs::read_to_string(target.join("category_counts.csv")).unwrap();
        assert!(categories.contains("Primary,2"));
        assert!(categories.contains("(sin categoría),1"));
    }
}
