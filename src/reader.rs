/*!
 * CSV ingestion for the visit and reference datasets
 *
 * Turns uploaded tabular data into typed records. Columns are resolved by
 * name against the header row, so column order in the upload does not
 * matter. Structural problems (unreadable file, missing required column)
 * are terminal; everything row-level flows through as absent values for the
 * pipeline to classify.
 */

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use csv::ReaderBuilder;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::data_types::{CiiuReference, VisitRecord};
use crate::schema::{CiiuSchema, VisitSchema};
use crate::{Result, VisitasError};

/// CSV reader for both input datasets
pub struct VisitReader {
    visit_schema: VisitSchema,
    ciiu_schema: CiiuSchema,
    #[cfg(feature = "progress")]
    show_progress_bar: bool,
}

impl Default for VisitReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VisitReader {
    /// Create a reader with the default column schemas
    pub fn new() -> Self {
        Self {
            visit_schema: VisitSchema::default(),
            ciiu_schema: CiiuSchema::default(),
            #[cfg(feature = "progress")]
            show_progress_bar: true,
        }
    }

    /// Override the visit dataset column names
    pub fn with_visit_schema(mut self, schema: VisitSchema) -> Self {
        self.visit_schema = schema;
        self
    }

    /// Override the reference dataset column names
    pub fn with_ciiu_schema(mut self, schema: CiiuSchema) -> Self {
        self.ciiu_schema = schema;
        self
    }

    #[cfg(feature = "progress")]
    /// Enable or disable the progress bar
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress_bar = show;
        self
    }

    /// Load the primary visit dataset
    pub fn load_visits<P: AsRef<Path>>(&self, path: P) -> Result<Vec<VisitRecord>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| VisitasError::Io {
            message: format!("cannot open '{}': {}", path.display(), e),
            source: e,
            path: Some(path.to_path_buf()),
        })?;
        let file_size = file.metadata().map(|m| m.len()).unwrap_or(0);

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        let columns = self.visit_schema.resolve(&headers)?;

        #[cfg(feature = "progress")]
        let progress_bar = if self.show_progress_bar {
            let pb = ProgressBar::new(file_size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };
        #[cfg(not(feature = "progress"))]
        let _ = file_size;

        let mut records = Vec::new();
        let start_time = Instant::now();

        for (idx, result) in reader.records().enumerate() {
            let csv_record = result.map_err(|e| VisitasError::CsvParse {
                message: e.to_string(),
                line: Some(idx + 2), // +2 for header and 0-based index
                path: Some(path.to_path_buf()),
            })?;

            let get_field = |index: usize| -> Option<String> {
                csv_record
                    .get(index)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
            };

            records.push(VisitRecord {
                raw_classification: get_field(columns.classification),
                visit_date: get_field(columns.visit_date),
                professional: get_field(columns.professional).unwrap_or_default(),
                georeference: get_field(columns.georeference),
                neighborhood: get_field(columns.neighborhood).unwrap_or_default(),
            });

            #[cfg(feature = "progress")]
            if let Some(ref pb) = progress_bar {
                pb.set_position(csv_record.position().map(|p| p.byte()).unwrap_or(0));
            }
        }

        #[cfg(feature = "progress")]
        if let Some(pb) = progress_bar {
            pb.finish_and_clear();
        }

        #[cfg(feature = "progress")]
        if self.show_progress_bar {
            eprintln!(
                "Loaded {} visit records in {:.2}s",
                records.len(),
                start_time.elapsed().as_secs_f64()
            );
        }
        #[cfg(not(feature = "progress"))]
        let _ = start_time;

        Ok(records)
    }

    /// Load the CIIU reference dataset.
    ///
    /// Codes that fail numeric parsing are kept with an absent code; they can
    /// never match a visit, which mirrors how absent visit codes behave.
    pub fn load_reference<P: AsRef<Path>>(&self, path: P) -> Result<Vec<CiiuReference>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| VisitasError::Io {
            message: format!("cannot open '{}': {}", path.display(), e),
            source: e,
            path: Some(path.to_path_buf()),
        })?;

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        let columns = self.ciiu_schema.resolve(&headers)?;

        let mut records = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let csv_record = result.map_err(|e| VisitasError::CsvParse {
                message: e.to_string(),
                line: Some(idx + 2),
                path: Some(path.to_path_buf()),
            })?;

            let code = csv_record
                .get(columns.code)
                .map(str::trim)
                .and_then(|s| s.parse::<u32>().ok());
            let category = csv_record
                .get(columns.category)
                .map(str::trim)
                .unwrap_or_default()
                .to_string();
            records.push(CiiuReference { code, category });
        }

        Ok(records)
    }
}
