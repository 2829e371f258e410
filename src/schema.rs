/*!
 * Column schemas for the two input datasets
 *
 * Unlike positional formats, the uploaded spreadsheets carry named columns in
 * no guaranteed order, so each schema resolves its columns against the header
 * row once per file. A required column that cannot be found is terminal for
 * the whole run.
 */

use serde::{Deserialize, Serialize};

use crate::{Result, VisitasError};

/// Column names for the primary visit dataset
///
/// Defaults match the original field-visit workbook; override them when an
/// upload uses different headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitSchema {
    pub classification: String,
    pub visit_date: String,
    pub professional: String,
    pub georeference: String,
    pub neighborhood: String,
}

impl Default for VisitSchema {
    fn default() -> Self {
        Self {
            classification: "Códigos CIIU".to_string(),
            visit_date: "Fecha Visita".to_string(),
            professional: "Profesional".to_string(),
            georeference: "Georreferenciación".to_string(),
            neighborhood: "Barrio".to_string(),
        }
    }
}

/// Column names for the CIIU reference dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiiuSchema {
    pub code: String,
    pub category: String,
}

impl Default for CiiuSchema {
    fn default() -> Self {
        Self {
            code: "CIIU 4".to_string(),
            category: "TIPO".to_string(),
        }
    }
}

/// Column indices of the visit dataset, resolved against one header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitColumns {
    pub classification: usize,
    pub visit_date: usize,
    pub professional: usize,
    pub georeference: usize,
    pub neighborhood: usize,
}

/// Column indices of the reference dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CiiuColumns {
    pub code: usize,
    pub category: usize,
}

fn find_column(headers: &[String], name: &str, dataset: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| VisitasError::missing_column(name, dataset, headers))
}

impl VisitSchema {
    /// Resolve every required column or fail with the first missing one
    pub fn resolve(&self, headers: &[String]) -> Result<VisitColumns> {
        Ok(VisitColumns {
            classification: find_column(headers, &self.classification, "visit")?,
            visit_date: find_column(headers, &self.visit_date, "visit")?,
            professional: find_column(headers, &self.professional, "visit")?,
            georeference: find_column(headers, &self.georeference, "visit")?,
            neighborhood: find_column(headers, &self.neighborhood, "visit")?,
        })
    }
}

impl CiiuSchema {
    /// Resolve both required columns or fail with the first missing one
    pub fn resolve(&self, headers: &[String]) -> Result<CiiuColumns> {
        Ok(CiiuColumns {
            code: find_column(headers, &self.code, "reference")?,
            category: find_column(headers, &self.category, "reference")?,
        })
    }
}
