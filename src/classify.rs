/*!
 * Classification parsing and reference join
 *
 * The composite "code - description" text is split into a numeric CIIU code
 * and a description, then each code is resolved against the reference table.
 * Malformed rows are never dropped: they keep an absent code through the join
 * so downstream reports preserve total row counts.
 */

use std::collections::HashMap;

use crate::constants::CLASSIFICATION_SEPARATOR;
use crate::data_types::{CiiuReference, ClassifiedVisit, ParsedClassification, VisitRecord};

/// Split raw classification text into code and description.
///
/// Only the first `" - "` occurrence separates; descriptions may themselves
/// contain further hyphens. Absent text is treated as empty. A missing
/// separator or non-numeric code portion yields the invalid marker rather
/// than an error.
pub fn parse_classification(raw: Option<&str>) -> ParsedClassification {
    let raw = raw.unwrap_or("");
    let Some((code_part, description_part)) = raw.split_once(CLASSIFICATION_SEPARATOR) else {
        return ParsedClassification::invalid();
    };
    let Ok(code) = code_part.trim().parse::<u32>() else {
        return ParsedClassification::invalid();
    };
    ParsedClassification {
        code: Some(code),
        description: Some(description_part.trim().to_string()),
        valid: true,
    }
}

/// Build the code-to-category lookup from reference rows.
///
/// Codes need not be unique in the source; the first occurrence wins so the
/// join is stable. Rows without a numeric code can never match and are
/// skipped.
pub fn reference_map(entries: &[CiiuReference]) -> HashMap<u32, String> {
    let mut map = HashMap::with_capacity(entries.len());
    for entry in entries {
        if let Some(code) = entry.code {
            map.entry(code).or_insert_with(|| entry.category.clone());
        }
    }
    map
}

/// Parse and left-join every visit record against the reference map.
///
/// Every input record appears in the output regardless of match: an absent
/// or unresolved code simply carries an absent category. Returns the joined
/// rows together with the invalid-classification diagnostic count.
pub fn classify_visits(
    records: &[VisitRecord],
    reference: &HashMap<u32, String>,
) -> (Vec<ClassifiedVisit>, usize) {
    let mut invalid_rows = 0;
    let classified = records
        .iter()
        .map(|record| {
            let parsed = parse_classification(record.raw_classification.as_deref());
            if !parsed.valid {
                invalid_rows += 1;
            }
            let category = parsed.code.and_then(|code| reference.get(&code).cloned());
            ClassifiedVisit { parsed, category }
        })
        .collect();
    (classified, invalid_rows)
}
