/*!
 * Aggregate reports over joined and date-filtered visits
 *
 * Frequency tables over the classification join, and the professional-by-month
 * pivot over the date-filtered set. Every aggregate is a pure function of its
 * input sequence: same input, same output, same ordering.
 */

use std::collections::HashMap;

use crate::data_types::{
    month_key, CategoryCount, ClassifiedVisit, DatedVisit, PivotRow, TopCode, VisitPivot,
};

/// Counter that preserves first-seen key order, so stable sorts break
/// count ties deterministically.
struct OrderedCounter<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, usize)>,
}

impl<K: std::hash::Hash + Eq + Clone> OrderedCounter<K> {
    fn new() -> Self {
        Self { index: HashMap::new(), entries: Vec::new() }
    }

    fn increment(&mut self, key: K) -> usize {
        let slot = *self.index.entry(key.clone()).or_insert_with(|| {
            self.entries.push((key, 0));
            self.entries.len() - 1
        });
        self.entries[slot].1 += 1;
        slot
    }

    fn into_entries(self) -> Vec<(K, usize)> {
        self.entries
    }
}

/// Count records per category, the absent category being its own bucket.
///
/// Ordered by count descending; ties keep the order categories were first
/// seen in the input. The counts always sum to the input length.
pub fn category_counts(visits: &[ClassifiedVisit]) -> Vec<CategoryCount> {
    let mut counter = OrderedCounter::new();
    for visit in visits {
        counter.increment(visit.category.clone());
    }
    let mut counts: Vec<CategoryCount> = counter
        .into_entries()
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// The `limit` most frequent valid classification codes.
///
/// Invalid rows never participate. Ties break by the order codes were first
/// encountered; the attached description is the first non-absent one seen
/// for that code.
pub fn top_codes(visits: &[ClassifiedVisit], limit: usize) -> Vec<TopCode> {
    let mut counter = OrderedCounter::new();
    let mut descriptions: Vec<Option<String>> = Vec::new();
    for visit in visits {
        let Some(code) = visit.parsed.code else { continue };
        let slot = counter.increment(code);
        if slot == descriptions.len() {
            descriptions.push(None);
        }
        if descriptions[slot].is_none() {
            descriptions[slot] = visit.parsed.description.clone();
        }
    }

    let mut codes: Vec<TopCode> = counter
        .into_entries()
        .into_iter()
        .zip(descriptions)
        .map(|((code, count), description)| TopCode { code, count, description })
        .collect();
    codes.sort_by(|a, b| b.count.cmp(&a.count));
    codes.truncate(limit);
    codes
}

/// Build the dense professional-by-month count matrix.
///
/// Months are the observed `YYYY-MM` buckets in ascending order; rows are
/// ordered by total descending, ties by first appearance. The sum over all
/// cells equals the number of filtered records.
pub fn build_pivot(visits: &[DatedVisit<'_>]) -> VisitPivot {
    let mut months: Vec<String> = Vec::new();
    let mut professionals = OrderedCounter::new();
    let mut cells: HashMap<(String, String), usize> = HashMap::new();

    for visit in visits {
        let month = month_key(visit.date);
        if !months.contains(&month) {
            months.push(month.clone());
        }
        professionals.increment(visit.record.professional.clone());
        *cells.entry((visit.record.professional.clone(), month)).or_insert(0) += 1;
    }
    months.sort();

    let mut rows: Vec<PivotRow> = professionals
        .into_entries()
        .into_iter()
        .map(|(professional, total)| {
            let counts = months
                .iter()
                .map(|month| {
                    cells
                        .get(&(professional.clone(), month.clone()))
                        .copied()
                        .unwrap_or(0)
                })
                .collect();
            PivotRow { professional, counts, total }
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total));

    VisitPivot { months, rows }
}

/// Total visits per professional over the filtered set, descending by count.
///
/// Independent of month bucketing; ties keep first-seen order.
pub fn professional_totals(visits: &[DatedVisit<'_>]) -> Vec<(String, usize)> {
    let mut counter = OrderedCounter::new();
    for visit in visits {
        counter.increment(visit.record.professional.clone());
    }
    let mut totals = counter.into_entries();
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals
}
