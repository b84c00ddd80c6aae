use serde::Serialize;
use std::cmp::Ordering;

/// Outcome of testing one annotation set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentRecord {
    pub annotation: String,
    pub odds_ratio: f64,
    pub p_value: f64,
    pub passes_correction: bool,
    /// Annotation members that are also targets.
    pub overlap: usize,
    pub annotation_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Largest odds ratio first; undefined ratios last.
    OddsRatio,
    /// Smallest p-value first.
    PValue,
}

fn by_p_value(a: &EnrichmentRecord, b: &EnrichmentRecord) -> Ordering {
    a.p_value
        .total_cmp(&b.p_value)
        .then_with(|| a.annotation.cmp(&b.annotation))
}

fn by_odds_ratio(a: &EnrichmentRecord, b: &EnrichmentRecord) -> Ordering {
    let key = |r: &EnrichmentRecord| {
        if r.odds_ratio.is_nan() { f64::NEG_INFINITY } else { r.odds_ratio }
    };
    key(b)
        .total_cmp(&key(a))
        .then_with(|| a.annotation.cmp(&b.annotation))
}

/// Ranked enrichment results, one record per tested annotation set.
///
/// A table is a value: it has no mutating methods, and every view
/// (`sorted_by`, `passing`, `top`) returns a new table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentTable {
    records: Vec<EnrichmentRecord>,
    correction: String,
    fdr: f64,
    universe_size: usize,
}

impl EnrichmentTable {
    /// Records are put in p-value order (ties by annotation name).
    pub(crate) fn new(
        mut records: Vec<EnrichmentRecord>,
        correction: impl Into<String>,
        fdr: f64,
        universe_size: usize,
    ) -> Self {
        records.sort_by(by_p_value);
        EnrichmentTable {
            records,
            correction: correction.into(),
            fdr,
            universe_size,
        }
    }

    pub fn records(&self) -> &[EnrichmentRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnrichmentRecord> {
        self.records.iter()
    }

    pub fn get(&self, annotation: &str) -> Option<&EnrichmentRecord> {
        self.records.iter().find(|r| r.annotation == annotation)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Name of the correction that produced the pass flags.
    pub fn correction(&self) -> &str {
        &self.correction
    }

    pub fn fdr(&self) -> f64 {
        self.fdr
    }

    pub fn universe_size(&self) -> usize {
        self.universe_size
    }

    pub fn sorted_by(&self, key: SortKey) -> EnrichmentTable {
        let mut copy = self.clone();
        match key {
            SortKey::PValue => copy.records.sort_by(by_p_value),
            SortKey::OddsRatio => copy.records.sort_by(by_odds_ratio),
        }
        copy
    }

    /// Only the records that pass multiple-testing correction.
    pub fn passing(&self) -> EnrichmentTable {
        let mut copy = self.clone();
        copy.records.retain(|r| r.passes_correction);
        copy
    }

    pub fn top(&self, n: usize) -> EnrichmentTable {
        let mut copy = self.clone();
        copy.records.truncate(n);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, odds_ratio: f64, p_value: f64, passes: bool) -> EnrichmentRecord {
        EnrichmentRecord {
            annotation: name.to_string(),
            odds_ratio,
            p_value,
            passes_correction: passes,
            overlap: 1,
            annotation_size: 10,
        }
    }

    fn table() -> EnrichmentTable {
        EnrichmentTable::new(
            vec![
                record("B", 2.0, 0.01, true),
                record("A", f64::NAN, 0.5, false),
                record("C", f64::INFINITY, 0.01, true),
                record("D", 0.5, 0.9, false),
            ],
            "BenjaminiHochberg",
            0.05,
            400,
        )
    }

    #[test]
    fn test_new_orders_by_p_value_then_name() {
        let t = table();
        let names: Vec<&str> = t.iter().map(|r| r.annotation.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "A", "D"]);
    }

    #[test]
    fn test_sorted_by_odds_ratio_puts_nan_last() {
        let original = table();
        let sorted = original.sorted_by(SortKey::OddsRatio);
        let names: Vec<&str> = sorted.iter().map(|r| r.annotation.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "D", "A"]);
        // the original is untouched
        assert_eq!(original.records()[0].annotation, "B");
    }

    #[test]
    fn test_views_are_copies() {
        let original = table();
        let passing = original.passing();
        assert_eq!(passing.len(), 2);
        assert_eq!(original.len(), 4);
        assert_eq!(original.top(1).records()[0].annotation, "B");
        assert!(original.get("D").is_some());
        assert!(original.get("E").is_none());
        assert_eq!(original.universe_size(), 400);
        assert_eq!(original.correction(), "BenjaminiHochberg");
        assert_eq!(passing.fdr(), 0.05);
    }
}
