//! Over-representation of a target set in curated annotation sets.
//!
//! Each annotation set with at least [`MIN_ANNOTATION_SIZE`] members is tested
//! against the target set with a one-sided Fisher exact test. The universe is
//! every distinct entity seen across the whole collection plus the targets, so
//! it changes with the collection and target set in play. The table is ranked
//! by p-value and every row is flagged by the chosen multiple-testing
//! correction.
//!
//! ## Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tf_enrichment::enrichment::{AnnotationCollection, enrich_collection};
//! use tf_enrichment::targets::TargetSet;
//! use tf_enrichment::testing::correction::BenjaminiHochberg;
//!
//! let pathway: Vec<String> = (0..12).map(|i| format!("G{}", i)).collect();
//! let other: Vec<String> = (100..300).map(|i| format!("G{}", i)).collect();
//! let collection = AnnotationCollection::new([("PATHWAY", pathway), ("OTHER", other)]);
//!
//! let targets = TargetSet::from_members(["G0", "G1", "G2"]);
//! let table = enrich_collection(&targets, &collection, &BenjaminiHochberg, 0.05).unwrap();
//! assert_eq!(table.records()[0].annotation, "PATHWAY");
//! ```

use crate::error::{EnrichError, Result};
use crate::targets::TargetSet;
use crate::testing::correction::{MultipleTestCorrection, apply_correction};
use crate::testing::inference::fisher_enrichment;
use crate::testing::utils::validate_fdr;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

mod table;
pub(crate) mod utils;

pub use table::{EnrichmentRecord, EnrichmentTable, SortKey};

/// Annotation sets smaller than this are never tested.
pub const MIN_ANNOTATION_SIZE: usize = 10;

/// Named annotation sets (pathways, ontology terms) and their members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationCollection {
    sets: BTreeMap<String, BTreeSet<String>>,
}

impl AnnotationCollection {
    /// Builds a collection; members given twice for the same name are merged.
    pub fn new<I, N, M, S>(sets: I) -> Self
    where
        I: IntoIterator<Item = (N, M)>,
        N: Into<String>,
        M: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collection: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (name, members) in sets {
            collection
                .entry(name.into())
                .or_default()
                .extend(members.into_iter().map(Into::into));
        }
        AnnotationCollection { sets: collection }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.sets.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.sets.iter()
    }

    /// Sets whose name starts with `prefix`; `ALL` keeps every set.
    pub fn with_prefix(&self, prefix: &str) -> AnnotationCollection {
        if prefix.eq_ignore_ascii_case("ALL") {
            return self.clone();
        }
        AnnotationCollection {
            sets: self
                .sets
                .iter()
                .filter(|(name, _)| name.starts_with(prefix))
                .map(|(name, members)| (name.clone(), members.clone()))
                .collect(),
        }
    }

    /// Sets with at least `min_size` members.
    pub fn with_min_size(&self, min_size: usize) -> AnnotationCollection {
        AnnotationCollection {
            sets: self
                .sets
                .iter()
                .filter(|(_, members)| members.len() >= min_size)
                .map(|(name, members)| (name.clone(), members.clone()))
                .collect(),
        }
    }
}

/// Pre-built annotation collections available by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnnotationSource {
    #[default]
    Go,
    Reactome,
    Kegg,
    Gwas,
}

impl AnnotationSource {
    pub fn name(&self) -> &'static str {
        match self {
            AnnotationSource::Go => "GO",
            AnnotationSource::Reactome => "REACTOME",
            AnnotationSource::Kegg => "KEGG",
            AnnotationSource::Gwas => "GWAS",
        }
    }
}

impl FromStr for AnnotationSource {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GO" => Ok(AnnotationSource::Go),
            "REACTOME" => Ok(AnnotationSource::Reactome),
            "KEGG" => Ok(AnnotationSource::Kegg),
            "GWAS" => Ok(AnnotationSource::Gwas),
            _ => Err(EnrichError::invalid_input(format!(
                "annotation source '{}' not recognised, expected GO, GWAS, KEGG or REACTOME",
                s
            ))),
        }
    }
}

impl fmt::Display for AnnotationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which annotation collection to test against.
#[derive(Debug, Clone)]
pub enum AnnotationSelector {
    Named(AnnotationSource),
    Custom(Arc<AnnotationCollection>),
}

impl AnnotationSelector {
    pub fn label(&self) -> &str {
        match self {
            AnnotationSelector::Named(source) => source.name(),
            AnnotationSelector::Custom(_) => "custom",
        }
    }
}

impl From<AnnotationSource> for AnnotationSelector {
    fn from(source: AnnotationSource) -> Self {
        AnnotationSelector::Named(source)
    }
}

impl From<AnnotationCollection> for AnnotationSelector {
    fn from(collection: AnnotationCollection) -> Self {
        AnnotationSelector::Custom(Arc::new(collection))
    }
}

/// Source of pre-built annotation collections.
pub trait AnnotationProvider: Send + Sync {
    fn collection(&self, source: AnnotationSource) -> anyhow::Result<Arc<AnnotationCollection>>;
}

/// Annotation collections already held in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAnnotations {
    collections: HashMap<AnnotationSource, Arc<AnnotationCollection>>,
}

impl InMemoryAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, source: AnnotationSource, collection: AnnotationCollection) -> Self {
        self.collections.insert(source, Arc::new(collection));
        self
    }

    /// Registers KEGG and REACTOME as the name-prefixed subsets of one
    /// combined curated collection.
    pub fn with_curated_pathways(self, combined: &AnnotationCollection) -> Self {
        self.with_collection(AnnotationSource::Kegg, combined.with_prefix("KEGG"))
            .with_collection(AnnotationSource::Reactome, combined.with_prefix("REACTOME"))
    }
}

impl AnnotationProvider for InMemoryAnnotations {
    fn collection(&self, source: AnnotationSource) -> anyhow::Result<Arc<AnnotationCollection>> {
        self.collections
            .get(&source)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no {} annotation collection loaded", source))
    }
}

pub fn resolve_collection(
    selector: &AnnotationSelector,
    provider: &dyn AnnotationProvider,
) -> Result<Arc<AnnotationCollection>> {
    match selector {
        AnnotationSelector::Named(source) => Ok(provider.collection(*source)?),
        AnnotationSelector::Custom(collection) => Ok(Arc::clone(collection)),
    }
}

/// Tests `targets` against the collection picked by `selector`.
pub fn enrich(
    targets: &TargetSet,
    selector: &AnnotationSelector,
    provider: &dyn AnnotationProvider,
    correction: &dyn MultipleTestCorrection,
    fdr: f64,
) -> Result<EnrichmentTable> {
    let collection = resolve_collection(selector, provider)?;
    enrich_collection(targets, &collection, correction, fdr)
}

/// Tests `targets` against every annotation set of `collection` with at least
/// [`MIN_ANNOTATION_SIZE`] members.
pub fn enrich_collection(
    targets: &TargetSet,
    collection: &AnnotationCollection,
    correction: &dyn MultipleTestCorrection,
    fdr: f64,
) -> Result<EnrichmentTable> {
    validate_fdr(fdr)?;

    let universe = utils::universe_size(collection, targets);
    let target_genes: HashSet<&str> = targets.genes().collect();
    let eligible: Vec<(&String, &BTreeSet<String>)> = collection
        .iter()
        .filter(|(_, members)| members.len() >= MIN_ANNOTATION_SIZE)
        .collect();

    debug!(
        "testing {} of {} annotation sets against {} targets in a universe of {}",
        eligible.len(),
        collection.len(),
        target_genes.len(),
        universe
    );
    if eligible.is_empty() {
        return Err(EnrichError::invalid_input(format!(
            "no annotation set has at least {} members",
            MIN_ANNOTATION_SIZE
        )));
    }

    let mut records: Vec<EnrichmentRecord> = eligible
        .par_iter()
        .map(|&(name, members)| {
            let overlap = utils::overlap(members, &target_genes);
            let (odds_ratio, p_value) =
                fisher_enrichment(overlap, members.len(), target_genes.len(), universe)?;
            Ok(EnrichmentRecord {
                annotation: name.clone(),
                odds_ratio,
                p_value,
                passes_correction: false,
                overlap,
                annotation_size: members.len(),
            })
        })
        .collect::<Result<_>>()?;

    let p_values: Vec<f64> = records.iter().map(|r| r.p_value).collect();
    let passes = apply_correction(correction, &p_values, fdr)?;
    for (record, pass) in records.iter_mut().zip(passes) {
        record.passes_correction = pass;
    }

    Ok(EnrichmentTable::new(records, correction.name(), fdr, universe))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::correction::{BenjaminiHochberg, Bonferroni};

    fn genes(range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| format!("G{}", i)).collect()
    }

    #[test]
    fn test_size_threshold_boundary() {
        let collection = AnnotationCollection::new([
            ("NINE", genes(0..9)),
            ("TEN", genes(100..110)),
            ("BACKGROUND", genes(200..400)),
        ]);
        let targets = TargetSet::from_members(["G0", "G100"]);
        let table = enrich_collection(&targets, &collection, &BenjaminiHochberg, 0.05).unwrap();
        assert!(table.get("NINE").is_none());
        assert!(table.get("TEN").is_some());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_universe_counts_untested_sets_and_targets() {
        let collection = AnnotationCollection::new([
            ("SMALL", genes(0..5)),
            ("BIG", genes(3..20)),
        ]);
        let targets = TargetSet::from_members(["G1", "OUTSIDER"]);
        let table = enrich_collection(&targets, &collection, &Bonferroni, 0.05).unwrap();
        assert_eq!(table.universe_size(), 21);
        let big = table.get("BIG").unwrap();
        assert_eq!(big.overlap, 0);
        assert_eq!(big.p_value, 1.0);
    }

    #[test]
    fn test_stricter_size_prefilter() {
        let collection = AnnotationCollection::new([
            ("TWELVE", genes(0..12)),
            ("TWENTY", genes(100..120)),
            ("BACKGROUND", genes(200..400)),
        ]);
        let strict = collection.with_min_size(15);
        assert!(strict.get("TWELVE").is_none());
        assert_eq!(strict.len(), 2);

        let targets = TargetSet::from_members(["G0", "G100"]);
        let table = enrich_collection(&targets, &strict, &BenjaminiHochberg, 0.05).unwrap();
        assert!(table.get("TWELVE").is_none());
        assert!(table.get("TWENTY").is_some());
        // the dropped set no longer counts towards the universe
        assert_eq!(table.universe_size(), 221);
    }

    #[test]
    fn test_no_eligible_sets() {
        let collection = AnnotationCollection::new([("TINY", genes(0..3))]);
        let targets = TargetSet::from_members(["G1"]);
        let err = enrich_collection(&targets, &collection, &BenjaminiHochberg, 0.05).unwrap_err();
        assert!(matches!(err, EnrichError::InvalidInput { .. }));
    }

    #[test]
    fn test_annotation_source_parsing() {
        assert_eq!("go".parse::<AnnotationSource>().unwrap(), AnnotationSource::Go);
        assert_eq!(
            "Reactome".parse::<AnnotationSource>().unwrap(),
            AnnotationSource::Reactome
        );
        let err = "MSIGDB".parse::<AnnotationSource>().unwrap_err();
        assert!(matches!(err, EnrichError::InvalidInput { .. }));
    }

    #[test]
    fn test_prefix_subsets() {
        let combined = AnnotationCollection::new([
            ("KEGG_GLYCOLYSIS", genes(0..10)),
            ("REACTOME_APOPTOSIS", genes(10..20)),
            ("BIOCARTA_P53", genes(20..30)),
        ]);
        assert_eq!(combined.with_prefix("KEGG").len(), 1);
        assert_eq!(combined.with_prefix("all").len(), 3);

        let provider = InMemoryAnnotations::new().with_curated_pathways(&combined);
        let reactome = provider.collection(AnnotationSource::Reactome).unwrap();
        assert!(reactome.get("REACTOME_APOPTOSIS").is_some());
        assert!(provider.collection(AnnotationSource::Go).is_err());
    }

    #[test]
    fn test_named_selector_without_collection_is_provider_error() {
        let targets = TargetSet::from_members(["G1"]);
        let err = enrich(
            &targets,
            &AnnotationSelector::Named(AnnotationSource::Gwas),
            &InMemoryAnnotations::new(),
            &BenjaminiHochberg,
            0.05,
        )
        .unwrap_err();
        assert!(matches!(err, EnrichError::Provider(_)));
    }
}
