//! A driver set, its inferred targets and the enrichment results derived
//! from them.

use crate::config::AnalysisConfig;
use crate::enrichment::{AnnotationProvider, AnnotationSelector, EnrichmentTable, enrich};
use crate::error::Result;
use crate::targets::reference::ReferenceProvider;
use crate::targets::{DriverSet, InferenceOptions, TargetInference, TargetSet};
use crate::testing::correction::MultipleTestCorrection;
use log::info;
use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

/// Targets are inferred once, when the enricher is built. Enrichment can then
/// be run against any number of annotation collections; the latest table is
/// kept and shared through an [`Arc`].
#[derive(Debug, Clone)]
pub struct TfEnricher {
    drivers: DriverSet,
    targets: TargetSet,
    used_sources: Vec<String>,
    enrichments: Option<Arc<EnrichmentTable>>,
}

impl TfEnricher {
    pub fn new(
        drivers: DriverSet,
        inference: &dyn TargetInference,
        options: &InferenceOptions,
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        let targets = inference.infer(&drivers, options, rng)?;
        if !options.silent {
            info!(
                "{} inferred {} targets for {} drivers",
                inference.name(),
                targets.len(),
                drivers.len()
            );
        }
        Ok(TfEnricher {
            drivers,
            targets,
            used_sources: vec![inference.name().to_string()],
            enrichments: None,
        })
    }

    /// Builds the inference strategy named in `config` and runs it with a
    /// generator seeded from `config.seed`.
    pub fn from_config(
        drivers: DriverSet,
        config: &AnalysisConfig,
        references: &dyn ReferenceProvider,
    ) -> Result<Self> {
        config.validate()?;
        let inference = config.inference.build(references, config)?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        Self::new(drivers, inference.as_ref(), &config.inference_options(), &mut rng)
    }

    /// Tests the inferred targets against the selected annotation collection.
    pub fn downstream_enrich(
        &mut self,
        selector: &AnnotationSelector,
        annotations: &dyn AnnotationProvider,
        correction: &dyn MultipleTestCorrection,
        fdr: f64,
    ) -> Result<Arc<EnrichmentTable>> {
        let table = Arc::new(enrich(&self.targets, selector, annotations, correction, fdr)?);
        info!(
            "{} of {} {} annotation sets pass {} at FDR {}",
            table.passing().len(),
            table.len(),
            selector.label(),
            correction.name(),
            fdr
        );
        self.used_sources.push(selector.label().to_string());
        self.enrichments = Some(Arc::clone(&table));
        Ok(table)
    }

    /// [`downstream_enrich`](Self::downstream_enrich) with the annotation,
    /// correction and FDR taken from `config`.
    pub fn enrich_with_config(
        &mut self,
        config: &AnalysisConfig,
        annotations: &dyn AnnotationProvider,
    ) -> Result<Arc<EnrichmentTable>> {
        let selector = AnnotationSelector::Named(config.annotation);
        self.downstream_enrich(&selector, annotations, &config.correction, config.fdr)
    }

    pub fn drivers(&self) -> &DriverSet {
        &self.drivers
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    /// Inference strategy followed by every annotation source used so far.
    pub fn used_sources(&self) -> &[String] {
        &self.used_sources
    }

    pub fn enrichments(&self) -> Option<Arc<EnrichmentTable>> {
        self.enrichments.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{AnnotationCollection, AnnotationSource, InMemoryAnnotations};
    use crate::error::EnrichError;
    use crate::targets::InferenceMethod;
    use crate::targets::reference::{CURATED_NETWORK, InMemoryReferences, SparseNetwork};
    use crate::testing::correction::BenjaminiHochberg;

    fn references() -> InMemoryReferences {
        let network = SparseNetwork::from_edges(vec![
            ("TF1", "G1", 1.0),
            ("TF1", "G2", 1.0),
            ("TF2", "G3", 1.0),
            ("TF3", "G50", 1.0),
        ])
        .unwrap();
        InMemoryReferences::new().with_network(CURATED_NETWORK, network)
    }

    fn annotations() -> InMemoryAnnotations {
        let hit: Vec<String> = (1..=10).map(|i| format!("G{}", i)).collect();
        let background: Vec<String> = (100..400).map(|i| format!("G{}", i)).collect();
        InMemoryAnnotations::new().with_collection(
            AnnotationSource::Go,
            AnnotationCollection::new([("GO_HIT", hit), ("GO_BACKGROUND", background)]),
        )
    }

    fn curated_config() -> AnalysisConfig {
        AnalysisConfig {
            inference: InferenceMethod::CuratedNetwork,
            silent: true,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_from_config_and_enrich() {
        let drivers = DriverSet::new(["TF1", "TF2"]).unwrap();
        let config = curated_config();
        let mut enricher = TfEnricher::from_config(drivers, &config, &references()).unwrap();
        assert_eq!(enricher.targets(), &TargetSet::from_members(["G1", "G2", "G3"]));
        assert!(enricher.enrichments().is_none());

        let table = enricher.enrich_with_config(&config, &annotations()).unwrap();
        assert_eq!(table.records()[0].annotation, "GO_HIT");
        assert!(table.records()[0].passes_correction);
        assert!(Arc::ptr_eq(&table, &enricher.enrichments().unwrap()));
        assert_eq!(enricher.used_sources(), &["curated_network", "GO"]);
    }

    #[test]
    fn test_custom_collection_selector() {
        let drivers = DriverSet::new(["TF1"]).unwrap();
        let mut enricher =
            TfEnricher::from_config(drivers, &curated_config(), &references()).unwrap();
        let custom: AnnotationSelector = AnnotationCollection::new([(
            "MINE",
            (1..=12).map(|i| format!("G{}", i)).collect::<Vec<_>>(),
        )])
        .into();
        let table = enricher
            .downstream_enrich(&custom, &InMemoryAnnotations::new(), &BenjaminiHochberg, 0.05)
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(enricher.used_sources().last().unwrap(), "custom");
    }

    #[test]
    fn test_missing_reference_is_provider_error() {
        let drivers = DriverSet::new(["TF1"]).unwrap();
        let config = AnalysisConfig {
            silent: true,
            ..AnalysisConfig::default()
        };
        let err = TfEnricher::from_config(drivers, &config, &references()).unwrap_err();
        assert!(matches!(err, EnrichError::Provider(_)));
    }
}
