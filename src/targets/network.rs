use crate::error::{EnrichError, Result};
use crate::targets::reference::SparseNetwork;
use crate::targets::{
    DriverSet, InferenceOptions, TargetInference, TargetSet, exclude_drivers, log_coverage,
};
use rand::RngCore;
use std::sync::Arc;

/// Direct lookup in a curated TF -> target edge list.
///
/// Deterministic and unthresholded; `top_n` is ignored because there is no
/// score to rank by beyond the edge count. Weighted output reports how many
/// edges reach each target from the driver set.
pub struct CuratedNetwork {
    network: Arc<SparseNetwork>,
    reference: String,
    weighted: bool,
}

impl CuratedNetwork {
    pub fn new(network: Arc<SparseNetwork>, reference: impl Into<String>) -> Self {
        CuratedNetwork {
            network,
            reference: reference.into(),
            weighted: false,
        }
    }

    pub fn weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }
}

impl TargetInference for CuratedNetwork {
    fn infer(
        &self,
        drivers: &DriverSet,
        options: &InferenceOptions,
        _rng: &mut dyn RngCore,
    ) -> Result<TargetSet> {
        let network = self.network.as_ref();
        let present: Vec<usize> = drivers
            .iter()
            .filter_map(|d| network.source_position(d))
            .collect();

        if !options.silent {
            log_coverage(&self.reference, drivers, network.sources(), present.len());
        }
        if present.is_empty() {
            return Err(EnrichError::NoOverlap {
                reference: self.reference.clone(),
                n_drivers: drivers.len(),
            });
        }

        let mut counts: Vec<(String, f64)> = network
            .aggregate(&present)
            .into_iter()
            .map(|(col, count)| (network.target_name(col).to_string(), count))
            .collect();
        counts = exclude_drivers(counts, drivers);
        counts.sort_by(|a, b| a.0.cmp(&b.0));

        if self.weighted {
            Ok(TargetSet::from_weights(counts))
        } else {
            Ok(TargetSet::from_members(counts.into_iter().map(|(name, _)| name)))
        }
    }

    fn name(&self) -> &str {
        "curated_network"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn trrust() -> Arc<SparseNetwork> {
        Arc::new(
            SparseNetwork::from_edges(vec![
                ("TF1", "GENE_B", 1.0),
                ("TF1", "GENE_A", 1.0),
                ("TF2", "GENE_A", 1.0),
                ("TF2", "TF1", 1.0),
                ("TF3", "GENE_C", 1.0),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_unweighted_lookup_is_sorted_and_distinct() {
        let drivers = DriverSet::new(["TF1", "TF2", "MISSING"]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let targets = CuratedNetwork::new(trrust(), "trrust")
            .infer(&drivers, &InferenceOptions::default(), &mut rng)
            .unwrap();
        assert_eq!(
            targets,
            TargetSet::Members(vec!["GENE_A".to_string(), "GENE_B".to_string()])
        );
    }

    #[test]
    fn test_weighted_lookup_counts_edges() {
        let drivers = DriverSet::new(["TF1", "TF2"]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let targets = CuratedNetwork::new(trrust(), "trrust")
            .weighted(true)
            .infer(&drivers, &InferenceOptions::default(), &mut rng)
            .unwrap();
        assert_eq!(targets.weight("GENE_A"), Some(2.0));
        assert_eq!(targets.weight("GENE_B"), Some(1.0));
        assert!(!targets.contains("TF1"));
    }

    #[test]
    fn test_driver_targeted_by_other_driver_is_excluded() {
        let drivers = DriverSet::new(["TF2"]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let targets = CuratedNetwork::new(trrust(), "trrust")
            .infer(&drivers, &InferenceOptions::default(), &mut rng)
            .unwrap();
        // TF1 is a target of TF2 and is kept while TF1 is not a driver
        assert!(targets.contains("TF1"));
        assert!(targets.contains("GENE_A"));
    }

    #[test]
    fn test_no_overlap() {
        let drivers = DriverSet::new(["NOPE"]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let err = CuratedNetwork::new(trrust(), "trrust")
            .infer(&drivers, &InferenceOptions::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, EnrichError::NoOverlap { .. }));
    }
}
