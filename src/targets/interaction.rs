use crate::error::{EnrichError, Result};
use crate::targets::reference::SparseNetwork;
use crate::targets::{
    DriverSet, InferenceOptions, TargetInference, TargetSet, exclude_drivers, log_coverage,
};
use crate::testing::correction::bootstrap::{BootstrapOutcome, BootstrapZTest};
use rand::RngCore;
use std::sync::Arc;

/// Sums protein-interaction scores over every partner of the driver set.
///
/// Only `top_n` selection is supported through [`TargetInference`]; the
/// bootstrap Z-test is available separately through
/// [`InteractionWeighted::bootstrap_significance`].
pub struct InteractionWeighted {
    network: Arc<SparseNetwork>,
    reference: String,
    bootstrap: BootstrapZTest,
}

impl InteractionWeighted {
    pub fn new(network: Arc<SparseNetwork>, reference: impl Into<String>) -> Self {
        InteractionWeighted {
            network,
            reference: reference.into(),
            bootstrap: BootstrapZTest::default(),
        }
    }

    pub fn with_bootstrap_resamples(mut self, n_resamples: usize) -> Result<Self> {
        self.bootstrap = BootstrapZTest::new(n_resamples)?;
        Ok(self)
    }

    /// Partner scores summed over the drivers present in the network, highest
    /// first. Also returns how many drivers were found.
    fn summed_scores(
        &self,
        drivers: &DriverSet,
        silent: bool,
    ) -> Result<(Vec<(String, f64)>, usize)> {
        let network = self.network.as_ref();
        let present: Vec<usize> = drivers
            .iter()
            .filter_map(|d| network.source_position(d))
            .collect();

        if !silent {
            log_coverage(&self.reference, drivers, network.sources(), present.len());
        }
        if present.is_empty() {
            return Err(EnrichError::NoOverlap {
                reference: self.reference.clone(),
                n_drivers: drivers.len(),
            });
        }

        let scores: Vec<(String, f64)> = network
            .aggregate(&present)
            .into_iter()
            .map(|(col, score)| (network.target_name(col).to_string(), score))
            .collect();
        let mut scores = exclude_drivers(scores, drivers);
        scores.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| a.0.cmp(&b.0))
        });
        Ok((scores, present.len()))
    }

    /// Bootstrap Z-test of every partner's summed score against random driver
    /// sets of the same size, Benjamini-Hochberg corrected at `fdr`.
    pub fn bootstrap_significance(
        &self,
        drivers: &DriverSet,
        fdr: f64,
        silent: bool,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<BootstrapOutcome>> {
        let (scores, n_present) = self.summed_scores(drivers, silent)?;
        self.bootstrap
            .test(self.network.as_ref(), &scores, n_present, fdr, rng)
    }
}

impl TargetInference for InteractionWeighted {
    fn infer(
        &self,
        drivers: &DriverSet,
        options: &InferenceOptions,
        _rng: &mut dyn RngCore,
    ) -> Result<TargetSet> {
        let n = match options.top_n {
            Some(0) => return Err(EnrichError::invalid_input("top_n must be at least 1")),
            Some(n) => n,
            None => {
                return Err(EnrichError::not_supported(
                    "interaction-weighted inference requires top_n; there is no validated null model for thresholding summed interaction scores",
                ));
            }
        };

        let (scores, _) = self.summed_scores(drivers, options.silent)?;
        Ok(TargetSet::from_weights(scores.into_iter().take(n)))
    }

    fn name(&self) -> &str {
        "interaction_weighted"
    }
}
