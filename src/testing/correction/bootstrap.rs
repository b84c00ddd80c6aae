//! Bootstrap Z-test for aggregated interaction scores.
//!
//! The observed score of each partner is compared with the scores it gets
//! from random driver sets of the same size. A partner that never varies
//! across the resamples gets a Z-score of 0 instead of an undefined value.

use crate::error::{EnrichError, Result};
use crate::targets::reference::SparseNetwork;
use crate::testing::correction::benjamini_hochberg_correction;
use crate::testing::utils::{mean_and_std, resample_seeds, sample_without_replacement};
use log::debug;
use rand::RngCore;
use rayon::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

pub const DEFAULT_BOOTSTRAP_RESAMPLES: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootstrapOutcome {
    pub target: String,
    pub observed: f64,
    pub z_score: f64,
    pub p_value: f64,
    pub passes_correction: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapZTest {
    n_resamples: usize,
}

impl Default for BootstrapZTest {
    fn default() -> Self {
        BootstrapZTest {
            n_resamples: DEFAULT_BOOTSTRAP_RESAMPLES,
        }
    }
}

impl BootstrapZTest {
    pub fn new(n_resamples: usize) -> Result<Self> {
        if n_resamples < 2 {
            return Err(EnrichError::invalid_input(format!(
                "bootstrap needs at least 2 resamples to estimate a spread, got {}",
                n_resamples
            )));
        }
        Ok(BootstrapZTest { n_resamples })
    }

    pub fn n_resamples(&self) -> usize {
        self.n_resamples
    }

    /// Tests each observed `(target, score)` against scores from random driver
    /// sets of `n_drivers` sources, then applies Benjamini-Hochberg at `fdr`
    /// to the one-sided normal p-values.
    pub fn test(
        &self,
        network: &SparseNetwork,
        observed: &[(String, f64)],
        n_drivers: usize,
        fdr: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<BootstrapOutcome>> {
        if observed.is_empty() {
            return Ok(Vec::new());
        }
        if n_drivers == 0 || n_drivers > network.sources().len() {
            return Err(EnrichError::invalid_input(format!(
                "cannot draw {} drivers from {} network sources",
                n_drivers,
                network.sources().len()
            )));
        }

        let columns: Vec<Option<usize>> = observed
            .iter()
            .map(|(name, _)| network.target_position(name))
            .collect();

        // One row per resample, one column per observed target. Targets the
        // draw never reaches score 0.
        let seeds = resample_seeds(rng, self.n_resamples);
        let resampled: Vec<Vec<f64>> = seeds
            .par_iter()
            .map(|&seed| {
                let drawn = sample_without_replacement(seed, network.sources().len(), n_drivers);
                let totals = network.aggregate(&drawn);
                columns
                    .iter()
                    .map(|col| col.and_then(|c| totals.get(&c).copied()).unwrap_or(0.0))
                    .collect()
            })
            .collect();

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| EnrichError::invalid_input(e.to_string()))?;

        let mut outcomes: Vec<BootstrapOutcome> = observed
            .iter()
            .enumerate()
            .map(|(j, (target, score))| {
                let column: Vec<f64> = resampled.iter().map(|row| row[j]).collect();
                let (mean, std) = mean_and_std(&column);
                let z_score = if std > 0.0 { (mean - score) / std } else { 0.0 };
                BootstrapOutcome {
                    target: target.clone(),
                    observed: *score,
                    z_score,
                    p_value: normal.cdf(z_score),
                    passes_correction: false,
                }
            })
            .collect();

        let p_values: Vec<f64> = outcomes.iter().map(|o| o.p_value).collect();
        let passes = benjamini_hochberg_correction(&p_values, fdr)?;
        for (outcome, pass) in outcomes.iter_mut().zip(passes) {
            outcome.passes_correction = pass;
        }

        debug!(
            "bootstrap over {} resamples: {} of {} targets pass",
            self.n_resamples,
            outcomes.iter().filter(|o| o.passes_correction).count(),
            outcomes.len()
        );
        Ok(outcomes)
    }
}
