//! Correlation-threshold target inference.
//!
//! Every non-driver gene is scored by its absolute correlation summed over the
//! drivers found in the reference matrix. Without `top_n`, a gene is kept when
//! its score reaches a cutoff calibrated on random driver sets of the same
//! size: each draw contributes the `q`-quantile of its own score distribution
//! and the cutoff is the largest of those quantiles.

use crate::error::{EnrichError, Result};
use crate::targets::reference::CorrelationTable;
use crate::targets::{DriverSet, InferenceOptions, TargetInference, TargetSet, log_coverage};
use crate::testing::utils::{quantile_at, resample_seeds, sample_without_replacement};
use log::debug;
use rand::RngCore;
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

pub const DEFAULT_RESAMPLES: usize = 40;
pub const DEFAULT_QUANTILE: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CorrelationThreshold {
    /// Calibrate the cutoff at this quantile of the permutation null.
    Quantile(f64),
    /// Keep every non-driver gene.
    All,
}

impl CorrelationThreshold {
    /// Interprets a raw threshold value, where `-1` means "keep everything".
    pub fn from_raw(value: f64) -> Result<Self> {
        if value == -1.0 {
            Ok(CorrelationThreshold::All)
        } else if (0.0..1.0).contains(&value) {
            Ok(CorrelationThreshold::Quantile(value))
        } else {
            Err(EnrichError::invalid_input(format!(
                "correlation threshold must be -1 or within [0, 1), got {}",
                value
            )))
        }
    }
}

impl Default for CorrelationThreshold {
    fn default() -> Self {
        CorrelationThreshold::Quantile(DEFAULT_QUANTILE)
    }
}

pub struct CorrelationInference {
    table: Arc<CorrelationTable>,
    reference: String,
    threshold: CorrelationThreshold,
    n_resamples: usize,
}

impl CorrelationInference {
    pub fn new(table: Arc<CorrelationTable>, reference: impl Into<String>) -> Self {
        CorrelationInference {
            table,
            reference: reference.into(),
            threshold: CorrelationThreshold::default(),
            n_resamples: DEFAULT_RESAMPLES,
        }
    }

    pub fn with_threshold(mut self, threshold: CorrelationThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_resamples(mut self, n_resamples: usize) -> Result<Self> {
        if n_resamples == 0 {
            return Err(EnrichError::invalid_input(
                "correlation null needs at least one resample",
            ));
        }
        self.n_resamples = n_resamples;
        Ok(self)
    }

    /// Largest `q`-quantile of the summed statistic over random driver sets of
    /// size `n_drivers` drawn from the matrix rows.
    fn null_cutoff(&self, n_drivers: usize, q: f64, rng: &mut dyn RngCore) -> Result<f64> {
        let table = self.table.as_ref();
        let seeds = resample_seeds(rng, self.n_resamples);

        let quantiles: Option<Vec<f64>> = seeds
            .par_iter()
            .map(|&seed| {
                let drawn = sample_without_replacement(seed, table.rows().len(), n_drivers);
                let drawn_names: HashSet<&str> =
                    drawn.iter().map(|&i| table.rows()[i].as_str()).collect();
                let sums = table.summed_abs(&drawn);

                let mut null: Vec<f64> = table
                    .columns()
                    .iter()
                    .zip(sums.iter())
                    .filter(|(name, _)| !drawn_names.contains(name.as_str()))
                    .map(|(_, &s)| s)
                    .collect();
                null.sort_by(f64::total_cmp);
                quantile_at(&null, q)
            })
            .collect();

        let quantiles = quantiles.ok_or_else(|| {
            EnrichError::invalid_input(format!(
                "{} has no columns left once random drivers are excluded",
                self.reference
            ))
        })?;

        let cutoff = quantiles.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        debug!(
            "correlation null over {} draws of {} drivers: cutoff {:.4}",
            quantiles.len(),
            n_drivers,
            cutoff
        );
        Ok(cutoff)
    }
}

impl TargetInference for CorrelationInference {
    fn infer(
        &self,
        drivers: &DriverSet,
        options: &InferenceOptions,
        rng: &mut dyn RngCore,
    ) -> Result<TargetSet> {
        let table = self.table.as_ref();
        let present: Vec<usize> = drivers
            .iter()
            .filter_map(|d| table.row_position(d))
            .collect();

        if !options.silent {
            log_coverage(&self.reference, drivers, table.rows(), present.len());
        }
        if present.is_empty() {
            return Err(EnrichError::NoOverlap {
                reference: self.reference.clone(),
                n_drivers: drivers.len(),
            });
        }

        // Driver columns would score their own self-correlation.
        let sums = table.summed_abs(&present);
        let candidates: Vec<(&str, f64)> = table
            .columns()
            .iter()
            .zip(sums.iter())
            .filter(|(name, _)| !drivers.contains(name))
            .map(|(name, &s)| (name.as_str(), s))
            .collect();

        if let Some(n) = options.top_n {
            if n == 0 {
                return Err(EnrichError::invalid_input("top_n must be at least 1"));
            }
            let mut ranked = candidates;
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            return Ok(TargetSet::from_members(
                ranked.into_iter().take(n).map(|(name, _)| name),
            ));
        }

        match self.threshold {
            CorrelationThreshold::All => Ok(TargetSet::from_members(
                candidates.into_iter().map(|(name, _)| name),
            )),
            CorrelationThreshold::Quantile(q) => {
                let cutoff = self.null_cutoff(present.len(), q, rng)?;
                Ok(TargetSet::from_members(
                    candidates
                        .into_iter()
                        .filter(|&(_, s)| s >= cutoff)
                        .map(|(name, _)| name),
                ))
            }
        }
    }

    fn name(&self) -> &str {
        "correlation"
    }
}
