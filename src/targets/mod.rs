//! Target-set inference: mapping driver entities (transcription factors) to
//! the genes they are likely to affect.
//!
//! ## Strategies
//!
//! - **Curated network** ([`network::CuratedNetwork`]): direct lookup in a
//!   curated TF -> target edge list.
//! - **Correlation threshold** ([`correlation::CorrelationInference`]): summed
//!   absolute correlation, thresholded against a permutation null.
//! - **Interaction weighted** ([`interaction::InteractionWeighted`]): summed
//!   protein-interaction scores over interaction partners.
//!
//! All strategies implement [`TargetInference`] and can be swapped freely.

use crate::config::AnalysisConfig;
use crate::error::{EnrichError, Result};
use log::info;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub mod correlation;
pub mod interaction;
pub mod network;
pub mod reference;

use correlation::{CorrelationInference, CorrelationThreshold};
use interaction::InteractionWeighted;
use network::CuratedNetwork;
use reference::ReferenceProvider;

/// Non-empty, duplicate-free list of driver identifiers in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSet {
    drivers: Vec<String>,
    lookup: HashSet<String>,
}

impl DriverSet {
    pub fn new<I, S>(drivers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut lookup = HashSet::new();
        for driver in drivers {
            let driver = driver.into();
            if lookup.insert(driver.clone()) {
                ordered.push(driver);
            }
        }

        if ordered.is_empty() {
            return Err(EnrichError::invalid_input("driver set is empty"));
        }

        Ok(DriverSet {
            drivers: ordered,
            lookup,
        })
    }

    pub fn as_slice(&self) -> &[String] {
        &self.drivers
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.drivers.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains(name)
    }
}

/// Output of target inference. Never modified after it is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetSet {
    /// Plain target identifiers.
    Members(Vec<String>),
    /// Target identifiers with an aggregate score or occurrence count.
    Weighted(Vec<(String, f64)>),
}

impl TargetSet {
    /// Builds an unweighted target set, dropping repeated identifiers.
    pub fn from_members<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let members = members
            .into_iter()
            .map(Into::into)
            .filter(|m: &String| seen.insert(m.clone()))
            .collect();
        TargetSet::Members(members)
    }

    /// Builds a weighted target set; a repeated identifier keeps its first weight.
    pub fn from_weights<I, S>(weights: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let weights = weights
            .into_iter()
            .map(|(name, w)| (name.into(), w))
            .filter(|(name, _): &(String, f64)| seen.insert(name.clone()))
            .collect();
        TargetSet::Weighted(weights)
    }

    pub fn genes(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            TargetSet::Members(members) => Box::new(members.iter().map(String::as_str)),
            TargetSet::Weighted(weights) => Box::new(weights.iter().map(|(n, _)| n.as_str())),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TargetSet::Members(members) => members.len(),
            TargetSet::Weighted(weights) => weights.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_weighted(&self) -> bool {
        matches!(self, TargetSet::Weighted(_))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.genes().any(|g| g == name)
    }

    pub fn weight(&self, name: &str) -> Option<f64> {
        match self {
            TargetSet::Members(_) => None,
            TargetSet::Weighted(weights) => weights
                .iter()
                .find(|(n, _)| n == name)
                .map(|&(_, w)| w),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferenceOptions {
    /// Suppress the coverage diagnostics.
    pub silent: bool,
    /// Return only the `n` highest-scoring targets, bypassing any null model.
    pub top_n: Option<usize>,
}

/// Maps a driver set to a target set.
///
/// Strategies that resample take their randomness from `rng`, so a seeded
/// generator makes a run reproducible.
pub trait TargetInference: Send + Sync {
    fn infer(
        &self,
        drivers: &DriverSet,
        options: &InferenceOptions,
        rng: &mut dyn RngCore,
    ) -> Result<TargetSet>;

    fn name(&self) -> &str;
}

/// Named selector for the built-in strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InferenceMethod {
    CuratedNetwork,
    #[default]
    Correlation,
    InteractionWeighted,
}

impl InferenceMethod {
    /// Builds the strategy, fetching its reference table from `references`.
    pub fn build(
        &self,
        references: &dyn ReferenceProvider,
        config: &AnalysisConfig,
    ) -> Result<Box<dyn TargetInference>> {
        Ok(match self {
            InferenceMethod::CuratedNetwork => {
                let network = references.network(reference::CURATED_NETWORK)?;
                Box::new(
                    CuratedNetwork::new(network, reference::CURATED_NETWORK)
                        .weighted(config.weighted_targets),
                )
            }
            InferenceMethod::Correlation => {
                let table = references.correlation_table(reference::CORRELATIONS)?;
                Box::new(
                    CorrelationInference::new(table, reference::CORRELATIONS)
                        .with_threshold(CorrelationThreshold::from_raw(config.correlation_threshold)?)
                        .with_resamples(config.correlation_resamples)?,
                )
            }
            InferenceMethod::InteractionWeighted => {
                let network = references.network(reference::INTERACTIONS)?;
                Box::new(
                    InteractionWeighted::new(network, reference::INTERACTIONS)
                        .with_bootstrap_resamples(config.bootstrap_resamples)?,
                )
            }
        })
    }
}

impl FromStr for InferenceMethod {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trrust" | "network" | "curatednetwork" => Ok(InferenceMethod::CuratedNetwork),
            "corr" | "correlation" => Ok(InferenceMethod::Correlation),
            "string" | "ppi" | "interactionweighted" => Ok(InferenceMethod::InteractionWeighted),
            _ => Err(EnrichError::invalid_input(format!(
                "unknown inference method '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for InferenceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InferenceMethod::CuratedNetwork => "CuratedNetwork",
            InferenceMethod::Correlation => "Correlation",
            InferenceMethod::InteractionWeighted => "InteractionWeighted",
        };
        f.write_str(name)
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

/// Reports how well the driver list and the reference overlap.
pub(crate) fn log_coverage(
    reference: &str,
    drivers: &DriverSet,
    reference_drivers: &[String],
    n_present: usize,
) {
    let covered = reference_drivers
        .iter()
        .filter(|r| drivers.contains(r))
        .count();
    info!(
        "{:.1}% of drivers are not in {}",
        percentage(drivers.len() - n_present, drivers.len()),
        reference
    );
    info!(
        "{:.1}% of {} drivers were in the driver list",
        percentage(covered, reference_drivers.len()),
        reference
    );
}

/// Drops driver identifiers from a list of candidate targets.
pub(crate) fn exclude_drivers<T>(candidates: Vec<(String, T)>, drivers: &DriverSet) -> Vec<(String, T)> {
    candidates
        .into_iter()
        .filter(|(name, _)| !drivers.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_set_dedup_keeps_order() {
        let drivers = DriverSet::new(["TF2", "TF1", "TF2", "tf1"]).unwrap();
        assert_eq!(drivers.as_slice(), &["TF2", "TF1", "tf1"]);
        assert!(drivers.contains("TF1"));
        assert!(!drivers.contains("Tf1"));
    }

    #[test]
    fn test_driver_set_rejects_empty() {
        let err = DriverSet::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, EnrichError::InvalidInput { .. }));
    }

    #[test]
    fn test_target_set_accessors() {
        let members = TargetSet::from_members(["G1", "G2", "G1"]);
        assert_eq!(members.len(), 2);
        assert!(members.contains("G2"));
        assert_eq!(members.weight("G2"), None);

        let weighted = TargetSet::from_weights([("G1", 2.0), ("G3", 1.0)]);
        assert!(weighted.is_weighted());
        assert_eq!(weighted.weight("G1"), Some(2.0));
        assert_eq!(weighted.genes().collect::<Vec<_>>(), vec!["G1", "G3"]);
    }

    #[test]
    fn test_inference_method_from_str() {
        assert_eq!(
            "corr".parse::<InferenceMethod>().unwrap(),
            InferenceMethod::Correlation
        );
        assert_eq!(
            "TRRUST".parse::<InferenceMethod>().unwrap(),
            InferenceMethod::CuratedNetwork
        );
        assert!("magic".parse::<InferenceMethod>().is_err());
    }

    #[test]
    fn test_percentage_handles_empty_reference() {
        assert_eq!(percentage(3, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }
}
