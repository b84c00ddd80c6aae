//! Run configuration for a full driver-to-enrichment analysis.

use crate::enrichment::AnnotationSource;
use crate::error::{EnrichError, Result};
use crate::targets::{InferenceMethod, InferenceOptions};
use crate::targets::correlation::{CorrelationThreshold, DEFAULT_QUANTILE, DEFAULT_RESAMPLES};
use crate::testing::correction::CorrectionMethod;
use crate::testing::correction::bootstrap::DEFAULT_BOOTSTRAP_RESAMPLES;
use crate::testing::utils::validate_fdr;
use serde::{Deserialize, Serialize};

/// Every knob of an analysis in one place. Missing fields in a JSON document
/// fall back to [`AnalysisConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub fdr: f64,
    pub correction: CorrectionMethod,
    pub annotation: AnnotationSource,
    pub inference: InferenceMethod,
    /// Quantile of the correlation null, or `-1` to keep every gene.
    pub correlation_threshold: f64,
    pub correlation_resamples: usize,
    pub bootstrap_resamples: usize,
    pub top_n: Option<usize>,
    /// Carry edge weights from the curated network into the target set.
    pub weighted_targets: bool,
    pub silent: bool,
    pub seed: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            fdr: 0.05,
            correction: CorrectionMethod::default(),
            annotation: AnnotationSource::default(),
            inference: InferenceMethod::default(),
            correlation_threshold: DEFAULT_QUANTILE,
            correlation_resamples: DEFAULT_RESAMPLES,
            bootstrap_resamples: DEFAULT_BOOTSTRAP_RESAMPLES,
            top_n: None,
            weighted_targets: false,
            silent: false,
            seed: 0,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)
            .map_err(|e| EnrichError::invalid_input(format!("malformed configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_fdr(self.fdr)?;
        CorrelationThreshold::from_raw(self.correlation_threshold)?;
        if self.correlation_resamples == 0 {
            return Err(EnrichError::invalid_input(
                "correlation_resamples must be at least 1",
            ));
        }
        if self.bootstrap_resamples < 2 {
            return Err(EnrichError::invalid_input(
                "bootstrap_resamples must be at least 2",
            ));
        }
        if self.top_n == Some(0) {
            return Err(EnrichError::invalid_input("top_n must be at least 1"));
        }
        Ok(())
    }

    pub fn inference_options(&self) -> InferenceOptions {
        InferenceOptions {
            silent: self.silent,
            top_n: self.top_n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.fdr, 0.05);
        assert_eq!(config.correction, CorrectionMethod::BenjaminiHochberg);
        assert_eq!(config.annotation, AnnotationSource::Go);
        assert_eq!(config.inference, InferenceMethod::Correlation);
        assert_eq!(config.correlation_resamples, 40);
        assert_eq!(config.bootstrap_resamples, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AnalysisConfig::from_json_str(
            r#"{"fdr": 0.1, "annotation": "KEGG", "correction": "Bonferroni", "top_n": 25}"#,
        )
        .unwrap();
        assert_eq!(config.fdr, 0.1);
        assert_eq!(config.annotation, AnnotationSource::Kegg);
        assert_eq!(config.correction, CorrectionMethod::Bonferroni);
        assert_eq!(config.top_n, Some(25));
        assert_eq!(config.inference, InferenceMethod::Correlation);
        assert_eq!(config.inference_options().top_n, Some(25));
    }

    #[test]
    fn test_keep_all_threshold_is_valid() {
        let config = AnalysisConfig::from_json_str(r#"{"correlation_threshold": -1}"#).unwrap();
        assert_eq!(config.correlation_threshold, -1.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(AnalysisConfig::from_json_str(r#"{"fdr": 1.5}"#).is_err());
        assert!(AnalysisConfig::from_json_str(r#"{"correlation_threshold": 2.0}"#).is_err());
        assert!(AnalysisConfig::from_json_str(r#"{"top_n": 0}"#).is_err());
        let err = AnalysisConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, EnrichError::InvalidInput { .. }));
    }
}
